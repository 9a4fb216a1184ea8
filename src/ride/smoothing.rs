use std::collections::VecDeque;

use crate::sim::GForces;

/// Moving average of the last `window` G-force readings.
#[derive(Debug, Clone, PartialEq)]
pub struct GForceSmoother {
    window: usize,
    samples: VecDeque<GForces>,
}

impl GForceSmoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Records a reading and returns the current average.
    pub fn push(&mut self, reading: GForces) -> GForces {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(reading);
        self.average()
    }

    pub fn average(&self) -> GForces {
        if self.samples.is_empty() {
            return GForces::ONE_G;
        }
        let n = self.samples.len() as f32;
        let (v, l, a) = self.samples.iter().fold((0.0, 0.0, 0.0), |(v, l, a), g| {
            (v + g.vertical, l + g.lateral, a + g.longitudinal)
        });
        GForces::from_components(v / n, l / n, a / n)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_smoother_reads_one_g() {
        assert_eq!(GForceSmoother::new(5).average(), GForces::ONE_G);
    }

    #[test]
    fn averages_over_window() {
        let mut smoother = GForceSmoother::new(2);
        smoother.push(GForces::from_components(1.0, 0.0, 0.0));
        let avg = smoother.push(GForces::from_components(3.0, 1.0, 0.0));
        assert_relative_eq!(avg.vertical, 2.0);
        assert_relative_eq!(avg.lateral, 0.5);

        // Oldest reading drops out
        let avg = smoother.push(GForces::from_components(3.0, 1.0, 0.0));
        assert_relative_eq!(avg.vertical, 3.0);
    }

    #[test]
    fn zero_window_behaves_as_one() {
        let mut smoother = GForceSmoother::new(0);
        assert_eq!(smoother.window(), 1);
        smoother.push(GForces::from_components(2.0, 0.0, 0.0));
        let avg = smoother.push(GForces::from_components(4.0, 0.0, 0.0));
        assert_relative_eq!(avg.vertical, 4.0);
    }

    #[test]
    fn clear_resets_average() {
        let mut smoother = GForceSmoother::new(3);
        smoother.push(GForces::from_components(4.0, 0.0, 0.0));
        smoother.clear();
        assert_eq!(smoother.average(), GForces::ONE_G);
    }
}
