use crate::sim::Float3;

/// Cumulative chord lengths of a parametric curve sampled at uniform
/// parameter steps over `[0, 1]`.
///
/// Converts between curve parameter and arc length in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcTable {
    distances: Vec<f32>,
}

impl ArcTable {
    /// Samples `curve` at `samples + 1` uniform parameters and sums chords.
    pub fn build(samples: usize, curve: impl Fn(f32) -> Float3) -> Self {
        let samples = samples.max(1);
        let mut distances = Vec::with_capacity(samples + 1);
        distances.push(0.0);

        let mut prev = curve(0.0);
        let mut total = 0.0;
        for i in 1..=samples {
            let curr = curve(i as f32 / samples as f32);
            total += prev.distance(curr);
            distances.push(total);
            prev = curr;
        }

        Self { distances }
    }

    pub fn total_length(&self) -> f32 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    fn samples(&self) -> usize {
        self.distances.len() - 1
    }

    /// Arc length from parameter 0 to `param`.
    pub fn distance_at(&self, param: f32) -> f32 {
        let scaled = param.clamp(0.0, 1.0) * self.samples() as f32;
        let lo = (scaled.floor() as usize).min(self.samples() - 1);
        let frac = scaled - lo as f32;
        let a = self.distances[lo];
        let b = self.distances[lo + 1];
        a + (b - a) * frac
    }

    /// Parameter at which the arc length from 0 reaches `distance`.
    ///
    /// Uses binary search to find the bracketing sample, then linearly
    /// interpolates.
    pub fn param_at(&self, distance: f32) -> f32 {
        let last = self.samples();
        if distance <= 0.0 {
            return 0.0;
        }
        if distance >= self.distances[last] {
            return 1.0;
        }

        // Find segment [lo, lo+1] where distances[lo] <= distance < distances[lo+1]
        let mut lo = 0usize;
        let mut hi = last;
        while lo < hi - 1 {
            let mid = (lo + hi) / 2;
            if self.distances[mid] <= distance {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let seg_start = self.distances[lo];
        let seg_len = self.distances[lo + 1] - seg_start;
        let t = if seg_len > 0.0 {
            (distance - seg_start) / seg_len
        } else {
            0.0
        };

        (lo as f32 + t) / last as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-4;

    fn line(t: f32) -> Float3 {
        Float3::new(10.0 * t, 0.0, 0.0)
    }

    /// Straight line whose speed grows with t (x = 10 t^2).
    fn accelerating(t: f32) -> Float3 {
        Float3::new(10.0 * t * t, 0.0, 0.0)
    }

    #[test]
    fn straight_line_length() {
        let table = ArcTable::build(100, line);
        assert_relative_eq!(table.total_length(), 10.0, epsilon = TOLERANCE);
        assert_relative_eq!(table.distance_at(0.5), 5.0, epsilon = TOLERANCE);
    }

    #[test]
    fn param_at_inverts_non_uniform_parameter() {
        let table = ArcTable::build(1000, accelerating);
        let t = table.param_at(2.5);
        // x = 10 t^2 = 2.5 => t = 0.5
        assert_relative_eq!(t, 0.5, epsilon = 1e-3);
        assert_relative_eq!(table.distance_at(t), 2.5, epsilon = 1e-3);
    }

    #[test]
    fn param_at_clamps_out_of_range() {
        let table = ArcTable::build(10, line);
        assert_eq!(table.param_at(-1.0), 0.0);
        assert_eq!(table.param_at(50.0), 1.0);
    }

    #[test]
    fn distance_at_endpoints() {
        let table = ArcTable::build(10, line);
        assert_eq!(table.distance_at(0.0), 0.0);
        assert_relative_eq!(table.distance_at(1.0), 10.0, epsilon = TOLERANCE);
    }

    #[test]
    fn degenerate_curve_has_zero_length() {
        let table = ArcTable::build(10, |_| Float3::new(1.0, 2.0, 3.0));
        assert_eq!(table.total_length(), 0.0);
        assert_eq!(table.param_at(0.5), 1.0);
    }
}
