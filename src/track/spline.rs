use crate::sim::Float3;

use super::arc::ArcTable;

/// Catmull-Rom tension.
pub const TENSION: f32 = 0.5;
/// Parameter offset for central-difference tangents.
const TANGENT_EPSILON: f32 = 1e-4;
const MIN_ARC_SAMPLES: usize = 1000;
const ARC_SAMPLES_PER_SEGMENT: usize = 100;

/// Cardinal spline segment between `p1` and `p2`.
pub fn catmull_rom(p0: Float3, p1: Float3, p2: Float3, p3: Float3, t: f32) -> Float3 {
    let t2 = t * t;
    let t3 = t2 * t;

    let m1 = (p2 - p0) * TENSION;
    let m2 = (p3 - p1) * TENSION;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    p1 * h00 + m1 * h10 + p2 * h01 + m2 * h11
}

/// Spline through the control point positions, parameterized by `t` in
/// `[0, 1]` over all segments, with a precomputed arc-length table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCurve {
    points: Vec<Float3>,
    closed: bool,
    arc: ArcTable,
}

impl TrackCurve {
    /// Returns `None` for fewer than two points.
    pub fn new(points: Vec<Float3>, closed: bool) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }

        let segments = segment_count(points.len(), closed);
        let samples = MIN_ARC_SAMPLES.max(segments * ARC_SAMPLES_PER_SEGMENT);
        let arc = ArcTable::build(samples, |t| eval(&points, closed, t));

        Some(Self {
            points,
            closed,
            arc,
        })
    }

    pub fn points(&self) -> &[Float3] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn segment_count(&self) -> usize {
        segment_count(self.points.len(), self.closed)
    }

    pub fn total_length(&self) -> f32 {
        self.arc.total_length()
    }

    /// Spline parameter at which control point `index` is passed.
    pub fn param_of_point(&self, index: usize) -> f32 {
        (index as f32 / self.segment_count() as f32).min(1.0)
    }

    pub fn position(&self, t: f32) -> Float3 {
        eval(&self.points, self.closed, t)
    }

    /// Unit tangent by central difference.
    pub fn tangent(&self, t: f32) -> Float3 {
        let mut epsilon = TANGENT_EPSILON;
        for _ in 0..3 {
            let (a, b) = self.bracket(t, epsilon);
            let diff = self.position(b) - self.position(a);
            if diff.magnitude() > 1e-6 {
                return diff.normalize();
            }
            epsilon *= 10.0;
        }

        // Stationary point: fall back to the chord of the surrounding segment
        let n = self.segment_count() as f32;
        let start = ((t.clamp(0.0, 1.0) * n).floor() / n).min(1.0 - 1.0 / n);
        let chord = self.position(start + 1.0 / n) - self.position(start);
        let dir = chord.normalize();
        if dir == Float3::ZERO {
            Float3::RIGHT
        } else {
            dir
        }
    }

    fn bracket(&self, t: f32, epsilon: f32) -> (f32, f32) {
        if self.closed {
            (t - epsilon, t + epsilon)
        } else {
            ((t - epsilon).max(0.0), (t + epsilon).min(1.0))
        }
    }

    /// Arc length from the start of the curve to parameter `t`.
    pub fn distance_at(&self, t: f32) -> f32 {
        self.arc.distance_at(t)
    }

    /// Parameter reached after `distance` meters from the start.
    pub fn param_at(&self, distance: f32) -> f32 {
        self.arc.param_at(distance)
    }
}

fn segment_count(point_count: usize, closed: bool) -> usize {
    if closed {
        point_count
    } else {
        point_count - 1
    }
}

fn eval(points: &[Float3], closed: bool, t: f32) -> Float3 {
    let n = points.len();
    let segments = segment_count(n, closed);

    let scaled = if closed {
        t.rem_euclid(1.0) * segments as f32
    } else {
        t.clamp(0.0, 1.0) * segments as f32
    };
    let mut i = scaled.floor() as usize;
    let mut frac = scaled - i as f32;
    if i >= segments {
        i = segments - 1;
        frac = 1.0;
    }

    let (p0, p1, p2, p3) = if closed {
        ((i + n - 1) % n, i, (i + 1) % n, (i + 2) % n)
    } else {
        (i.saturating_sub(1), i, (i + 1).min(n - 1), (i + 2).min(n - 1))
    };

    catmull_rom(points[p0], points[p1], points[p2], points[p3], frac)
}
