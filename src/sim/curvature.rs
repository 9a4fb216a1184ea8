use super::math::Float3;
use super::physics;

/// Local bending of the rail.
///
/// `magnitude` is 1/radius; `direction` is the unit principal normal (toward
/// the center of curvature), zero on straight rail.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Curvature {
    pub magnitude: f32,
    pub direction: Float3,
}

impl Curvature {
    pub const fn new(magnitude: f32, direction: Float3) -> Self {
        Self {
            magnitude,
            direction,
        }
    }

    /// Estimates curvature from two unit tangents `distance` meters apart:
    /// turning angle over arc length.
    pub fn from_tangents(prev: Float3, next: Float3, distance: f32) -> Self {
        if distance < physics::EPSILON {
            return Self::ZERO;
        }

        let diff = next - prev;
        if diff.magnitude() < 1e-6 {
            return Self::ZERO;
        }

        let angle = prev.dot(next).clamp(-1.0, 1.0).acos();
        Self::new(angle / distance, diff.normalize())
    }

    /// `kappa * N`; multiply by speed squared for centripetal acceleration.
    pub fn vector(self) -> Float3 {
        self.direction * self.magnitude
    }

    pub fn radius(self) -> f32 {
        if self.magnitude < physics::EPSILON {
            f32::INFINITY
        } else {
            1.0 / self.magnitude
        }
    }

    pub const ZERO: Self = Self::new(0.0, Float3::ZERO);
}

impl Default for Curvature {
    fn default() -> Self {
        Self::ZERO
    }
}
