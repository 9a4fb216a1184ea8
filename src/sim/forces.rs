use serde::{Deserialize, Serialize};

use super::curvature::Curvature;
use super::frame::Frame;
use super::math::Float3;
use super::physics;

/// Rider-felt acceleration in multiples of g, resolved on the car frame.
///
/// Sign conventions: `vertical` positive pushes the rider into the seat,
/// `lateral` positive pushes toward `right`, `longitudinal` positive pushes
/// the rider forward (braking).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GForces {
    pub vertical: f32,
    pub lateral: f32,
    pub longitudinal: f32,
    pub total: f32,
}

impl GForces {
    pub const fn new(vertical: f32, lateral: f32, longitudinal: f32, total: f32) -> Self {
        Self {
            vertical,
            lateral,
            longitudinal,
            total,
        }
    }

    pub fn from_components(vertical: f32, lateral: f32, longitudinal: f32) -> Self {
        let total =
            (vertical * vertical + lateral * lateral + longitudinal * longitudinal).sqrt();
        Self::new(vertical, lateral, longitudinal, total)
    }

    /// Decomposes the specific force `kappa*v^2 + T*a_t + g*Y` on the frame.
    ///
    /// `tangential_accel` is the full acceleration along the tangent,
    /// gravity included.
    pub fn compute(frame: Frame, curvature: Curvature, speed: f32, tangential_accel: f32) -> Self {
        let specific = curvature.vector() * (speed * speed)
            + frame.tangent * tangential_accel
            + Float3::UP * physics::G;

        Self::from_components(
            specific.dot(frame.up) / physics::G,
            specific.dot(frame.right) / physics::G,
            -specific.dot(frame.tangent) / physics::G,
        )
    }

    /// Display copy with vertical and lateral clamped; total recomputed.
    pub fn clamped(self, limits: &GForceLimits) -> Self {
        Self::from_components(
            self.vertical
                .clamp(limits.vertical_min, limits.vertical_max),
            self.lateral.clamp(-limits.lateral_max, limits.lateral_max),
            self.longitudinal,
        )
    }

    pub fn is_airtime(self) -> bool {
        self.vertical < physics::AIRTIME_THRESHOLD
    }

    pub const ONE_G: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

impl Default for GForces {
    fn default() -> Self {
        Self::ONE_G
    }
}

/// Bounds applied to G values before display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GForceLimits {
    pub vertical_min: f32,
    pub vertical_max: f32,
    pub lateral_max: f32,
}

impl Default for GForceLimits {
    fn default() -> Self {
        Self {
            vertical_min: -1.5,
            vertical_max: 4.5,
            lateral_max: 1.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-4;

    #[test]
    fn one_g_has_unit_vertical() {
        let one_g = GForces::ONE_G;
        assert_relative_eq!(one_g.vertical, 1.0, epsilon = TOLERANCE);
        assert_relative_eq!(one_g.total, 1.0, epsilon = TOLERANCE);
    }

    #[test]
    fn compute_flat_track_one_g() {
        let forces = GForces::compute(Frame::DEFAULT, Curvature::ZERO, 15.0, 0.0);

        assert_relative_eq!(forces.vertical, 1.0, epsilon = TOLERANCE);
        assert_relative_eq!(forces.lateral, 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(forces.longitudinal, 0.0, epsilon = TOLERANCE);
        assert!(!forces.is_airtime());
    }

    #[test]
    fn compute_crest_reduces_vertical() {
        let crest = Curvature::new(0.05, Float3::DOWN);
        let forces = GForces::compute(Frame::DEFAULT, crest, 10.0, 0.0);
        // 1 - 0.05 * 100 / 9.81
        assert_relative_eq!(forces.vertical, 1.0 - 5.0 / physics::G, epsilon = TOLERANCE);
        assert!(forces.is_airtime());
    }

    #[test]
    fn compute_valley_increases_vertical() {
        let valley = Curvature::new(0.05, Float3::UP);
        let forces = GForces::compute(Frame::DEFAULT, valley, 10.0, 0.0);
        assert!(forces.vertical > 1.5);
    }

    #[test]
    fn compute_free_fall_slope_has_no_longitudinal() {
        let frame = Frame::from_tangent(Float3::new(1.0, -1.0, 0.0));
        let gravity_along = -physics::G * frame.tangent.y;
        let forces = GForces::compute(frame, Curvature::ZERO, 10.0, gravity_along);
        assert_relative_eq!(forces.longitudinal, 0.0, epsilon = TOLERANCE);
        assert!(forces.vertical < 1.0);
    }

    #[test]
    fn compute_braking_pushes_forward() {
        let forces = GForces::compute(Frame::DEFAULT, Curvature::ZERO, 10.0, -2.0);
        assert!(forces.longitudinal > 0.0);
    }

    #[test]
    fn compute_bank_matched_turn_cancels_lateral() {
        // Flat turn of radius 20 at 14 m/s, center toward -right (left turn)
        let speed: f32 = 14.0;
        let curvature = Curvature::new(1.0 / 20.0, Float3::new(0.0, 0.0, -1.0));
        let centripetal = speed * speed / 20.0;
        let bank = -(centripetal / physics::G).atan();
        let frame = Frame::DEFAULT.with_bank(bank);

        let unbanked = GForces::compute(Frame::DEFAULT, curvature, speed, 0.0);
        let banked = GForces::compute(frame, curvature, speed, 0.0);

        assert!(unbanked.lateral.abs() > 0.5);
        assert_relative_eq!(banked.lateral, 0.0, epsilon = 1e-3);
        assert!(banked.vertical > 1.0);
    }

    #[test]
    fn clamped_limits_display_only() {
        let raw = GForces::from_components(6.0, -2.5, 0.3);
        let shown = raw.clamped(&GForceLimits::default());
        assert_relative_eq!(shown.vertical, 4.5, epsilon = TOLERANCE);
        assert_relative_eq!(shown.lateral, -1.8, epsilon = TOLERANCE);
        assert_relative_eq!(shown.longitudinal, 0.3, epsilon = TOLERANCE);
        assert!(shown.total < raw.total);
        assert_relative_eq!(raw.vertical, 6.0, epsilon = TOLERANCE);
    }
}
