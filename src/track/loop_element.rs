use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::sim::{Float3, Frame};

use super::arc::ArcTable;

/// Sideways displacement of a loop as a fraction of its radius.
pub const CORKSCREW_RATIO: f32 = 0.4;
/// Chord count for loop arc-length integration.
pub const LOOP_ARC_SAMPLES: usize = 100;

const MIN_RADIUS: f32 = 1.0;
const MIN_PITCH: f32 = 0.5;

/// Vertical loop attached to a control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopElement {
    /// Meters.
    pub radius: f32,
    /// Forward travel completed over one full rotation, meters. Must be > 0
    /// or the exit rail lands on the entry rail.
    pub pitch: f32,
}

impl LoopElement {
    pub const fn new(radius: f32, pitch: f32) -> Self {
        Self { radius, pitch }
    }

    /// Copy with radius and pitch raised to their positive minimums.
    pub fn sanitized(self) -> Self {
        let radius = if self.radius.is_finite() {
            self.radius.max(MIN_RADIUS)
        } else {
            LoopElement::default().radius
        };
        let pitch = if self.pitch.is_finite() {
            self.pitch.max(MIN_PITCH)
        } else {
            LoopElement::default().pitch
        };
        if radius != self.radius || pitch != self.pitch {
            log::warn!(
                "loop element clamped: radius {} -> {radius}, pitch {} -> {pitch}",
                self.radius,
                self.pitch
            );
        }
        Self { radius, pitch }
    }

    pub fn corkscrew_offset(&self) -> f32 {
        self.radius * CORKSCREW_RATIO
    }

    /// Arc-length table of the loop in local coordinates; the length does
    /// not depend on the entry frame.
    pub fn arc_table(&self) -> ArcTable {
        let entry = LoopEntry::new(Float3::ZERO, Frame::DEFAULT);
        ArcTable::build(LOOP_ARC_SAMPLES, |t| sample_loop(&entry, self, t).position)
    }

    pub fn arc_length(&self) -> f32 {
        self.arc_table().total_length()
    }
}

impl Default for LoopElement {
    fn default() -> Self {
        Self {
            radius: 5.0,
            pitch: 12.0,
        }
    }
}

/// Position and orientation where a loop leaves the spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopEntry {
    pub position: Float3,
    pub frame: Frame,
}

impl LoopEntry {
    pub const fn new(position: Float3, frame: Frame) -> Self {
        Self { position, frame }
    }

    /// Where the rail rejoins the spline: one pitch ahead of the entry.
    pub fn exit_position(&self, element: &LoopElement) -> Float3 {
        self.position + self.frame.tangent * element.pitch
    }
}

/// A point on a loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopPoint {
    pub position: Float3,
    pub tangent: Float3,
    pub up: Float3,
}

/// Eased rotation angle: `2*pi*(t - sin(2*pi*t)/(2*pi))`.
///
/// Its derivative vanishes at both ends so the loop leaves and rejoins the
/// spline without an angular-velocity jump.
pub fn eased_angle(t: f32) -> f32 {
    TAU * t - (TAU * t).sin()
}

/// `d(eased_angle)/dt`.
pub fn eased_angle_rate(t: f32) -> f32 {
    TAU * (1.0 - (TAU * t).cos())
}

/// Evaluates the loop at local parameter `t` in `[0, 1]`.
pub fn sample_loop(entry: &LoopEntry, element: &LoopElement, t: f32) -> LoopPoint {
    let t = t.clamp(0.0, 1.0);
    let forward = entry.frame.tangent;
    let up = entry.frame.up;
    let right = entry.frame.right;

    let radius = element.radius;
    let corkscrew = element.corkscrew_offset();
    let theta = eased_angle(t);
    let rate = eased_angle_rate(t);
    let (sin, cos) = theta.sin_cos();

    let position = entry.position
        + forward * (element.pitch * t + radius * sin)
        + up * (radius * (1.0 - cos))
        + right * (corkscrew * sin);

    let velocity = forward * (element.pitch + radius * cos * rate)
        + up * (radius * sin * rate)
        + right * (corkscrew * cos * rate);
    let tangent = velocity.normalize();

    // Toward the loop's center, projected off the tangent
    let inward = up * cos - forward * sin;
    let frame = Frame::from_tangent_and_up(tangent, inward);

    LoopPoint {
        position,
        tangent: frame.tangent,
        up: frame.up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-4;

    fn level_entry() -> LoopEntry {
        LoopEntry::new(Float3::new(0.0, 5.0, 0.0), Frame::DEFAULT)
    }

    #[test]
    fn eased_angle_endpoints_and_rate() {
        assert_relative_eq!(eased_angle(0.0), 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(eased_angle(1.0), TAU, epsilon = TOLERANCE);
        assert_relative_eq!(eased_angle(0.5), std::f32::consts::PI, epsilon = TOLERANCE);
        assert_relative_eq!(eased_angle_rate(0.0), 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(eased_angle_rate(1.0), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn entry_and_exit_tangents_match_forward() {
        let entry = level_entry();
        let element = LoopElement::new(5.0, 12.0);

        for t in [0.0, 1.0] {
            let p = sample_loop(&entry, &element, t);
            assert_relative_eq!(p.tangent.x, 1.0, epsilon = 1e-4);
            assert_relative_eq!(p.up.y, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn exit_is_one_pitch_ahead() {
        let entry = level_entry();
        let element = LoopElement::new(5.0, 12.0);
        let exit = sample_loop(&entry, &element, 1.0).position;
        let expected = entry.exit_position(&element);

        assert_relative_eq!(exit.x, expected.x, epsilon = 1e-3);
        assert_relative_eq!(exit.y, expected.y, epsilon = 1e-3);
        assert_relative_eq!(exit.z, expected.z, epsilon = 1e-3);
    }

    #[test]
    fn top_of_loop_is_inverted_and_two_radii_high() {
        let entry = level_entry();
        let element = LoopElement::new(5.0, 12.0);
        let top = sample_loop(&entry, &element, 0.5);

        assert_relative_eq!(top.position.y, 15.0, epsilon = 1e-3);
        assert!(top.up.y < -0.9);
        assert!(top.tangent.x < 0.0);
    }

    #[test]
    fn corkscrew_moves_sideways_mid_rotation() {
        let entry = level_entry();
        let element = LoopElement::new(5.0, 12.0);
        let quarter = sample_loop(&entry, &element, 0.25);
        assert!(quarter.position.z.abs() > 0.1);
    }

    #[test]
    fn loop_frames_stay_orthonormal() {
        let entry = level_entry();
        let element = LoopElement::new(5.0, 12.0);
        for i in 0..=50 {
            let p = sample_loop(&entry, &element, i as f32 / 50.0);
            assert_relative_eq!(p.tangent.magnitude(), 1.0, epsilon = TOLERANCE);
            assert_relative_eq!(p.up.magnitude(), 1.0, epsilon = TOLERANCE);
            assert!(p.tangent.dot(p.up).abs() < TOLERANCE);
        }
    }

    #[test]
    fn arc_length_exceeds_circumference() {
        let element = LoopElement::new(5.0, 12.0);
        let circumference = TAU * 5.0;
        assert!(element.arc_length() > circumference);
        assert!(element.arc_length() < circumference + 12.0 + 2.0 * TAU * 2.0);
    }

    #[test]
    fn sanitized_raises_non_positive_pitch() {
        let element = LoopElement::new(0.0, -3.0).sanitized();
        assert!(element.radius >= 1.0);
        assert!(element.pitch > 0.0);
        assert_eq!(LoopElement::default().sanitized(), LoopElement::default());
    }
}
