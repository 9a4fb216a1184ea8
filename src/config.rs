//! Ride and validation tunables.
//!
//! Every field has a default, so partial JSON documents are accepted.

use serde::{Deserialize, Serialize};

use crate::sim::{physics, GForceLimits};

/// Playback multipliers outside this range are clamped.
pub const MAX_SPEED_MULTIPLIER: f32 = 8.0;

/// Upper bound on integration substeps per frame, before the multiplier.
pub const MAX_SUBSTEPS: u32 = 64;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "Malformed JSON: {err}"),
            ConfigError::Invalid { field, reason } => write!(f, "Invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be non-negative, got {value}")))
    }
}

/// Physics and playback settings for one ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    /// Train mass, kg.
    pub mass: f32,
    /// Quadratic drag: deceleration = `drag_coefficient * v^2`.
    pub drag_coefficient: f32,
    /// Rolling resistance as a fraction of the normal force.
    pub rolling_friction: f32,
    pub has_chain_lift: bool,
    /// m/s.
    pub chain_lift_speed: f32,
    /// m/s^2.
    pub chain_lift_acceleration: f32,
    /// Speed after `reset`, m/s.
    pub initial_speed: f32,
    /// Playback rate; scales simulated time, not physics.
    pub speed_multiplier: f32,
    /// Longest frame time accepted by `step`, seconds.
    pub max_step: f32,
    /// Substeps per `step` at 1x playback.
    pub substeps: u32,
    pub display_limits: GForceLimits,
    /// Steps averaged for displayed G-forces.
    pub smoothing_window: usize,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            mass: 600.0,
            drag_coefficient: 0.0015,
            rolling_friction: 0.008,
            has_chain_lift: true,
            chain_lift_speed: physics::CHAIN_LIFT_SPEED,
            chain_lift_acceleration: physics::CHAIN_LIFT_ACCELERATION,
            initial_speed: 1.0,
            speed_multiplier: 1.0,
            max_step: 0.05,
            substeps: 4,
            display_limits: GForceLimits::default(),
            smoothing_window: 10,
        }
    }
}

impl RideConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("mass", self.mass)?;
        require_non_negative("drag_coefficient", self.drag_coefficient)?;
        require_non_negative("rolling_friction", self.rolling_friction)?;
        require_positive("chain_lift_speed", self.chain_lift_speed)?;
        require_positive("chain_lift_acceleration", self.chain_lift_acceleration)?;
        require_non_negative("initial_speed", self.initial_speed)?;
        require_non_negative("speed_multiplier", self.speed_multiplier)?;
        require_positive("max_step", self.max_step)?;

        if !(1..=MAX_SUBSTEPS).contains(&self.substeps) {
            return Err(invalid(
                "substeps",
                format!("must be between 1 and {MAX_SUBSTEPS}"),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(invalid("smoothing_window", "must be at least 1"));
        }

        let limits = &self.display_limits;
        if !(limits.vertical_min < limits.vertical_max) {
            return Err(invalid(
                "display_limits",
                format!(
                    "vertical_min {} must be below vertical_max {}",
                    limits.vertical_min, limits.vertical_max
                ),
            ));
        }
        require_positive("display_limits.lateral_max", limits.lateral_max)
    }

    /// `substeps` clamped to `[1, MAX_SUBSTEPS]`.
    pub fn effective_substeps(&self) -> u32 {
        self.substeps.clamp(1, MAX_SUBSTEPS)
    }

    /// `speed_multiplier` clamped to `[0, MAX_SPEED_MULTIPLIER]`.
    pub fn effective_multiplier(&self) -> f32 {
        if self.speed_multiplier.is_finite() {
            self.speed_multiplier.clamp(0.0, MAX_SPEED_MULTIPLIER)
        } else {
            1.0
        }
    }
}

/// Limits the validator checks a ride against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    pub vertical_g_error: f32,
    pub vertical_g_warning: f32,
    /// Negative vertical G below this is strong airtime.
    pub negative_g_warning: f32,
    pub lateral_g_error: f32,
    pub lateral_g_warning: f32,
    /// m/s.
    pub max_speed_warning: f32,
    /// m/s.
    pub stall_speed: f32,
    /// Progress before which low speed is not a stall (launch, lift).
    pub stall_grace_progress: f32,
    /// Meters above ground.
    pub min_height: f32,
    /// Degrees between consecutive point-to-point directions.
    pub turn_angle_error: f32,
    pub turn_angle_warning: f32,
    /// Percent.
    pub grade_warning: f32,
    /// 1/m on spline rail.
    pub curvature_error: f32,
    pub curvature_warning: f32,
    /// Sample spacing for the self-intersection scan, meters.
    pub intersection_spacing: f32,
    /// Closer than this in space counts as intersecting, meters.
    pub intersection_distance: f32,
    /// Samples closer than this along the track are neighbours, meters.
    pub intersection_min_separation: f32,
    /// Simulation step used by the validation ride, seconds.
    pub time_step: f32,
    pub max_iterations: usize,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            vertical_g_error: 4.0,
            vertical_g_warning: 3.5,
            negative_g_warning: -1.0,
            lateral_g_error: 1.5,
            lateral_g_warning: 1.2,
            max_speed_warning: 45.0,
            stall_speed: 0.5,
            stall_grace_progress: 0.1,
            min_height: physics::GROUND_CLEARANCE,
            turn_angle_error: 90.0,
            turn_angle_warning: 60.0,
            grade_warning: 100.0,
            curvature_error: 0.5,
            curvature_warning: 0.25,
            intersection_spacing: 2.0,
            intersection_distance: 2.0,
            intersection_min_separation: 10.0,
            time_step: 1.0 / 60.0,
            max_iterations: 36_000,
        }
    }
}

impl ValidationThresholds {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let thresholds: Self = serde_json::from_str(json)?;
        require_positive("time_step", thresholds.time_step)?;
        require_positive("intersection_spacing", thresholds.intersection_spacing)?;
        if thresholds.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        Ok(thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        assert!(RideConfig::default().validate().is_ok());
        assert_relative_eq!(RideConfig::default().mass, 600.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = RideConfig::from_json(r#"{"mass": 800.0, "has_chain_lift": false}"#).unwrap();
        assert_relative_eq!(config.mass, 800.0);
        assert!(!config.has_chain_lift);
        assert_eq!(config.substeps, 4);
        assert_eq!(config.display_limits, GForceLimits::default());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = RideConfig::from_json("{mass: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Malformed JSON"));
    }

    #[test]
    fn non_positive_mass_is_rejected() {
        let err = RideConfig::from_json(r#"{"mass": 0.0}"#).unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "mass"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inverted_display_limits_are_rejected() {
        let json = r#"{"display_limits": {"vertical_min": 3.0, "vertical_max": 1.0}}"#;
        assert!(matches!(
            RideConfig::from_json(json),
            Err(ConfigError::Invalid { field: "display_limits", .. })
        ));
    }

    #[test]
    fn multiplier_is_clamped() {
        let mut config = RideConfig::default();
        config.speed_multiplier = 20.0;
        assert_eq!(config.effective_multiplier(), MAX_SPEED_MULTIPLIER);
        config.speed_multiplier = f32::NAN;
        assert_eq!(config.effective_multiplier(), 1.0);
    }

    #[test]
    fn substeps_are_bounded() {
        let json = format!(r#"{{"substeps": {}}}"#, MAX_SUBSTEPS + 1);
        assert!(matches!(
            RideConfig::from_json(&json),
            Err(ConfigError::Invalid { field: "substeps", .. })
        ));

        let config = RideConfig {
            substeps: u32::MAX,
            ..RideConfig::default()
        };
        assert_eq!(config.effective_substeps(), MAX_SUBSTEPS);
    }

    #[test]
    fn config_survives_json() {
        let mut config = RideConfig::default();
        config.rolling_friction = 0.02;
        let json = config.to_json().unwrap();
        assert_eq!(RideConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn threshold_defaults() {
        let thresholds = ValidationThresholds::from_json("{}").unwrap();
        assert_relative_eq!(thresholds.vertical_g_error, 4.0);
        assert_relative_eq!(thresholds.lateral_g_warning, 1.2);
        assert_relative_eq!(thresholds.min_height, 0.5);
        assert_eq!(thresholds, ValidationThresholds::default());
    }
}
