use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::sim::Float3;

use super::loop_element::LoopElement;

/// User-placed anchor of the rail.
///
/// Serializes as `{x, y, z, tilt, hasLoop}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPoint {
    #[serde(flatten)]
    pub position: Float3,
    /// Banking around the direction of travel, radians.
    #[serde(default)]
    pub tilt: f32,
    /// A loop element starts at this point.
    #[serde(default)]
    pub has_loop: bool,
}

impl ControlPoint {
    pub const fn new(position: Float3) -> Self {
        Self {
            position,
            tilt: 0.0,
            has_loop: false,
        }
    }

    pub const fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new(Float3::new(x, y, z))
    }

    pub const fn with_tilt(self, tilt: f32) -> Self {
        Self { tilt, ..self }
    }

    pub const fn with_loop(self) -> Self {
        Self {
            has_loop: true,
            ..self
        }
    }
}

/// Loop parameters keyed by the index of the control point that owns them.
pub type LoopTable = BTreeMap<usize, LoopElement>;

/// Everything the editor hands the engine to describe one track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackDefinition {
    pub points: Vec<ControlPoint>,
    #[serde(default)]
    pub loops: LoopTable,
    #[serde(default)]
    pub closed: bool,
}

impl TrackDefinition {
    pub fn new(points: Vec<ControlPoint>, loops: LoopTable, closed: bool) -> Self {
        Self {
            points,
            loops,
            closed,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loop element for point `index`, if that point starts a loop.
    ///
    /// Points flagged `has_loop` without a table entry get the default element.
    pub fn loop_at(&self, index: usize) -> Option<LoopElement> {
        resolve_loop(&self.points, &self.loops, index)
    }
}

pub(crate) fn resolve_loop(
    points: &[ControlPoint],
    loops: &LoopTable,
    index: usize,
) -> Option<LoopElement> {
    let point = points.get(index)?;
    if !point.has_loop {
        return None;
    }
    Some(loops.get(&index).copied().unwrap_or_default().sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn control_point_json_shape() {
        let json = r#"{"x":1.0,"y":5.0,"z":-2.0,"tilt":0.3,"hasLoop":true}"#;
        let point: ControlPoint = serde_json::from_str(json).unwrap();

        assert_relative_eq!(point.position.x, 1.0);
        assert_relative_eq!(point.position.y, 5.0);
        assert_relative_eq!(point.position.z, -2.0);
        assert_relative_eq!(point.tilt, 0.3);
        assert!(point.has_loop);
    }

    #[test]
    fn control_point_optional_fields_default() {
        let point: ControlPoint = serde_json::from_str(r#"{"x":0,"y":2,"z":0}"#).unwrap();
        assert_eq!(point.tilt, 0.0);
        assert!(!point.has_loop);
    }

    #[test]
    fn definition_round_trips_loops_by_index() {
        let mut loops = LoopTable::new();
        loops.insert(1, LoopElement::new(6.0, 14.0));
        let def = TrackDefinition::new(
            vec![
                ControlPoint::at(0.0, 5.0, 0.0),
                ControlPoint::at(30.0, 5.0, 0.0).with_loop(),
                ControlPoint::at(60.0, 5.0, 0.0),
            ],
            loops,
            false,
        );

        let json = def.to_json().unwrap();
        let loaded = TrackDefinition::from_json(&json).unwrap();
        assert_eq!(loaded, def);
    }

    #[test]
    fn definition_rejects_malformed_json() {
        assert!(TrackDefinition::from_json("{\"points\": 3}").is_err());
    }

    #[test]
    fn loop_at_requires_flag_and_defaults_parameters() {
        let mut loops = LoopTable::new();
        loops.insert(0, LoopElement::new(7.0, 10.0));
        let def = TrackDefinition::new(
            vec![
                ControlPoint::at(0.0, 5.0, 0.0),
                ControlPoint::at(30.0, 5.0, 0.0).with_loop(),
            ],
            loops,
            false,
        );

        assert!(def.loop_at(0).is_none());
        assert_eq!(def.loop_at(1), Some(LoopElement::default()));
        assert!(def.loop_at(5).is_none());
    }
}
