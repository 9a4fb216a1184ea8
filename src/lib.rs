//! Roller coaster track geometry and ride physics.
//!
//! # Architecture
//!
//! Layered modules with inward-only dependencies:
//!
//! - **sim**: Math primitives (Float3, Quaternion, Frame), curvature, G-forces, constants
//! - **track**: Control points, Catmull-Rom curve, loop elements, section assembly, sampling
//! - **ride**: Live simulator stepping a train along a track
//! - **validate**: Static safety analysis producing issues
//! - **config**: Ride configuration and validation thresholds
//! - **ffi**: C FFI bindings
//!
//! # Usage
//!
//! ```ignore
//! use coaster_engine::{ControlPoint, RideConfig, Simulator, TrackLayout};
//! ```
//!
//! For C/C#/Unity, link the cdylib with the `ffi` feature and use `coaster_*`
//! functions.

pub mod config;
pub mod ride;
pub mod sim;
pub mod track;
pub mod validate;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types at crate root
pub use config::{ConfigError, RideConfig, ValidationThresholds};
pub use ride::{SimulationState, Simulator};
pub use sim::{Float3, Frame, GForces, Quaternion};
pub use track::{
    ControlPoint, LoopElement, LoopTable, TrackDefinition, TrackLayout, TrackSample,
};
pub use validate::{validate, Issue, IssueKind, Severity};
