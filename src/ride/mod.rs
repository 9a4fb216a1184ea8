//! Live ride simulation.
//!
//! [`Simulator`] advances a train along a [`crate::track::TrackLayout`] one
//! caller-driven `step(dt)` at a time and publishes a [`SimulationState`].

mod simulator;
mod smoothing;
mod state;

pub use simulator::{Simulator, COMPLETION_PROGRESS};
pub use smoothing::GForceSmoother;
pub use state::{Energy, SimulationState};
