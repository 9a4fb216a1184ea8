//! Pure physics/math primitives for the ride engine.
//!
//! Vectors, the rail frame, curvature and G-force decomposition, and the
//! physical constants shared by track assembly and the simulator.

mod curvature;
mod forces;
mod frame;
mod math;

pub mod physics;

pub use curvature::Curvature;
pub use forces::{GForceLimits, GForces};
pub use frame::Frame;
pub use math::{Float3, Quaternion};
pub use physics::{
    ground_clearance, kinetic_energy, potential_energy, speed_from_energy, wrap_progress,
    AIRTIME_THRESHOLD, CHAIN_LIFT_ACCELERATION, CHAIN_LIFT_SPEED, ENERGY_TOLERANCE, EPSILON, G,
    GROUND_CLEARANCE, MAX_SPEED, MIN_SPEED,
};
