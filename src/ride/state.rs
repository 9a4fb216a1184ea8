use crate::sim::{Float3, Frame, GForces};

/// Mechanical energy of the train, joules. Potential is measured from the
/// lowest point of the track.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Energy {
    pub kinetic: f32,
    pub potential: f32,
    pub total: f32,
}

impl Energy {
    pub fn new(kinetic: f32, potential: f32) -> Self {
        Self {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }
}

/// Vehicle state after the latest `step`.
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SimulationState {
    pub position: Float3,
    pub velocity: Float3,
    /// Banked rail frame at `position`.
    pub frame: Frame,
    /// m/s, never below `MIN_SPEED`.
    pub speed: f32,
    /// Speed at the start of the latest step.
    pub previous_speed: f32,
    /// Along-track acceleration over the latest step, m/s^2.
    pub acceleration: f32,
    pub progress: f32,
    /// Cumulative arc length travelled, meters.
    pub distance: f32,
    /// Simulated seconds since reset, playback multiplier applied.
    pub elapsed: f32,
    /// Completed circuits of a closed track.
    pub laps: u32,
    /// Display G-forces: clamped and smoothed.
    pub g_forces: GForces,
    /// Unclamped G-forces at the current position.
    pub raw_g_forces: GForces,
    /// Telemetry only. Not conserved while the `MIN_SPEED` floor holds a
    /// stalled train moving uphill, since the floor adds energy the chain
    /// lift did not supply.
    pub energy: Energy,
    pub on_chain_lift: bool,
    pub in_loop: bool,
    pub airtime: bool,
    pub braking: bool,
    /// Open track finished; further steps do nothing.
    pub complete: bool,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            position: Float3::ZERO,
            velocity: Float3::ZERO,
            frame: Frame::DEFAULT,
            speed: 0.0,
            previous_speed: 0.0,
            acceleration: 0.0,
            progress: 0.0,
            distance: 0.0,
            elapsed: 0.0,
            laps: 0,
            g_forces: GForces::ONE_G,
            raw_g_forces: GForces::ONE_G,
            energy: Energy::default(),
            on_chain_lift: false,
            in_loop: false,
            airtime: false,
            braking: false,
            complete: false,
        }
    }
}
