pub const G: f32 = 9.81;
pub const EPSILON: f32 = 1.192_093e-7;

/// Speed floor; keeps tangent-following well defined.
pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 80.0;

pub const CHAIN_LIFT_SPEED: f32 = 2.5;
pub const CHAIN_LIFT_ACCELERATION: f32 = 0.5;

/// Vertical G below which the rider is considered airborne.
pub const AIRTIME_THRESHOLD: f32 = 0.5;

/// Relative energy gain per substep tolerated before the speed is rebuilt
/// from the energy budget.
pub const ENERGY_TOLERANCE: f32 = 0.01;

/// Minimum clearance between rail and ground, meters.
pub const GROUND_CLEARANCE: f32 = 0.5;

pub fn kinetic_energy(mass: f32, speed: f32) -> f32 {
    0.5 * mass * speed * speed
}

pub fn potential_energy(mass: f32, height: f32) -> f32 {
    mass * G * height
}

/// Speed that spends exactly `total_energy` at `height`.
///
/// Returns zero when the budget cannot lift the car to `height`.
pub fn speed_from_energy(mass: f32, total_energy: f32, height: f32) -> f32 {
    let kinetic = total_energy - potential_energy(mass, height);
    if kinetic <= 0.0 || mass <= 0.0 {
        return 0.0;
    }
    (2.0 * kinetic / mass).sqrt()
}

/// Distance above the required ground clearance; negative means too low.
pub fn ground_clearance(height: f32) -> f32 {
    height - GROUND_CLEARANCE
}

/// Wraps a progress value into `[0, 1)`.
pub fn wrap_progress(progress: f32) -> f32 {
    let wrapped = progress.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
