//! C ABI for the ride engine.
//!
//! Functions:
//! - `coaster_ride_new` / `coaster_ride_free` - opaque ride handle
//! - `coaster_ride_configure` - apply a JSON `RideConfig`
//! - `coaster_ride_set_track` - control points + loop table in, layout built
//! - `coaster_ride_step` / `coaster_ride_state` - advance and read the train
//! - `coaster_ride_reset`, `coaster_ride_set_progress`, `coaster_ride_set_speed`,
//!   `coaster_ride_set_chain_lift`, `coaster_ride_set_speed_multiplier`
//! - `coaster_ride_sample` - arbitrary progress query
//! - `coaster_ride_bounds` - padded track extent
//! - `coaster_validate` - static checks into a caller buffer
//!
//! # Error Codes
//! - `0`: Success
//! - `-1`: Null pointer
//! - `-2`: No track loaded
//! - `-3`: Buffer too small (required count written, resize and retry)
//! - `-5`: Invalid configuration

use crate::config::RideConfig;
use crate::ride::{SimulationState, Simulator};
use crate::sim::Float3;
use crate::track::{Aabb, ControlPoint, LoopElement, LoopTable, TrackLayout, TrackSample};
use crate::validate::{self, Issue};

/// Control point as laid out by the host.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CControlPoint {
    pub position: Float3,
    pub tilt: f32,
    /// Non-zero when a loop starts here.
    pub has_loop: u8,
}

impl From<CControlPoint> for ControlPoint {
    fn from(point: CControlPoint) -> Self {
        ControlPoint {
            position: point.position,
            tilt: point.tilt,
            has_loop: point.has_loop != 0,
        }
    }
}

/// Loop parameters for the control point at `point_index`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CLoopElement {
    pub point_index: u32,
    pub radius: f32,
    pub pitch: f32,
}

/// Validation finding without its message text.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CIssue {
    /// 0 info, 1 warning, 2 error.
    pub severity: u32,
    /// `IssueKind::code`.
    pub code: u32,
    /// -1 when the finding is not tied to a point.
    pub point_index: i32,
    /// -1 when the finding is not tied to a progress value.
    pub progress: f32,
    /// NaN when there is no measured value.
    pub value: f32,
}

impl From<&Issue> for CIssue {
    fn from(issue: &Issue) -> Self {
        CIssue {
            severity: issue.severity as u32,
            code: issue.kind.code(),
            point_index: issue.location.point_index.map_or(-1, |i| i as i32),
            progress: issue.location.progress.unwrap_or(-1.0),
            value: issue.value.unwrap_or(f32::NAN),
        }
    }
}

/// Opaque handle to a ride.
pub type CoasterRideHandle = *mut std::ffi::c_void;

/// Create a ride with the default configuration and no track.
///
/// Free with `coaster_ride_free`.
#[no_mangle]
pub extern "C" fn coaster_ride_new() -> CoasterRideHandle {
    Box::into_raw(Box::new(Simulator::new(RideConfig::default()))) as CoasterRideHandle
}

/// Free a ride handle.
///
/// # Safety
/// - `handle` must be a handle returned by `coaster_ride_new`, or null
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_free(handle: CoasterRideHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut Simulator));
    }
}

unsafe fn ride<'a>(handle: CoasterRideHandle) -> Option<&'a mut Simulator> {
    (handle as *mut Simulator).as_mut()
}

/// Replace the ride configuration from a UTF-8 JSON document and reset.
///
/// # Returns
/// - `0` on success
/// - `-1` on null pointer
/// - `-5` if the JSON is malformed or a value is out of range
///
/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
/// - `json` must point to at least `json_len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_configure(
    handle: CoasterRideHandle,
    json: *const u8,
    json_len: usize,
) -> i32 {
    let (Some(sim), false) = (ride(handle), json.is_null()) else {
        return -1;
    };
    let bytes = std::slice::from_raw_parts(json, json_len);
    let Ok(text) = std::str::from_utf8(bytes) else {
        return -5;
    };

    match RideConfig::from_json(text) {
        Ok(config) => {
            let layout = sim.track().clone();
            *sim = Simulator::with_track(layout, config);
            0
        }
        Err(err) => {
            log::warn!("rejected ride config: {err}");
            -5
        }
    }
}

/// Build the track from control points and loop parameters, then reset.
///
/// Fewer than two points leaves the ride without a track.
///
/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
/// - `points` must be valid for `point_count` elements (may be null if 0)
/// - `loops` must be valid for `loop_count` elements (may be null if 0)
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_set_track(
    handle: CoasterRideHandle,
    points: *const CControlPoint,
    point_count: usize,
    loops: *const CLoopElement,
    loop_count: usize,
    closed: u8,
) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    let (points, loops) = track_input(points, point_count, loops, loop_count);
    sim.set_track(TrackLayout::build(&points, &loops, closed != 0));
    if sim.track().is_ready() {
        0
    } else {
        -2
    }
}

/// Advance the ride by `dt` seconds and copy the new state.
///
/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
/// - `out_state` must be a valid pointer, or null to skip the copy
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_step(
    handle: CoasterRideHandle,
    dt: f32,
    out_state: *mut SimulationState,
) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    if !sim.track().is_ready() {
        return -2;
    }
    let state = *sim.step(dt);
    if let Some(out) = out_state.as_mut() {
        *out = state;
    }
    0
}

/// Copy the current state without stepping.
///
/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
/// - `out_state` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_state(
    handle: CoasterRideHandle,
    out_state: *mut SimulationState,
) -> i32 {
    match (ride(handle), out_state.as_mut()) {
        (Some(sim), Some(out)) => {
            *out = *sim.state();
            0
        }
        _ => -1,
    }
}

/// Evaluate the track at `progress`.
///
/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
/// - `out_sample` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_sample(
    handle: CoasterRideHandle,
    progress: f32,
    out_sample: *mut TrackSample,
) -> i32 {
    let (Some(sim), Some(out)) = (ride(handle), out_sample.as_mut()) else {
        return -1;
    };
    *out = sim.sample(progress);
    if sim.track().is_ready() {
        0
    } else {
        -2
    }
}

/// Padded bounding box of the track.
///
/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
/// - `out_bounds` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_bounds(
    handle: CoasterRideHandle,
    out_bounds: *mut Aabb,
) -> i32 {
    let (Some(sim), Some(out)) = (ride(handle), out_bounds.as_mut()) else {
        return -1;
    };
    match sim.track().bounds() {
        Some(bounds) => {
            *out = bounds;
            0
        }
        None => -2,
    }
}

/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_reset(handle: CoasterRideHandle) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    sim.reset();
    0
}

/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_set_progress(handle: CoasterRideHandle, progress: f32) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    if !sim.track().is_ready() {
        return -2;
    }
    sim.set_progress(progress);
    0
}

/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_set_speed(handle: CoasterRideHandle, speed: f32) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    sim.set_speed(speed);
    0
}

/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_set_chain_lift(handle: CoasterRideHandle, enabled: u8) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    sim.set_chain_lift(enabled != 0);
    0
}

/// # Safety
/// - `handle` must be a valid handle from `coaster_ride_new`
#[no_mangle]
pub unsafe extern "C" fn coaster_ride_set_speed_multiplier(
    handle: CoasterRideHandle,
    multiplier: f32,
) -> i32 {
    let Some(sim) = ride(handle) else {
        return -1;
    };
    sim.set_speed_multiplier(multiplier);
    0
}

/// Validate a track and copy the findings.
///
/// # Returns
/// - `0` on success
/// - `-1` on null pointer
/// - `-3` if `issues_capacity` is too small (`issue_count` holds the required count)
///
/// # Safety
/// - `points` must be valid for `point_count` elements (may be null if 0)
/// - `loops` must be valid for `loop_count` elements (may be null if 0)
/// - `issues` must be valid for `issues_capacity` elements
/// - `issue_count` must be a valid pointer
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn coaster_validate(
    points: *const CControlPoint,
    point_count: usize,
    loops: *const CLoopElement,
    loop_count: usize,
    closed: u8,
    issues: *mut CIssue,
    issues_capacity: usize,
    issue_count: *mut usize,
) -> i32 {
    if issues.is_null() || issue_count.is_null() {
        return -1;
    }
    let (points, loops) = track_input(points, point_count, loops, loop_count);
    let found = validate::validate(&points, &loops, closed != 0);

    *issue_count = found.len();
    if found.len() > issues_capacity {
        return -3;
    }
    for (i, issue) in found.iter().enumerate() {
        *issues.add(i) = CIssue::from(issue);
    }
    0
}

// --- Helpers ---

unsafe fn track_input(
    points: *const CControlPoint,
    point_count: usize,
    loops: *const CLoopElement,
    loop_count: usize,
) -> (Vec<ControlPoint>, LoopTable) {
    let points = to_vec(points, point_count)
        .into_iter()
        .map(ControlPoint::from)
        .collect();
    let loops = to_vec(loops, loop_count)
        .into_iter()
        .map(|l| (l.point_index as usize, LoopElement::new(l.radius, l.pitch)))
        .collect();
    (points, loops)
}

unsafe fn to_vec<T: Copy>(ptr: *const T, len: usize) -> Vec<T> {
    if len == 0 || ptr.is_null() {
        Vec::new()
    } else {
        std::slice::from_raw_parts(ptr, len).to_vec()
    }
}
