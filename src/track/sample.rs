use crate::sim::{Curvature, Float3, Frame};

/// Track state at one progress value. Recomputed per query.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackSample {
    pub progress: f32,
    pub position: Float3,
    pub tangent: Float3,
    /// Banked up vector.
    pub up: Float3,
    /// Banked right vector.
    pub right: Float3,
    /// 1/radius.
    pub curvature: f32,
    /// Unit vector toward the center of curvature, zero on straight rail.
    pub principal_normal: Float3,
    /// Rise over run, percent.
    pub grade: f32,
    /// Radians.
    pub bank: f32,
    pub in_loop: bool,
    /// Control point that owns the containing section.
    pub point_index: u32,
}

/// Grade reported for vertical rail.
const MAX_GRADE: f32 = 10_000.0;

impl TrackSample {
    pub fn new(
        progress: f32,
        position: Float3,
        frame: Frame,
        curvature: Curvature,
        bank: f32,
        in_loop: bool,
        point_index: u32,
    ) -> Self {
        Self {
            progress,
            position,
            tangent: frame.tangent,
            up: frame.up,
            right: frame.right,
            curvature: curvature.magnitude,
            principal_normal: curvature.direction,
            grade: grade_percent(frame.tangent),
            bank,
            in_loop,
            point_index,
        }
    }

    /// Neutral sample returned when there is no track.
    pub const EMPTY: Self = Self {
        progress: 0.0,
        position: Float3::ZERO,
        tangent: Float3::RIGHT,
        up: Float3::UP,
        right: Float3::FORWARD,
        curvature: 0.0,
        principal_normal: Float3::ZERO,
        grade: 0.0,
        bank: 0.0,
        in_loop: false,
        point_index: 0,
    };

    pub fn frame(&self) -> Frame {
        Frame::new(self.tangent, self.up, self.right)
    }

    pub fn curvature(&self) -> Curvature {
        Curvature::new(self.curvature, self.principal_normal)
    }

    pub fn height(&self) -> f32 {
        self.position.y
    }
}

impl Default for TrackSample {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Rise over run of a direction, percent; capped for vertical directions.
pub fn grade_percent(direction: Float3) -> f32 {
    let run = (direction.x * direction.x + direction.z * direction.z).sqrt();
    if run * MAX_GRADE <= direction.y.abs() * 100.0 {
        return MAX_GRADE.copysign(direction.y);
    }
    100.0 * direction.y / run
}
