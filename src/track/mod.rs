//! Track geometry: control points, the Catmull-Rom curve, loop elements,
//! section assembly and the assembled [`TrackLayout`].
//!
//! Data flows one way: control points -> sections -> samples.

mod arc;
mod control_point;
mod layout;
mod loop_element;
mod sample;
mod section;
mod spline;

pub use arc::ArcTable;
pub use control_point::{ControlPoint, LoopTable, TrackDefinition};
pub use layout::{Aabb, TrackLayout, BOUNDS_PADDING};
pub use loop_element::{
    eased_angle, eased_angle_rate, sample_loop, LoopElement, LoopEntry, LoopPoint,
    CORKSCREW_RATIO, LOOP_ARC_SAMPLES,
};
pub use sample::{grade_percent, TrackSample};
pub use section::{build_sections, SectionKind, TrackSection};
pub use spline::{catmull_rom, TrackCurve, TENSION};
