use crate::sim::{physics, Curvature, Float3, Frame};

use super::control_point::{ControlPoint, LoopTable, TrackDefinition};
use super::loop_element::sample_loop;
use super::sample::TrackSample;
use super::section::{assemble, SectionKind, TrackSection};
use super::spline::TrackCurve;

/// Arc length between the two tangents used for curvature estimates, meters.
const CURVATURE_SPAN: f32 = 0.5;
/// Steps used to scan the first half of the track for the lift crest.
const PEAK_SCAN_STEPS: usize = 200;
/// Tangent rise that counts as climbing.
const CLIMB_THRESHOLD: f32 = 0.1;
/// Height drop below the best crest that ends the scan, meters.
const DESCENT_THRESHOLD: f32 = 0.05;
const EXTENT_SAMPLES: usize = 512;
/// Padding added around the rail when computing bounds, meters.
pub const BOUNDS_PADDING: f32 = 2.0;

/// Axis-aligned bounding box.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Float3,
    pub max: Float3,
}

impl Aabb {
    pub const fn new(min: Float3, max: Float3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Float3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    pub fn padded(self, amount: f32) -> Self {
        let pad = Float3::new(amount, amount, amount);
        Self::new(self.min - pad, self.max + pad)
    }

    pub fn contains(&self, point: Float3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn center(&self) -> Float3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Float3 {
        self.max - self.min
    }
}

/// Rail pose before curvature is attached.
#[derive(Debug, Clone, Copy)]
struct Pose {
    position: Float3,
    /// Unbanked.
    frame: Frame,
    bank: f32,
    in_loop: bool,
    point_index: usize,
}

/// The assembled track: spline, loop sections, and the derived quantities the
/// simulator and validator need.
///
/// Progress in `[0, 1]` maps linearly onto total arc length, loops included.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    curve: Option<TrackCurve>,
    tilts: Vec<f32>,
    sections: Vec<TrackSection>,
    closed: bool,
    total_length: f32,
    /// Net loop displacement, bled off along a closed track so it rejoins
    /// its start.
    unwind: Float3,
    first_peak_progress: f32,
    min_height: f32,
    bounds: Option<Aabb>,
}

impl TrackLayout {
    /// Track with no rail. `is_ready()` is false.
    pub fn empty() -> Self {
        Self {
            curve: None,
            tilts: Vec::new(),
            sections: Vec::new(),
            closed: false,
            total_length: 0.0,
            unwind: Float3::ZERO,
            first_peak_progress: 0.0,
            min_height: 0.0,
            bounds: None,
        }
    }

    pub fn build(points: &[ControlPoint], loops: &LoopTable, closed: bool) -> Self {
        let positions = points.iter().map(|p| p.position).collect();
        let Some(curve) = TrackCurve::new(positions, closed) else {
            log::debug!("track layout: {} point(s), no rail", points.len());
            return Self::empty();
        };

        let assembly = assemble(&curve, points, loops);
        if assembly.sections.is_empty() {
            log::debug!("track layout: zero-length rail");
            return Self::empty();
        }

        let mut layout = Self {
            curve: Some(curve),
            tilts: points.iter().map(|p| p.tilt).collect(),
            sections: assembly.sections,
            closed,
            total_length: assembly.total_length,
            unwind: if closed {
                assembly.loop_offset
            } else {
                Float3::ZERO
            },
            first_peak_progress: 0.0,
            min_height: 0.0,
            bounds: None,
        };

        let extent = Aabb::from_points(
            (0..=EXTENT_SAMPLES).map(|i| layout.position_at(i as f32 / EXTENT_SAMPLES as f32)),
        );
        layout.min_height = extent.map_or(0.0, |b| b.min.y);
        layout.bounds = extent.map(|b| b.padded(BOUNDS_PADDING));
        layout.first_peak_progress = layout.scan_first_peak();

        log::debug!(
            "track layout: {} points, {} sections ({} loops), {:.1} m, closed={}, first peak at {:.3}",
            points.len(),
            layout.sections.len(),
            layout.sections.iter().filter(|s| s.is_loop()).count(),
            layout.total_length,
            closed,
            layout.first_peak_progress
        );

        layout
    }

    pub fn from_definition(definition: &TrackDefinition) -> Self {
        Self::build(&definition.points, &definition.loops, definition.closed)
    }

    pub fn is_ready(&self) -> bool {
        !self.sections.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn sections(&self) -> &[TrackSection] {
        &self.sections
    }

    /// Meters, loops included.
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Progress of the crest the chain lift carries the train to.
    pub fn first_peak_progress(&self) -> f32 {
        self.first_peak_progress
    }

    /// Lowest rail height; the datum for potential energy.
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Rail extent padded by [`BOUNDS_PADDING`].
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Wraps (closed) or clamps (open) progress into the valid range.
    pub fn normalize_progress(&self, progress: f32) -> f32 {
        if !progress.is_finite() {
            return 0.0;
        }
        if self.closed {
            physics::wrap_progress(progress)
        } else {
            progress.clamp(0.0, 1.0)
        }
    }

    /// Index of the section owning `progress`.
    pub fn section_index_at(&self, progress: f32) -> Option<usize> {
        if self.sections.is_empty() {
            return None;
        }
        let p = self.normalize_progress(progress);
        let index = self.sections.partition_point(|s| s.end_progress <= p);
        Some(index.min(self.sections.len() - 1))
    }

    pub fn section_at(&self, progress: f32) -> Option<&TrackSection> {
        self.section_index_at(progress).map(|i| &self.sections[i])
    }

    /// Full sample: position, banked frame, curvature and grade.
    ///
    /// Returns [`TrackSample::EMPTY`] when the track is not ready.
    pub fn sample(&self, progress: f32) -> TrackSample {
        let p = self.normalize_progress(progress);
        let Some(pose) = self.pose(p) else {
            return TrackSample::EMPTY;
        };

        let curvature = self.curvature_around(p);
        TrackSample::new(
            p,
            pose.position,
            pose.frame.with_bank(pose.bank),
            curvature,
            pose.bank,
            pose.in_loop,
            pose.point_index as u32,
        )
    }

    pub fn position_at(&self, progress: f32) -> Float3 {
        self.pose(self.normalize_progress(progress))
            .map_or(Float3::ZERO, |pose| pose.position)
    }

    /// Control point nearest to `progress` (the loop's owner inside loops).
    pub fn point_index_at(&self, progress: f32) -> usize {
        self.pose(self.normalize_progress(progress))
            .map_or(0, |pose| pose.point_index)
    }

    /// Rail positions roughly `spacing` meters apart, with their progress.
    ///
    /// Closed tracks omit the sample at progress 1, which duplicates 0.
    pub fn sample_positions(&self, spacing: f32) -> Vec<(f32, Float3)> {
        if !self.is_ready() || spacing <= 0.0 {
            return Vec::new();
        }
        let count = ((self.total_length / spacing).ceil() as usize).max(2);
        let last = if self.closed { count - 1 } else { count };
        (0..=last)
            .map(|i| {
                let p = i as f32 / count as f32;
                (p, self.position_at(p))
            })
            .collect()
    }

    fn curvature_around(&self, p: f32) -> Curvature {
        if self.total_length < physics::EPSILON {
            return Curvature::ZERO;
        }
        let half = 0.5 * CURVATURE_SPAN / self.total_length;
        let (a, b) = if self.closed {
            (p - half, p + half)
        } else {
            ((p - half).max(0.0), (p + half).min(1.0))
        };

        let (Some(before), Some(after)) = (
            self.pose(self.normalize_progress(a)),
            self.pose(self.normalize_progress(b)),
        ) else {
            return Curvature::ZERO;
        };
        Curvature::from_tangents(
            before.frame.tangent,
            after.frame.tangent,
            (b - a) * self.total_length,
        )
    }

    fn pose(&self, p: f32) -> Option<Pose> {
        let curve = self.curve.as_ref()?;
        let section = self.section_at(p)?;
        let local = section.local(p);

        let mut pose = match &section.kind {
            SectionKind::Spline {
                t_start,
                t_end,
                offset,
            } => {
                let d0 = curve.distance_at(*t_start);
                let d1 = curve.distance_at(*t_end);
                let t = curve.param_at(d0 + (d1 - d0) * local);
                Pose {
                    position: curve.position(t) + *offset,
                    frame: Frame::from_tangent(curve.tangent(t)),
                    bank: self.tilt_at(curve, t),
                    in_loop: false,
                    point_index: self.nearest_point(curve, t),
                }
            }
            SectionKind::Loop {
                entry,
                element,
                arc,
            } => {
                let t = arc.param_at(local * arc.total_length());
                let point = sample_loop(entry, element, t);
                Pose {
                    position: point.position,
                    frame: Frame::from_tangent_and_up(point.tangent, point.up),
                    bank: self.tilts.get(section.point_index).copied().unwrap_or(0.0),
                    in_loop: true,
                    point_index: section.point_index,
                }
            }
        };

        if self.closed && self.unwind.magnitude() > physics::EPSILON {
            pose.position = pose.position - self.unwind * p;
            // The unwind is linear in progress, so it tilts the direction of
            // travel by a constant drift per meter.
            let tangent = pose.frame.tangent - self.unwind * (1.0 / self.total_length);
            pose.frame = if pose.in_loop {
                Frame::from_tangent_and_up(tangent, pose.frame.up)
            } else {
                Frame::from_tangent(tangent)
            };
        }
        Some(pose)
    }

    /// Tilt linearly interpolated between the control points bounding `t`.
    fn tilt_at(&self, curve: &TrackCurve, t: f32) -> f32 {
        let n = self.tilts.len();
        let segments = curve.segment_count();
        if n == 0 || segments == 0 {
            return 0.0;
        }

        let scaled = if self.closed {
            t.rem_euclid(1.0) * segments as f32
        } else {
            t.clamp(0.0, 1.0) * segments as f32
        };
        let i = scaled.floor() as usize;
        if !self.closed && i >= segments {
            return self.tilts[n - 1];
        }
        let frac = scaled - i as f32;
        let a = self.tilts[i % n];
        let b = self.tilts[(i + 1) % n];
        a + (b - a) * frac
    }

    fn nearest_point(&self, curve: &TrackCurve, t: f32) -> usize {
        let n = self.tilts.len();
        let nearest = (t.clamp(0.0, 1.0) * curve.segment_count() as f32).round() as usize;
        if self.closed {
            nearest % n
        } else {
            nearest.min(n - 1)
        }
    }

    /// Walks the first half of the track; once the rail starts climbing,
    /// returns the highest point reached before it starts to fall or enters
    /// a loop. Zero when the track descends before it climbs.
    fn scan_first_peak(&self) -> f32 {
        let mut best: Option<(f32, f32)> = None;

        for i in 0..=PEAK_SCAN_STEPS {
            let p = 0.5 * i as f32 / PEAK_SCAN_STEPS as f32;
            let Some(pose) = self.pose(p) else {
                return 0.0;
            };
            // The lift never runs through a loop
            if pose.in_loop {
                break;
            }
            let height = pose.position.y;

            match best {
                None => {
                    let rise = pose.frame.tangent.y;
                    if rise > CLIMB_THRESHOLD {
                        best = Some((p, height));
                    } else if rise < -CLIMB_THRESHOLD {
                        // Starts downhill: no lift hill
                        break;
                    }
                }
                Some((_, best_height)) => {
                    if height > best_height {
                        best = Some((p, height));
                    } else if height < best_height - DESCENT_THRESHOLD {
                        break;
                    }
                }
            }
        }

        best.map_or(0.0, |(p, _)| p)
    }
}

impl Default for TrackLayout {
    fn default() -> Self {
        Self::empty()
    }
}
