use crate::sim::{physics, Float3, Frame};

use super::arc::ArcTable;
use super::control_point::{resolve_loop, ControlPoint, LoopTable};
use super::loop_element::{LoopElement, LoopEntry};
use super::spline::TrackCurve;

/// Spline pieces shorter than this are dropped (loops at the open ends).
const MIN_SECTION_LENGTH: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub enum SectionKind {
    /// Sub-range `[t_start, t_end]` of the spline, translated by the forward
    /// displacement of every loop before it.
    Spline {
        t_start: f32,
        t_end: f32,
        offset: Float3,
    },
    /// One full rotation of a loop element.
    Loop {
        entry: LoopEntry,
        element: LoopElement,
        arc: ArcTable,
    },
}

/// A contiguous piece of the assembled track owning `[start_progress, end_progress)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSection {
    pub kind: SectionKind,
    /// Control point the section follows (the loop's owner for loops).
    pub point_index: usize,
    pub start_progress: f32,
    pub end_progress: f32,
    /// Arc length, meters.
    pub length: f32,
}

impl TrackSection {
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, SectionKind::Loop { .. })
    }

    pub fn span(&self) -> f32 {
        self.end_progress - self.start_progress
    }

    pub fn contains(&self, progress: f32) -> bool {
        progress >= self.start_progress && progress < self.end_progress
    }

    /// Fraction of this section covered at global `progress`, in `[0, 1]`.
    pub fn local(&self, progress: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        ((progress - self.start_progress) / span).clamp(0.0, 1.0)
    }
}

/// Output of section assembly.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assembly {
    pub sections: Vec<TrackSection>,
    pub total_length: f32,
    /// Net forward displacement of all loops.
    pub loop_offset: Float3,
}

impl Assembly {
    fn empty() -> Self {
        Self {
            sections: Vec::new(),
            total_length: 0.0,
            loop_offset: Float3::ZERO,
        }
    }
}

/// Stitches spline pieces and loop elements into an ordered section list.
///
/// Returns an empty list when the points do not form a curve.
pub fn build_sections(
    points: &[ControlPoint],
    loops: &LoopTable,
    closed: bool,
) -> Vec<TrackSection> {
    let positions = points.iter().map(|p| p.position).collect();
    match TrackCurve::new(positions, closed) {
        Some(curve) => assemble(&curve, points, loops).sections,
        None => Vec::new(),
    }
}

pub(crate) fn assemble(
    curve: &TrackCurve,
    points: &[ControlPoint],
    loops: &LoopTable,
) -> Assembly {
    let mut pieces: Vec<(SectionKind, usize, f32)> = Vec::new();
    let mut offset = Float3::ZERO;
    let mut t_cursor = 0.0;
    let mut owner = 0usize;

    for index in 0..points.len() {
        let Some(element) = resolve_loop(points, loops, index) else {
            continue;
        };

        let t_loop = curve.param_of_point(index);
        push_spline(&mut pieces, curve, t_cursor, t_loop, offset, owner);

        let entry = LoopEntry::new(
            curve.position(t_loop) + offset,
            Frame::from_tangent(curve.tangent(t_loop)),
        );
        let arc = element.arc_table();
        let length = arc.total_length();
        offset += entry.frame.tangent * element.pitch;

        pieces.push((
            SectionKind::Loop {
                entry,
                element,
                arc,
            },
            index,
            length,
        ));

        t_cursor = t_loop;
        owner = index;
    }
    push_spline(&mut pieces, curve, t_cursor, 1.0, offset, owner);

    let total_length: f32 = pieces.iter().map(|(_, _, length)| *length).sum();
    if total_length < physics::EPSILON {
        return Assembly::empty();
    }

    let count = pieces.len();
    let mut sections = Vec::with_capacity(count);
    let mut cumulative = 0.0;
    let mut start_progress = 0.0;

    for (i, (kind, point_index, length)) in pieces.into_iter().enumerate() {
        cumulative += length;
        let end_progress = if i + 1 == count {
            1.0
        } else {
            (cumulative / total_length).min(1.0)
        };

        sections.push(TrackSection {
            kind,
            point_index,
            start_progress,
            end_progress,
            length,
        });
        start_progress = end_progress;
    }

    Assembly {
        sections,
        total_length,
        loop_offset: offset,
    }
}

fn push_spline(
    pieces: &mut Vec<(SectionKind, usize, f32)>,
    curve: &TrackCurve,
    t_start: f32,
    t_end: f32,
    offset: Float3,
    owner: usize,
) {
    let length = curve.distance_at(t_end) - curve.distance_at(t_start);
    if length <= MIN_SECTION_LENGTH {
        return;
    }
    pieces.push((
        SectionKind::Spline {
            t_start,
            t_end,
            offset,
        },
        owner,
        length,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn straight_with_loop() -> (Vec<ControlPoint>, LoopTable) {
        let points = vec![
            ControlPoint::at(0.0, 5.0, 0.0),
            ControlPoint::at(30.0, 5.0, 0.0).with_loop(),
            ControlPoint::at(60.0, 5.0, 0.0),
        ];
        let mut loops = LoopTable::new();
        loops.insert(1, LoopElement::new(5.0, 12.0));
        (points, loops)
    }

    fn assert_contiguous(sections: &[TrackSection]) {
        assert!(!sections.is_empty());
        assert_eq!(sections[0].start_progress, 0.0);
        assert_eq!(sections[sections.len() - 1].end_progress, 1.0);
        for pair in sections.windows(2) {
            assert_eq!(pair[0].end_progress, pair[1].start_progress);
        }
        for section in sections {
            assert!(section.end_progress >= section.start_progress);
        }
    }

    #[test]
    fn too_few_points_yield_no_sections() {
        assert!(build_sections(&[], &LoopTable::new(), false).is_empty());
        let single = [ControlPoint::at(0.0, 5.0, 0.0)];
        assert!(build_sections(&single, &LoopTable::new(), true).is_empty());
    }

    #[test]
    fn coincident_points_yield_no_sections() {
        let points = [ControlPoint::at(1.0, 5.0, 1.0), ControlPoint::at(1.0, 5.0, 1.0)];
        assert!(build_sections(&points, &LoopTable::new(), false).is_empty());
    }

    #[test]
    fn plain_track_is_one_spline_section() {
        let points = [ControlPoint::at(0.0, 5.0, 0.0), ControlPoint::at(50.0, 5.0, 0.0)];
        let sections = build_sections(&points, &LoopTable::new(), false);

        assert_eq!(sections.len(), 1);
        assert!(!sections[0].is_loop());
        assert_contiguous(&sections);
        assert_relative_eq!(sections[0].length, 50.0, epsilon = 1e-2);
    }

    #[test]
    fn loop_splits_track_into_spline_loop_spline() {
        let (points, loops) = straight_with_loop();
        let sections = build_sections(&points, &loops, false);

        assert_eq!(sections.len(), 3);
        assert!(!sections[0].is_loop());
        assert!(sections[1].is_loop());
        assert!(!sections[2].is_loop());
        assert_eq!(sections[1].point_index, 1);
        assert_contiguous(&sections);

        let loop_length = LoopElement::new(5.0, 12.0).arc_length();
        let total: f32 = sections.iter().map(|s| s.length).sum();
        assert_relative_eq!(sections[1].length, loop_length, epsilon = 1e-4);
        assert_relative_eq!(sections[1].span(), loop_length / total, epsilon = 1e-5);
        assert_relative_eq!(total, 60.0 + loop_length, epsilon = 0.05);
    }

    #[test]
    fn spline_after_loop_is_shifted_by_pitch() {
        let (points, loops) = straight_with_loop();
        let sections = build_sections(&points, &loops, false);

        let SectionKind::Spline { offset, .. } = sections[2].kind else {
            panic!("expected spline section");
        };
        assert_relative_eq!(offset.x, 12.0, epsilon = 1e-4);
        assert_relative_eq!(offset.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn loop_flag_without_table_entry_uses_default_element() {
        let points = vec![
            ControlPoint::at(0.0, 5.0, 0.0),
            ControlPoint::at(30.0, 5.0, 0.0).with_loop(),
            ControlPoint::at(60.0, 5.0, 0.0),
        ];
        let sections = build_sections(&points, &LoopTable::new(), false);

        let SectionKind::Loop { element, .. } = &sections[1].kind else {
            panic!("expected loop section");
        };
        assert_eq!(*element, LoopElement::default());
    }

    #[test]
    fn table_entry_without_flag_is_ignored() {
        let points = vec![ControlPoint::at(0.0, 5.0, 0.0), ControlPoint::at(30.0, 5.0, 0.0)];
        let mut loops = LoopTable::new();
        loops.insert(0, LoopElement::default());
        assert_eq!(build_sections(&points, &loops, false).len(), 1);
    }

    #[test]
    fn loop_at_open_end_drops_empty_spline() {
        let points = vec![
            ControlPoint::at(0.0, 5.0, 0.0),
            ControlPoint::at(30.0, 5.0, 0.0).with_loop(),
        ];
        let sections = build_sections(&points, &LoopTable::new(), false);
        assert_eq!(sections.len(), 2);
        assert!(sections[1].is_loop());
        assert_contiguous(&sections);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let (points, loops) = straight_with_loop();
        let first = build_sections(&points, &loops, true);
        let second = build_sections(&points, &loops, true);
        assert_eq!(first, second);
    }

    fn arbitrary_track() -> impl Strategy<Value = (Vec<ControlPoint>, LoopTable, bool)> {
        (
            prop::collection::vec(
                (-80.0f32..80.0, 1.0f32..40.0, -80.0f32..80.0, -0.7f32..0.7, any::<bool>()),
                2..8,
            ),
            any::<bool>(),
        )
            .prop_map(|(raw, closed)| {
                let points: Vec<ControlPoint> = raw
                    .iter()
                    .map(|&(x, y, z, tilt, has_loop)| {
                        let point = ControlPoint::at(x, y, z).with_tilt(tilt);
                        if has_loop {
                            point.with_loop()
                        } else {
                            point
                        }
                    })
                    .collect();
                (points, LoopTable::new(), closed)
            })
    }

    proptest! {
        #[test]
        fn sections_cover_unit_interval_exactly((points, loops, closed) in arbitrary_track()) {
            let sections = build_sections(&points, &loops, closed);
            prop_assume!(!sections.is_empty());

            prop_assert_eq!(sections[0].start_progress, 0.0);
            prop_assert_eq!(sections[sections.len() - 1].end_progress, 1.0);

            for i in 0..1000 {
                let p = i as f32 / 1000.0;
                let owners = sections.iter().filter(|s| s.contains(p)).count();
                prop_assert_eq!(owners, 1, "progress {} owned by {} sections", p, owners);
            }
        }

        #[test]
        fn rebuild_matches_for_arbitrary_tracks((points, loops, closed) in arbitrary_track()) {
            prop_assert_eq!(
                build_sections(&points, &loops, closed),
                build_sections(&points, &loops, closed)
            );
        }
    }
}
