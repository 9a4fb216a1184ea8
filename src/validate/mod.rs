//! Static safety analysis of a track.
//!
//! Runs its own simulation on a fresh [`Simulator`] (chain lift forced on)
//! and inspects the geometry directly. Findings are advisory values; nothing
//! here touches a live ride.

mod issue;

pub use issue::{Issue, IssueKind, IssueLocation, Severity};

use crate::config::{RideConfig, ValidationThresholds};
use crate::ride::Simulator;
use crate::sim::{Float3, GForces};
use crate::track::{ControlPoint, LoopTable, TrackLayout};

/// Validates with the default thresholds.
pub fn validate(points: &[ControlPoint], loops: &LoopTable, closed: bool) -> Vec<Issue> {
    validate_with(points, loops, closed, &ValidationThresholds::default())
}

pub fn validate_with(
    points: &[ControlPoint],
    loops: &LoopTable,
    closed: bool,
    thresholds: &ValidationThresholds,
) -> Vec<Issue> {
    if points.len() < 2 {
        return vec![Issue::error(
            IssueKind::TooFewPoints,
            "Track needs at least 2 control points",
            IssueLocation::TRACK,
        )
        .with_value(points.len() as f32)];
    }

    let layout = TrackLayout::build(points, loops, closed);
    if !layout.is_ready() {
        return vec![Issue::error(
            IssueKind::DegenerateTrack,
            "Track has zero length",
            IssueLocation::TRACK,
        )];
    }

    let mut issues = Vec::new();
    let extremes = ride(&layout, thresholds, &mut issues);
    check_ride(&layout, &extremes, thresholds, &mut issues);
    check_heights(points, &layout, &extremes, thresholds, &mut issues);
    check_turns(points, closed, thresholds, &mut issues);
    check_grades(points, closed, thresholds, &mut issues);
    check_curvature(&layout, thresholds, &mut issues);
    check_self_intersection(&layout, thresholds, &mut issues);

    log::debug!("validation: {} issue(s)", issues.len());

    if issues.is_empty() {
        issues.push(
            Issue::info(
                IssueKind::Summary,
                format!(
                    "No issues found. Max {:.1} G, top speed {:.1} m/s",
                    extremes.max_vertical.value, extremes.max_speed.value
                ),
                IssueLocation::TRACK,
            )
            .with_value(extremes.max_vertical.value),
        );
    }
    issues
}

/// A value and the progress where it occurred.
#[derive(Debug, Clone, Copy)]
struct Extreme {
    value: f32,
    progress: f32,
}

impl Extreme {
    fn new(value: f32, progress: f32) -> Self {
        Self { value, progress }
    }

    fn raise(&mut self, value: f32, progress: f32) {
        if value > self.value {
            *self = Self::new(value, progress);
        }
    }

    fn lower(&mut self, value: f32, progress: f32) {
        if value < self.value {
            *self = Self::new(value, progress);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RideExtremes {
    max_vertical: Extreme,
    min_vertical: Extreme,
    /// Absolute.
    max_lateral: Extreme,
    max_speed: Extreme,
    min_speed: Extreme,
    min_height: Extreme,
    stall: Option<Extreme>,
}

impl RideExtremes {
    fn new() -> Self {
        Self {
            max_vertical: Extreme::new(f32::MIN, 0.0),
            min_vertical: Extreme::new(f32::MAX, 0.0),
            max_lateral: Extreme::new(0.0, 0.0),
            max_speed: Extreme::new(0.0, 0.0),
            min_speed: Extreme::new(f32::MAX, 0.0),
            min_height: Extreme::new(f32::MAX, 0.0),
            stall: None,
        }
    }

    fn record(&mut self, g: GForces, speed: f32, position: Float3, progress: f32, grace: f32, stall_speed: f32) {
        self.max_vertical.raise(g.vertical, progress);
        self.min_vertical.lower(g.vertical, progress);
        self.max_lateral.raise(g.lateral.abs(), progress);
        self.max_speed.raise(speed, progress);
        self.min_speed.lower(speed, progress);
        self.min_height.lower(position.y, progress);
        if self.stall.is_none() && progress > grace && speed < stall_speed {
            self.stall = Some(Extreme::new(speed, progress));
        }
    }
}

/// Rides the track once and records raw extremes.
fn ride(layout: &TrackLayout, thresholds: &ValidationThresholds, issues: &mut Vec<Issue>) -> RideExtremes {
    let config = RideConfig {
        has_chain_lift: true,
        ..RideConfig::default()
    };
    let mut simulator = Simulator::with_track(layout.clone(), config);
    let mut extremes = RideExtremes::new();

    let record = |extremes: &mut RideExtremes, simulator: &Simulator| {
        let state = simulator.state();
        extremes.record(
            state.raw_g_forces,
            state.speed,
            state.position,
            state.progress,
            thresholds.stall_grace_progress,
            thresholds.stall_speed,
        );
    };
    record(&mut extremes, &simulator);

    let mut finished = false;
    for _ in 0..thresholds.max_iterations {
        simulator.step(thresholds.time_step);
        let state = simulator.state();
        if layout.is_closed() && state.laps > 0 {
            finished = true;
            break;
        }
        record(&mut extremes, &simulator);
        if state.complete {
            finished = true;
            break;
        }
    }

    if !finished {
        let progress = simulator.state().progress;
        issues.push(
            Issue::warning(
                IssueKind::IncompleteSimulation,
                format!(
                    "Simulation stopped after {} steps at {:.0}% of the track",
                    thresholds.max_iterations,
                    progress * 100.0
                ),
                IssueLocation::along(progress, layout.point_index_at(progress)),
            )
            .with_value(progress),
        );
    }
    extremes
}

fn at(layout: &TrackLayout, extreme: &Extreme) -> IssueLocation {
    IssueLocation::along(extreme.progress, layout.point_index_at(extreme.progress))
}

fn check_ride(
    layout: &TrackLayout,
    extremes: &RideExtremes,
    thresholds: &ValidationThresholds,
    issues: &mut Vec<Issue>,
) {
    let vertical = &extremes.max_vertical;
    if vertical.value > thresholds.vertical_g_error {
        issues.push(
            Issue::error(
                IssueKind::HighVerticalG,
                format!("Dangerous vertical force: {:.1} G", vertical.value),
                at(layout, vertical),
            )
            .with_value(vertical.value),
        );
    } else if vertical.value > thresholds.vertical_g_warning {
        issues.push(
            Issue::warning(
                IssueKind::HighVerticalG,
                format!("High vertical force: {:.1} G", vertical.value),
                at(layout, vertical),
            )
            .with_value(vertical.value),
        );
    }

    let negative = &extremes.min_vertical;
    if negative.value < thresholds.negative_g_warning {
        issues.push(
            Issue::warning(
                IssueKind::StrongAirtime,
                format!("Strong airtime: {:.1} G", negative.value),
                at(layout, negative),
            )
            .with_value(negative.value),
        );
    }

    let lateral = &extremes.max_lateral;
    if lateral.value > thresholds.lateral_g_error {
        issues.push(
            Issue::error(
                IssueKind::HighLateralG,
                format!("Dangerous lateral force: {:.1} G", lateral.value),
                at(layout, lateral),
            )
            .with_value(lateral.value),
        );
    } else if lateral.value > thresholds.lateral_g_warning {
        issues.push(
            Issue::warning(
                IssueKind::HighLateralG,
                format!("High lateral force: {:.1} G, consider banking", lateral.value),
                at(layout, lateral),
            )
            .with_value(lateral.value),
        );
    }

    let speed = &extremes.max_speed;
    if speed.value > thresholds.max_speed_warning {
        issues.push(
            Issue::warning(
                IssueKind::HighSpeed,
                format!("Very high speed: {:.1} m/s", speed.value),
                at(layout, speed),
            )
            .with_value(speed.value),
        );
    }

    if let Some(stall) = &extremes.stall {
        issues.push(
            Issue::error(
                IssueKind::Stall,
                format!(
                    "Train may stall: {:.2} m/s at {:.0}% of the track",
                    stall.value,
                    stall.progress * 100.0
                ),
                at(layout, stall),
            )
            .with_value(stall.value),
        );
    }
}

/// Control points too close to the ground, then the rail between them.
fn check_heights(
    points: &[ControlPoint],
    layout: &TrackLayout,
    extremes: &RideExtremes,
    thresholds: &ValidationThresholds,
    issues: &mut Vec<Issue>,
) {
    let mut flagged = false;
    for (index, point) in points.iter().enumerate() {
        let height = point.position.y;
        if height < thresholds.min_height {
            flagged = true;
            issues.push(
                Issue::error(
                    IssueKind::LowHeight,
                    format!("Point is {height:.2} m high, underground or too close to ground"),
                    IssueLocation::point(index),
                )
                .with_value(height),
            );
        }
    }

    let lowest = &extremes.min_height;
    if !flagged && lowest.value < thresholds.min_height {
        issues.push(
            Issue::error(
                IssueKind::LowHeight,
                format!(
                    "Rail dips to {:.2} m, underground or too close to ground",
                    lowest.value
                ),
                at(layout, lowest),
            )
            .with_value(lowest.value),
        );
    }
}

/// Direction change at each control point between its neighbours.
fn check_turns(
    points: &[ControlPoint],
    closed: bool,
    thresholds: &ValidationThresholds,
    issues: &mut Vec<Issue>,
) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let indices: Box<dyn Iterator<Item = usize>> = if closed {
        Box::new(0..n)
    } else {
        Box::new(1..n - 1)
    };

    for i in indices {
        let prev = points[(i + n - 1) % n].position;
        let curr = points[i].position;
        let next = points[(i + 1) % n].position;

        let incoming = (curr - prev).normalize();
        let outgoing = (next - curr).normalize();
        if incoming == Float3::ZERO || outgoing == Float3::ZERO {
            continue;
        }

        let angle = incoming.dot(outgoing).clamp(-1.0, 1.0).acos().to_degrees();
        if angle > thresholds.turn_angle_error {
            issues.push(
                Issue::error(
                    IssueKind::SharpTurn,
                    format!("Turn of {angle:.0}\u{b0} is too sharp"),
                    IssueLocation::point(i),
                )
                .with_value(angle),
            );
        } else if angle > thresholds.turn_angle_warning {
            issues.push(
                Issue::warning(
                    IssueKind::SharpTurn,
                    format!("Sharp turn of {angle:.0}\u{b0}"),
                    IssueLocation::point(i),
                )
                .with_value(angle),
            );
        }
    }
}

/// Rise over run between consecutive control points.
fn check_grades(
    points: &[ControlPoint],
    closed: bool,
    thresholds: &ValidationThresholds,
    issues: &mut Vec<Issue>,
) {
    let n = points.len();
    let segments = if closed { n } else { n - 1 };

    for i in 0..segments {
        let a = points[i].position;
        let b = points[(i + 1) % n].position;
        let rise = (b.y - a.y).abs();
        let run = ((b.x - a.x).powi(2) + (b.z - a.z).powi(2)).sqrt();
        if rise < f32::EPSILON {
            continue;
        }

        let grade = if run < f32::EPSILON {
            f32::INFINITY
        } else {
            100.0 * rise / run
        };
        if grade > thresholds.grade_warning {
            let message = if grade.is_finite() {
                format!("Steep grade of {grade:.0}%")
            } else {
                "Vertical segment".to_string()
            };
            issues.push(
                Issue::warning(IssueKind::SteepGrade, message, IssueLocation::point(i))
                    .with_value(grade.min(f32::MAX)),
            );
        }
    }
}

/// Tightest bend on spline rail; loop radii are user-chosen and exempt.
fn check_curvature(layout: &TrackLayout, thresholds: &ValidationThresholds, issues: &mut Vec<Issue>) {
    let samples = (layout.total_length().ceil() as usize).max(2);
    let tightest = (0..=samples)
        .map(|i| layout.sample(i as f32 / samples as f32))
        .filter(|sample| !sample.in_loop)
        .max_by(|a, b| a.curvature.total_cmp(&b.curvature));

    let Some(sample) = tightest else {
        return;
    };
    let location = IssueLocation::along(sample.progress, sample.point_index as usize);
    let radius = 1.0 / sample.curvature;

    if sample.curvature > thresholds.curvature_error {
        issues.push(
            Issue::error(
                IssueKind::TightRadius,
                format!("Curve radius of {radius:.1} m is too tight"),
                location,
            )
            .with_value(sample.curvature),
        );
    } else if sample.curvature > thresholds.curvature_warning {
        issues.push(
            Issue::warning(
                IssueKind::TightRadius,
                format!("Tight curve radius of {radius:.1} m"),
                location,
            )
            .with_value(sample.curvature),
        );
    }
}

/// Coarse check: rail samples far apart along the track but close in space.
fn check_self_intersection(
    layout: &TrackLayout,
    thresholds: &ValidationThresholds,
    issues: &mut Vec<Issue>,
) {
    let samples = layout.sample_positions(thresholds.intersection_spacing);
    let total = layout.total_length();

    for (i, &(progress_a, a)) in samples.iter().enumerate() {
        for &(progress_b, b) in &samples[i + 1..] {
            let mut along = (progress_b - progress_a) * total;
            if layout.is_closed() {
                along = along.min(total - along);
            }
            if along <= thresholds.intersection_min_separation {
                continue;
            }

            let gap = a.distance(b);
            if gap < thresholds.intersection_distance {
                issues.push(
                    Issue::warning(
                        IssueKind::SelfIntersection,
                        format!("Track passes within {gap:.1} m of itself"),
                        IssueLocation::along(progress_a, layout.point_index_at(progress_a)),
                    )
                    .with_value(gap),
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::LoopElement;

    fn points(raw: &[(f32, f32, f32)]) -> Vec<ControlPoint> {
        raw.iter().map(|&(x, y, z)| ControlPoint::at(x, y, z)).collect()
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    fn gentle() -> Vec<ControlPoint> {
        points(&[
            (0.0, 5.0, 0.0),
            (30.0, 15.0, 0.0),
            (60.0, 8.0, 0.0),
            (90.0, 6.0, 0.0),
            (120.0, 6.0, 0.0),
        ])
    }

    #[test]
    fn too_few_points_is_single_error() {
        let issues = validate(&points(&[(0.0, 5.0, 0.0)]), &LoopTable::new(), false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].kind, IssueKind::TooFewPoints);
    }

    #[test]
    fn zero_length_track_is_error() {
        let issues = validate(&points(&[(1.0, 5.0, 1.0), (1.0, 5.0, 1.0)]), &LoopTable::new(), false);
        assert_eq!(kinds(&issues), vec![IssueKind::DegenerateTrack]);
    }

    #[test]
    fn gentle_track_gets_summary_only() {
        let issues = validate(&gentle(), &LoopTable::new(), false);
        assert_eq!(issues.len(), 1, "{issues:?}");
        assert_eq!(issues[0].severity, Severity::Info);
        assert_eq!(issues[0].kind, IssueKind::Summary);
        assert!(issues[0].message.contains("top speed"));
    }

    #[test]
    fn low_point_is_error_at_its_index() {
        let mut track = gentle();
        track[3].position.y = 0.1;
        let issues = validate(&track, &LoopTable::new(), false);

        let low = issues
            .iter()
            .find(|i| i.kind == IssueKind::LowHeight)
            .expect("low height issue");
        assert_eq!(low.severity, Severity::Error);
        assert_eq!(low.location.point_index, Some(3));
        assert!(low.message.contains("ground"));
    }

    #[test]
    fn right_angle_hairpin_is_sharp_turn_error() {
        let track = points(&[(0.0, 5.0, 0.0), (20.0, 5.0, 0.0), (0.0, 5.0, 3.0)]);
        let issues = validate(&track, &LoopTable::new(), false);
        let turn = issues
            .iter()
            .find(|i| i.kind == IssueKind::SharpTurn)
            .expect("sharp turn issue");
        assert_eq!(turn.severity, Severity::Error);
        assert_eq!(turn.location.point_index, Some(1));
    }

    #[test]
    fn seventy_degree_turn_is_warning() {
        let angle = 70f32.to_radians();
        let track = points(&[
            (0.0, 5.0, 0.0),
            (40.0, 5.0, 0.0),
            (40.0 + 40.0 * angle.cos(), 5.0, 40.0 * angle.sin()),
        ]);
        let issues = validate(&track, &LoopTable::new(), false);
        let turn = issues
            .iter()
            .find(|i| i.kind == IssueKind::SharpTurn)
            .expect("sharp turn issue");
        assert_eq!(turn.severity, Severity::Warning);
    }

    #[test]
    fn steep_segment_is_grade_warning() {
        let track = points(&[(0.0, 5.0, 0.0), (10.0, 25.0, 0.0), (40.0, 25.0, 0.0)]);
        let issues = validate(&track, &LoopTable::new(), false);
        let grade = issues
            .iter()
            .find(|i| i.kind == IssueKind::SteepGrade)
            .expect("grade issue");
        assert_eq!(grade.severity, Severity::Warning);
        assert_eq!(grade.location.point_index, Some(0));
        assert!(grade.value.unwrap() > 100.0);
    }

    #[test]
    fn uphill_without_enough_energy_stalls() {
        // Lift crest at 10 m, then a 30 m wall the train cannot climb
        let track = points(&[
            (0.0, 2.0, 0.0),
            (30.0, 10.0, 0.0),
            (60.0, 4.0, 0.0),
            (100.0, 30.0, 0.0),
            (140.0, 30.0, 0.0),
        ]);
        let issues = validate(&track, &LoopTable::new(), false);
        assert!(
            issues
                .iter()
                .any(|i| i.kind == IssueKind::Stall && i.severity == Severity::Error),
            "{issues:?}"
        );
    }

    #[test]
    fn iteration_cap_reports_incomplete_simulation() {
        let thresholds = ValidationThresholds {
            max_iterations: 10,
            ..ValidationThresholds::default()
        };
        let issues = validate_with(&gentle(), &LoopTable::new(), false, &thresholds);
        assert!(kinds(&issues).contains(&IssueKind::IncompleteSimulation));
    }

    #[test]
    fn crossing_track_is_flagged() {
        // Figure eight at one height
        let track = points(&[
            (0.0, 8.0, 0.0),
            (40.0, 8.0, 40.0),
            (80.0, 8.0, 0.0),
            (40.0, 8.0, -40.0),
            (0.0, 8.0, 40.0),
            (-40.0, 8.0, 0.0),
        ]);
        let issues = validate(&track, &LoopTable::new(), false);
        assert!(kinds(&issues).contains(&IssueKind::SelfIntersection));
    }

    #[test]
    fn loop_is_not_flagged_as_tight_or_intersecting() {
        let mut track = points(&[
            (0.0, 20.0, 0.0),
            (30.0, 5.0, 0.0),
            (60.0, 5.0, 0.0),
            (100.0, 5.0, 0.0),
        ]);
        track[2].has_loop = true;
        let mut loops = LoopTable::new();
        loops.insert(2, LoopElement::new(6.0, 12.0));

        let issues = validate(&track, &loops, false);
        assert!(!kinds(&issues).contains(&IssueKind::TightRadius));
        assert!(!kinds(&issues).contains(&IssueKind::SelfIntersection));
    }

    #[test]
    fn validation_does_not_depend_on_live_ride() {
        let track = gentle();
        let mut live = Simulator::with_track(
            TrackLayout::build(&track, &LoopTable::new(), false),
            RideConfig::default(),
        );
        live.step(0.05);
        let before = *live.state();

        let first = validate(&track, &LoopTable::new(), false);
        let second = validate(&track, &LoopTable::new(), false);
        assert_eq!(first, second);
        assert_eq!(*live.state(), before);
    }
}
