//! Command-line ride report.
//!
//! `coaster-ride [track.json] [config.json]`
//!
//! Validates the track, rides it once at 60 Hz and prints the extremes.
//! Without arguments a built-in demo track with one loop is used.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = native::run(std::env::args().skip(1).collect()) {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven from the host on wasm; nothing to run here.
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;

    use coaster_engine::sim::Float3;
    use coaster_engine::{
        validate, ControlPoint, LoopElement, LoopTable, RideConfig, Severity, Simulator,
        TrackDefinition, TrackLayout,
    };

    const FRAME: f32 = 1.0 / 60.0;
    const MAX_FRAMES: usize = 36_000;

    pub fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
        let definition = match args.first() {
            Some(path) => {
                log::info!("loading track from {path}");
                TrackDefinition::from_json(&std::fs::read_to_string(path)?)?
            }
            None => demo_track(),
        };
        let config = match args.get(1) {
            Some(path) => RideConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => RideConfig::default(),
        };

        report_issues(&definition);

        let layout = TrackLayout::from_definition(&definition);
        if !layout.is_ready() {
            return Err("track needs at least two distinct control points".into());
        }
        println!(
            "\nTrack: {:.1} m, {} sections, lift crest at {:.1}%",
            layout.total_length(),
            layout.sections().len(),
            layout.first_peak_progress() * 100.0
        );

        ride(Simulator::with_track(layout, config));
        Ok(())
    }

    fn report_issues(definition: &TrackDefinition) {
        let issues = validate(&definition.points, &definition.loops, definition.closed);
        let errors = issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count();
        println!("Validation: {} findings, {errors} errors", issues.len());
        for issue in &issues {
            println!("  {issue}");
        }
    }

    fn ride(mut sim: Simulator) {
        let mut max_speed = 0.0f32;
        let mut max_vertical = f32::MIN;
        let mut min_vertical = f32::MAX;
        let mut max_lateral = 0.0f32;
        let mut airtime = 0.0f32;
        let mut frames = 0;

        while frames < MAX_FRAMES {
            let state = *sim.step(FRAME);
            frames += 1;

            max_speed = max_speed.max(state.speed);
            max_vertical = max_vertical.max(state.raw_g_forces.vertical);
            min_vertical = min_vertical.min(state.raw_g_forces.vertical);
            max_lateral = max_lateral.max(state.raw_g_forces.lateral.abs());
            if state.airtime {
                airtime += FRAME;
            }
            if state.complete || state.laps > 0 {
                break;
            }
        }

        let state = sim.state();
        println!(
            "Ride: {:.1} s, {:.1} m travelled, {} laps",
            state.elapsed, state.distance, state.laps
        );
        println!(
            "  top speed {:.1} m/s ({:.0} km/h)",
            max_speed,
            max_speed * 3.6
        );
        println!(
            "  vertical G {:.2} .. {:.2}, lateral G {:.2}",
            min_vertical, max_vertical, max_lateral
        );
        println!("  airtime {airtime:.1} s");
        if frames == MAX_FRAMES {
            log::warn!("ride did not finish within {MAX_FRAMES} frames");
        }
    }

    fn demo_track() -> TrackDefinition {
        let points = vec![
            ControlPoint::new(Float3::new(0.0, 5.0, 0.0)),
            ControlPoint::new(Float3::new(30.0, 30.0, 0.0)),
            ControlPoint::new(Float3::new(60.0, 6.0, 0.0)),
            ControlPoint::new(Float3::new(90.0, 6.0, 0.0)).with_loop(),
            ControlPoint::new(Float3::new(130.0, 12.0, 20.0)).with_tilt(0.4),
            ControlPoint::new(Float3::new(160.0, 5.0, 40.0)),
        ];
        let mut loops = LoopTable::new();
        loops.insert(3, LoopElement::new(7.0, 12.0));
        TrackDefinition::new(points, loops, false)
    }
}
