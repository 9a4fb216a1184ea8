use crate::config::RideConfig;
use crate::sim::{physics, Float3, GForces};
use crate::track::{TrackDefinition, TrackLayout, TrackSample};

use super::smoothing::GForceSmoother;
use super::state::{Energy, SimulationState};

/// Open tracks finish once progress reaches this.
pub const COMPLETION_PROGRESS: f32 = 0.99;

/// Drives one train along a [`TrackLayout`].
///
/// Chain lift while `progress < first_peak_progress`, free running otherwise.
/// Speed integrates with semi-implicit Euler over fixed substeps; total energy
/// is held to a non-increasing budget outside the lift.
#[derive(Debug, Clone)]
pub struct Simulator {
    layout: TrackLayout,
    config: RideConfig,
    state: SimulationState,
    /// Highest total energy the train may hold while free running.
    energy_budget: f32,
    /// Arc length travelled along the current lap. Progress, distance and
    /// laps are all derived from it.
    lap_distance: f64,
    smoother: GForceSmoother,
}

impl Simulator {
    /// Simulator without a track; `step` is a no-op until one is set.
    pub fn new(config: RideConfig) -> Self {
        Self::with_track(TrackLayout::empty(), config)
    }

    pub fn with_track(layout: TrackLayout, config: RideConfig) -> Self {
        let smoother = GForceSmoother::new(config.smoothing_window);
        let mut simulator = Self {
            layout,
            config,
            state: SimulationState::default(),
            energy_budget: 0.0,
            lap_distance: 0.0,
            smoother,
        };
        simulator.reset();
        simulator
    }

    /// Replaces the track and restarts the ride.
    pub fn set_track(&mut self, layout: TrackLayout) {
        self.layout = layout;
        self.reset();
    }

    pub fn load(&mut self, definition: &TrackDefinition) {
        self.set_track(TrackLayout::from_definition(definition));
    }

    pub fn track(&self) -> &TrackLayout {
        &self.layout
    }

    pub fn config(&self) -> &RideConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn sample(&self, progress: f32) -> TrackSample {
        self.layout.sample(progress)
    }

    /// Back to the start at the configured initial speed.
    pub fn reset(&mut self) {
        let speed = self
            .config
            .initial_speed
            .clamp(physics::MIN_SPEED, physics::MAX_SPEED);
        self.smoother.clear();
        self.lap_distance = 0.0;
        self.state = SimulationState {
            speed,
            previous_speed: speed,
            ..SimulationState::default()
        };
        self.refresh(0.0, false);
        self.energy_budget = self.state.energy.total;
    }

    /// Moves the train without simulating the path between.
    pub fn set_progress(&mut self, progress: f32) {
        if !self.layout.is_ready() {
            return;
        }
        let progress = self.layout.normalize_progress(progress);
        self.lap_distance = f64::from(progress) * f64::from(self.layout.total_length());
        self.sync_travel();
        self.state.complete = !self.layout.is_closed() && progress >= COMPLETION_PROGRESS;
        self.smoother.clear();
        self.refresh(0.0, false);
        self.energy_budget = self.state.energy.total;
    }

    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            log::warn!("ignoring non-finite speed {speed}");
            return;
        }
        let speed = speed.clamp(physics::MIN_SPEED, physics::MAX_SPEED);
        self.state.speed = speed;
        self.state.previous_speed = speed;
        self.refresh(0.0, false);
        self.energy_budget = self.state.energy.total;
    }

    pub fn set_chain_lift(&mut self, enabled: bool) {
        self.config.has_chain_lift = enabled;
        self.state.on_chain_lift = self.chain_lift_active(self.state.progress);
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.config.speed_multiplier = multiplier;
    }

    /// Advances the ride by `dt` wall-clock seconds.
    ///
    /// `dt` is capped at `max_step` and scaled by the playback multiplier.
    /// Non-finite or non-positive `dt`, a missing track, or a finished ride
    /// leave the state untouched.
    pub fn step(&mut self, dt: f32) -> &SimulationState {
        if !self.layout.is_ready() || self.state.complete {
            return &self.state;
        }
        if !dt.is_finite() {
            log::warn!("ignoring non-finite time step {dt}");
            return &self.state;
        }
        if dt <= 0.0 {
            return &self.state;
        }

        let multiplier = self.config.effective_multiplier();
        let frame_dt = dt.min(self.config.max_step) * multiplier;
        if frame_dt <= 0.0 {
            return &self.state;
        }

        let substeps = self
            .config
            .effective_substeps()
            .saturating_mul((multiplier.ceil() as u32).max(1));
        let h = frame_dt / substeps as f32;

        self.state.previous_speed = self.state.speed;
        let mut braking = false;
        let mut simulated = 0.0;
        for _ in 0..substeps {
            braking |= self.substep(h);
            simulated += h;
            if self.state.complete {
                break;
            }
        }

        let acceleration = (self.state.speed - self.state.previous_speed) / simulated;
        self.refresh(acceleration, braking);
        &self.state
    }

    fn chain_lift_active(&self, progress: f32) -> bool {
        self.config.has_chain_lift && progress < self.layout.first_peak_progress()
    }

    fn height_above_datum(&self, progress: f32) -> f32 {
        self.layout.position_at(progress).y - self.layout.min_height()
    }

    /// One integration substep; returns whether the train was braked.
    fn substep(&mut self, h: f32) -> bool {
        let mass = self.config.mass;
        let on_chain = self.chain_lift_active(self.state.progress);
        let tangent = self.layout.sample(self.state.progress).tangent;
        let mut speed = self.state.speed;
        let mut braking = false;

        if on_chain {
            let target = self.config.chain_lift_speed;
            let max_delta = self.config.chain_lift_acceleration * h;
            braking = speed > target;
            speed += (target - speed).clamp(-max_delta, max_delta);
        } else {
            let gravity = -physics::G * tangent.y;
            let drag = self.config.drag_coefficient * speed * speed;
            let normal = (tangent.x * tangent.x + tangent.z * tangent.z).sqrt();
            let friction = self.config.rolling_friction * physics::G * normal;
            speed += (gravity - drag - friction) * h;
        }

        if speed > physics::MAX_SPEED {
            log::trace!("speed {speed:.2} clamped to {}", physics::MAX_SPEED);
            braking = true;
        }
        speed = speed.clamp(physics::MIN_SPEED, physics::MAX_SPEED);

        self.advance(speed * h);
        self.state.elapsed += h;

        let height = self.height_above_datum(self.state.progress);
        let current = physics::kinetic_energy(mass, speed) + physics::potential_energy(mass, height);

        if on_chain {
            self.energy_budget = current;
        } else if current > self.energy_budget * (1.0 + physics::ENERGY_TOLERANCE) {
            let corrected = physics::speed_from_energy(mass, self.energy_budget, height)
                .max(physics::MIN_SPEED);
            log::trace!(
                "energy {current:.1} J over budget {:.1} J, speed {speed:.3} -> {corrected:.3}",
                self.energy_budget
            );
            speed = corrected;
        }

        self.state.speed = speed;
        let settled = physics::kinetic_energy(mass, speed) + physics::potential_energy(mass, height);
        self.energy_budget = self.energy_budget.min(settled);

        braking
    }

    fn advance(&mut self, distance: f32) {
        let total = f64::from(self.layout.total_length());
        self.lap_distance += f64::from(distance);

        if self.layout.is_closed() {
            if self.lap_distance >= total {
                let completed = (self.lap_distance / total).floor();
                self.state.laps = self.state.laps.saturating_add(completed as u32);
                self.lap_distance -= completed * total;
            }
        } else {
            self.lap_distance = self.lap_distance.min(total);
        }
        self.sync_travel();

        if !self.layout.is_closed() && self.state.progress >= COMPLETION_PROGRESS {
            self.state.complete = true;
            log::debug!(
                "ride complete after {:.1} s, {:.1} m",
                self.state.elapsed,
                self.state.distance
            );
        }
    }

    /// Writes progress and total distance from the lap accumulator.
    fn sync_travel(&mut self) {
        let total = f64::from(self.layout.total_length());
        let progress = (self.lap_distance / total) as f32;
        self.state.progress = if self.layout.is_closed() {
            physics::wrap_progress(progress)
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.state.distance =
            (f64::from(self.state.laps) * total + self.lap_distance) as f32;
    }

    /// Recomputes everything derived from progress and speed.
    fn refresh(&mut self, acceleration: f32, braking: bool) {
        let sample = self.layout.sample(self.state.progress);
        let speed = self.state.speed;
        let frame = sample.frame();

        let raw = if self.layout.is_ready() {
            GForces::compute(frame, sample.curvature(), speed, acceleration)
        } else {
            GForces::ONE_G
        };
        let display = self.smoother.push(raw.clamped(&self.config.display_limits));

        let mass = self.config.mass;
        let height = sample.position.y - self.layout.min_height();

        let state = &mut self.state;
        state.position = sample.position;
        state.velocity = if self.layout.is_ready() {
            sample.tangent * speed
        } else {
            Float3::ZERO
        };
        state.frame = frame;
        state.acceleration = acceleration;
        state.raw_g_forces = raw;
        state.g_forces = display;
        state.energy = Energy::new(
            physics::kinetic_energy(mass, speed),
            physics::potential_energy(mass, height),
        );
        state.on_chain_lift =
            self.config.has_chain_lift && state.progress < self.layout.first_peak_progress();
        state.in_loop = sample.in_loop;
        state.airtime = raw.is_airtime();
        state.braking = braking;
    }
}
