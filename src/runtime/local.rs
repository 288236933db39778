//! Inline runner
//!
//! Accumulates frame time into a debt counter and drains it in fixed steps,
//! at most `MAX_SUBSTEPS` per frame. Debt beyond that is thrown away rather
//! than carried, so a stall doesn't turn into a burst of catch-up ticks.

use std::sync::Arc;

use super::{RunnerConfig, SimulationRunner, Topology};
use crate::consts::MAX_SUBSTEPS;
use crate::sim::{CarInput, DisplaySnapshot, SimulationState, TrackConfig, step_simulation};

pub struct LocalRunner {
    config: RunnerConfig,
    sim: Option<(SimulationState, Arc<TrackConfig>)>,
    input: CarInput,
    accumulator: f32,
    ticks: u64,
}

impl LocalRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            sim: None,
            input: CarInput::default(),
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Ticks simulated since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> Option<&SimulationState> {
        self.sim.as_ref().map(|(state, _)| state)
    }

    /// Unspent time debt in seconds
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }
}

impl SimulationRunner for LocalRunner {
    fn topology(&self) -> Topology {
        Topology::Local
    }

    fn start(&mut self, track: Arc<TrackConfig>) {
        self.sim = Some((SimulationState::new(&track), track));
        self.accumulator = 0.0;
    }

    fn apply_input(&mut self, input: CarInput) {
        self.input = input;
    }

    fn set_track(&mut self, track: Arc<TrackConfig>) {
        if let Some((_, current)) = self.sim.as_mut() {
            *current = track;
        }
    }

    fn pump(&mut self, frame_dt: f32) {
        let Some((state, track)) = self.sim.as_mut() else {
            return;
        };
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }

        let dt = self.config.tick_dt;
        let mut steps = 0;
        while self.accumulator >= dt && steps < MAX_SUBSTEPS {
            step_simulation(state, &self.input, dt, track, &self.config.tuning);
            self.accumulator -= dt;
            self.ticks += 1;
            steps += 1;
        }

        if self.accumulator >= dt {
            log::debug!(
                "Dropping {:.3}s of simulation debt after {} steps",
                self.accumulator,
                steps
            );
            self.accumulator %= dt;
        }
    }

    fn latest_snapshot(&self) -> Option<DisplaySnapshot> {
        self.state().map(SimulationState::snapshot)
    }

    fn destroy(&mut self) {
        self.sim = None;
        self.accumulator = 0.0;
    }
}
