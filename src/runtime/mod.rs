//! Scheduling shell
//!
//! Runs the fixed-step simulation either inline (time-debt accumulator drained
//! before each render) or on a detached worker thread with its own clock.
//! Both sit behind `SimulationRunner`, so the presentation loop doesn't care
//! which one it got. Across the thread boundary only messages and copies move.

pub mod display;
pub mod local;
pub mod quality;
pub mod session;
pub mod worker;

use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::consts::{SIM_DT, SNAPSHOT_EVERY_TICKS};
use crate::settings::Settings;
use crate::sim::{CarInput, CarTuning, DisplaySnapshot, TrackConfig};

pub use display::DisplaySmoother;
pub use local::LocalRunner;
pub use quality::RenderScaleController;
pub use session::{Session, TelemetrySink, TelemetryThrottle};
pub use worker::{WorkerCommand, WorkerRunner, WorkerSnapshot};

/// Where the simulation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Dedicated thread with its own fixed-interval clock
    #[default]
    Worker,
    /// Same thread as the presentation loop
    Local,
}

/// Simulation parameters shared by both runners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    pub tick_dt: f32,
    /// Worker publishes a snapshot every N ticks
    pub snapshot_every_ticks: u32,
    pub tuning: CarTuning,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_dt: SIM_DT,
            snapshot_every_ticks: SNAPSHOT_EVERY_TICKS,
            tuning: CarTuning::default(),
        }
    }
}

impl RunnerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tick_dt: settings.tick_dt(),
            snapshot_every_ticks: settings.snapshot_every_ticks.max(1),
            tuning: settings.tuning,
        }
    }
}

/// Execution strategy for the simulation authority
pub trait SimulationRunner {
    fn topology(&self) -> Topology;

    /// (Re)create the simulation state on `track`
    fn start(&mut self, track: Arc<TrackConfig>);

    /// Takes effect from the next tick boundary
    fn apply_input(&mut self, input: CarInput);

    /// Swap the active track without repositioning the car
    fn set_track(&mut self, track: Arc<TrackConfig>);

    /// Advance by one presentation frame. Never blocks.
    fn pump(&mut self, frame_dt: f32);

    /// Most recent state copy, if any tick has produced one
    fn latest_snapshot(&self) -> Option<DisplaySnapshot>;

    /// Immediate teardown; in-flight work is abandoned
    fn destroy(&mut self);
}

/// Build the runner for `topology`, falling back to inline execution if a
/// worker thread can't be started.
pub fn connect(config: RunnerConfig, topology: Topology) -> Box<dyn SimulationRunner> {
    match topology {
        Topology::Local => {
            log::info!("Running simulation inline");
            Box::new(LocalRunner::new(config))
        }
        Topology::Worker => with_fallback(WorkerRunner::spawn(config), config),
    }
}

/// Use the worker if it came up, otherwise degrade to a local runner
pub fn with_fallback(
    attempt: io::Result<WorkerRunner>,
    config: RunnerConfig,
) -> Box<dyn SimulationRunner> {
    match attempt {
        Ok(worker) => {
            log::info!("Running simulation on worker thread");
            Box::new(worker)
        }
        Err(e) => {
            log::warn!("Simulation worker unavailable ({e}), running inline");
            Box::new(LocalRunner::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_on_spawn_failure() {
        let runner = with_fallback(
            Err(io::Error::other("threads unsupported")),
            RunnerConfig::default(),
        );
        assert_eq!(runner.topology(), Topology::Local);
    }

    #[test]
    fn test_connect_local() {
        let runner = connect(RunnerConfig::default(), Topology::Local);
        assert_eq!(runner.topology(), Topology::Local);
        assert!(runner.latest_snapshot().is_none());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            tick_hz: 120.0,
            snapshot_every_ticks: 4,
            ..Default::default()
        };
        let config = RunnerConfig::from_settings(&settings);
        assert!((config.tick_dt - 1.0 / 120.0).abs() < 1e-7);
        assert_eq!(config.snapshot_every_ticks, 4);
    }
}
