//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, threading or platform dependencies

pub mod car;
pub mod on_track;
pub mod rng;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod track;

pub use car::{CarInput, CarState, CarTuning, step_car};
pub use on_track::{Probe, is_on_track, probe};
pub use rng::TrackRng;
pub use scoring::{DriftScore, drift_angle};
pub use state::{DisplaySnapshot, SimulationState, Telemetry};
pub use tick::step_simulation;
pub use track::{TrackBand, TrackConfig, TrackSample, center_x, create_track_config, sample_track};
