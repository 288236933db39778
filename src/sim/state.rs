//! Simulation state and its read-only projections
//!
//! `SimulationState` is the single authority advanced once per tick.
//! `Telemetry` and `DisplaySnapshot` are copies handed to the HUD and the
//! renderer; nothing flows back from them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::car::CarState;
use super::scoring::DriftScore;
use super::track::{TrackConfig, center_x};

/// Complete per-session simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub car: CarState,
    pub camera: Vec2,
    /// |velocity| after integration, taken before grass drag for this tick,
    /// so off-track it leads the stored velocity by one drag step
    pub speed: f32,
    /// Velocity angle relative to heading, (-π, π]
    pub drift_angle: f32,
    pub drift: DriftScore,
    pub on_track: bool,
    /// Seconds until the full on-track search must run again
    pub track_check_timer: f32,
}

impl SimulationState {
    /// Car parked on the centerline at y = 0, facing down the track
    pub fn new(track: &TrackConfig) -> Self {
        let start = Vec2::new(center_x(track, 0.0), 0.0);
        Self {
            car: CarState::at(start),
            camera: start,
            speed: 0.0,
            drift_angle: 0.0,
            drift: DriftScore::default(),
            on_track: true,
            track_check_timer: 0.0,
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            speed: self.speed,
            drift_angle: self.drift_angle,
            score: self.drift.score,
            multiplier: self.drift.multiplier,
            combo: self.drift.combo,
            on_track: self.on_track,
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            car: self.car,
            camera: self.camera,
            telemetry: self.telemetry(),
        }
    }
}

/// HUD-facing projection of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Telemetry {
    pub speed: f32,
    pub drift_angle: f32,
    pub score: f32,
    pub multiplier: f32,
    pub combo: f32,
    pub on_track: bool,
}

/// Copy of the state at some past tick, used only for drawing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub car: CarState,
    pub camera: Vec2,
    pub telemetry: Telemetry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::track::create_track_config;

    #[test]
    fn test_new_state_on_centerline() {
        let track = create_track_config(2024);
        let state = SimulationState::new(&track);
        assert_eq!(state.car.position.y, 0.0);
        assert_eq!(state.car.position.x, center_x(&track, 0.0));
        assert_eq!(state.car.heading, 0.0);
        assert_eq!(state.car.velocity, Vec2::ZERO);
        assert_eq!(state.camera, state.car.position);
        assert!(state.on_track);
        assert_eq!(state.drift.multiplier, 1.0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let track = create_track_config(1);
        let mut state = SimulationState::new(&track);
        let snap = state.snapshot();
        state.car.position.x += 100.0;
        state.drift.score = 42.0;
        assert_ne!(snap.car.position, state.car.position);
        assert_eq!(snap.telemetry.score, 0.0);
        assert_eq!(state.telemetry().score, 42.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let track = create_track_config(8);
        let snap = SimulationState::new(&track).snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: DisplaySnapshot = serde_json::from_str(&json).unwrap();
        assert!((back.car.position - snap.car.position).length() < 1e-3);
        assert_eq!(back.telemetry.on_track, snap.telemetry.on_track);
        assert_eq!(back.telemetry.multiplier, 1.0);
    }
}
