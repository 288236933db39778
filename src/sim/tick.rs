//! Fixed timestep simulation tick
//!
//! One call advances the whole simulation: car integration, drift geometry,
//! on-track classification (amortized), scoring, then the chase camera.

use super::car::{CarInput, CarTuning, step_car};
use super::on_track::{Probe, is_on_track, probe};
use super::scoring::{apply_grass_drag, drift_angle};
use super::state::SimulationState;
use super::track::{TrackConfig, center_x};
use crate::consts::ON_TRACK_MARGIN;
use crate::damp;

/// Longest the full on-track search may be skipped
pub const TRACK_CHECK_INTERVAL: f32 = 1.0 / 30.0;
/// Camera Y time constant (tight chase)
pub const CAMERA_TAU_Y: f32 = 0.12;
/// Camera X time constant, following the road rather than the car
pub const CAMERA_TAU_X: f32 = 0.25;

/// Advance the simulation by one fixed timestep
pub fn step_simulation(
    state: &mut SimulationState,
    input: &CarInput,
    dt: f32,
    track: &TrackConfig,
    tuning: &CarTuning,
) {
    step_car(&mut state.car, input, dt, tuning);

    state.speed = state.car.velocity.length();
    state.drift_angle = drift_angle(state.car.velocity, state.car.heading);

    update_on_track(state, track, dt);

    state
        .drift
        .update(state.on_track, state.speed, state.drift_angle, dt);
    if !state.on_track {
        state.car.velocity = apply_grass_drag(state.car.velocity, dt);
    }

    update_camera(state, track, dt);
}

/// Cheap probe first; the full search only runs when the probe can't tell
/// or the timer has run out.
fn update_on_track(state: &mut SimulationState, track: &TrackConfig, dt: f32) {
    let pos = state.car.position;
    state.track_check_timer -= dt;

    match probe(track, pos.x, pos.y, ON_TRACK_MARGIN) {
        Probe::Inside => state.on_track = true,
        Probe::Outside if state.track_check_timer > 0.0 => state.on_track = false,
        _ => {
            state.on_track = is_on_track(track, pos.x, pos.y, ON_TRACK_MARGIN);
            state.track_check_timer = TRACK_CHECK_INTERVAL;
        }
    }
}

fn update_camera(state: &mut SimulationState, track: &TrackConfig, dt: f32) {
    state.camera.y = damp(state.camera.y, state.car.position.y, CAMERA_TAU_Y, dt);
    let road_x = center_x(track, state.camera.y);
    state.camera.x = damp(state.camera.x, road_x, CAMERA_TAU_X, dt);
}
