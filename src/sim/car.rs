//! Arcade vehicle dynamics
//!
//! Euler integration with hand-tuned damping, not a tire model. The order of
//! operations matters: decompose, accelerate, clamp, drag, grip, steer,
//! recompose, integrate. Reordering changes top speed and slide behavior.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Reverse speed cap as a fraction of `max_speed`
pub const REVERSE_FRACTION: f32 = 0.35;
/// How much grip is lost at full speed
pub const GRIP_SPEED_LOSS: f32 = 0.35;
/// Grip never drops below this fraction of its base value
pub const MIN_GRIP_SCALE: f32 = 0.5;
/// Steering authority when standing still
pub const MIN_STEER_SCALE: f32 = 0.25;

/// Vehicle state, owned by whichever side runs the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CarState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians; 0 faces +Y
    pub heading: f32,
}

impl CarState {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Unit facing direction
    #[inline]
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), self.heading.cos())
    }

    /// Unit direction to the car's right
    #[inline]
    pub fn right(&self) -> Vec2 {
        Vec2::new(self.heading.cos(), -self.heading.sin())
    }
}

/// Control input for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CarInput {
    /// [0, 1]
    pub throttle: f32,
    /// [0, 1]
    pub brake: f32,
    /// [-1, 1], positive turns right
    pub steer: f32,
    pub handbrake: bool,
}

impl CarInput {
    /// Digital mapping from held control keys
    pub fn from_keys(up: bool, down: bool, left: bool, right: bool, handbrake: bool) -> Self {
        let axis = |on: bool| if on { 1.0 } else { 0.0 };
        Self {
            throttle: axis(up),
            brake: axis(down),
            steer: axis(right) - axis(left),
            handbrake,
        }
    }

    /// Copy with every axis clamped to its legal range (NaN reads as released)
    pub fn clamped(&self) -> Self {
        let clamp = |v: f32, lo: f32, hi: f32| if v.is_nan() { 0.0 } else { v.clamp(lo, hi) };
        Self {
            throttle: clamp(self.throttle, 0.0, 1.0),
            brake: clamp(self.brake, 0.0, 1.0),
            steer: clamp(self.steer, -1.0, 1.0),
            handbrake: self.handbrake,
        }
    }
}

/// Handling constants, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarTuning {
    pub accel: f32,
    pub brake_force: f32,
    pub drag: f32,
    pub lateral_grip: f32,
    pub handbrake_grip: f32,
    pub steer_strength: f32,
    pub max_speed: f32,
}

impl Default for CarTuning {
    fn default() -> Self {
        Self {
            accel: 260.0,
            brake_force: 380.0,
            drag: 0.45,
            lateral_grip: 7.5,
            handbrake_grip: 1.6,
            steer_strength: 2.6,
            max_speed: 420.0,
        }
    }
}

/// Advance the car by one fixed timestep
pub fn step_car(state: &mut CarState, input: &CarInput, dt: f32, tuning: &CarTuning) {
    let input = input.clamped();
    let max_speed = tuning.max_speed.max(f32::EPSILON);

    // Axes from the heading at the start of the tick; recomposition below
    // reuses them, so turning leaves lateral slip for the next tick.
    let forward = state.forward();
    let right = state.right();
    let mut v_forward = state.velocity.dot(forward);
    let mut v_lateral = state.velocity.dot(right);

    v_forward += (input.throttle * tuning.accel - input.brake * tuning.brake_force) * dt;
    v_forward = v_forward.clamp(-REVERSE_FRACTION * max_speed, max_speed);
    v_forward *= (1.0 - tuning.drag * dt).max(0.0);

    let speed_ratio = (v_forward.abs() / max_speed).clamp(0.0, 1.0);
    let grip_scale = (1.0 - GRIP_SPEED_LOSS * speed_ratio).max(MIN_GRIP_SCALE);
    let base_grip = if input.handbrake {
        tuning.handbrake_grip
    } else {
        tuning.lateral_grip
    };
    v_lateral *= (1.0 - base_grip * grip_scale * dt).max(0.0);

    let steer_scale = speed_ratio.max(MIN_STEER_SCALE);
    state.heading += input.steer * tuning.steer_strength * steer_scale * dt;

    state.velocity = forward * v_forward + right * v_lateral;
    state.position += state.velocity * dt;
}
