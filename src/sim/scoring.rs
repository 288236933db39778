//! Drift scoring
//!
//! Combo and multiplier are continuous accumulators with hysteresis: a drift
//! that weakens decays smoothly, while leaving the road wipes the combo at once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::wrap_angle;

/// Minimum speed for a drift to count
pub const DRIFT_MIN_SPEED: f32 = 25.0;
/// Minimum |drift angle| for a drift to count (~9°)
pub const DRIFT_MIN_ANGLE: f32 = 0.16;

pub const COMBO_MAX: f32 = 4.0;
pub const COMBO_GAIN: f32 = 1.0;
pub const COMBO_DECAY: f32 = 1.2;

pub const MULTIPLIER_MIN: f32 = 1.0;
pub const MULTIPLIER_MAX: f32 = 6.0;
pub const MULTIPLIER_GAIN: f32 = 0.4;
pub const MULTIPLIER_DECAY: f32 = 1.5;

/// Score per (speed · radian · second) before the multiplier
pub const SCORE_FACTOR: f32 = 0.35;
/// Velocity bleed rate while off the road
pub const GRASS_DRAG: f32 = 2.4;

/// Angle between the velocity vector and the heading, in (-π, π]
#[inline]
pub fn drift_angle(velocity: Vec2, heading: f32) -> f32 {
    wrap_angle(velocity.x.atan2(velocity.y) - heading)
}

/// Scoring accumulators carried from tick to tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftScore {
    pub score: f32,
    pub multiplier: f32,
    pub combo: f32,
}

impl Default for DriftScore {
    fn default() -> Self {
        Self {
            score: 0.0,
            multiplier: MULTIPLIER_MIN,
            combo: 0.0,
        }
    }
}

impl DriftScore {
    /// Whether the current geometry counts as an active drift
    pub fn is_drifting(on_track: bool, speed: f32, drift_angle: f32) -> bool {
        on_track && speed > DRIFT_MIN_SPEED && drift_angle.abs() > DRIFT_MIN_ANGLE
    }

    /// Advance the accumulators by one tick. Returns true if the drift counted.
    pub fn update(&mut self, on_track: bool, speed: f32, drift_angle: f32, dt: f32) -> bool {
        if !on_track {
            self.combo = 0.0;
            self.multiplier = MULTIPLIER_MIN;
            return false;
        }

        let active = Self::is_drifting(on_track, speed, drift_angle);
        if active {
            self.combo = (self.combo + COMBO_GAIN * dt).clamp(0.0, COMBO_MAX);
            if self.combo > 1.0 {
                self.multiplier =
                    (self.multiplier + MULTIPLIER_GAIN * dt).clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
            }
            self.score += speed * drift_angle.abs() * SCORE_FACTOR * self.multiplier * dt;
        } else {
            self.combo = (self.combo - COMBO_DECAY * dt).clamp(0.0, COMBO_MAX);
            if self.combo == 0.0 {
                self.multiplier =
                    (self.multiplier - MULTIPLIER_DECAY * dt).clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);
            }
        }
        active
    }
}

/// Bleed velocity while the car is on the grass
#[inline]
pub fn apply_grass_drag(velocity: Vec2, dt: f32) -> Vec2 {
    velocity * (1.0 - GRASS_DRAG * dt).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_drift_angle() {
        // Heading +Y, sliding toward +X: velocity is 90° clockwise of heading
        assert!((drift_angle(Vec2::new(1.0, 0.0), 0.0) - FRAC_PI_2).abs() < 1e-6);
        assert!(drift_angle(Vec2::new(0.0, 5.0), 0.0).abs() < 1e-6);
        let a = drift_angle(Vec2::new(0.0, -1.0), 0.0);
        assert!((a - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_combo_and_multiplier_ramp() {
        let mut s = DriftScore::default();
        for _ in 0..60 * 10 {
            assert!(s.update(true, 200.0, 0.5, SIM_DT));
        }
        assert_eq!(s.combo, COMBO_MAX);
        assert!(s.multiplier > MULTIPLIER_MIN);
        assert!(s.multiplier <= MULTIPLIER_MAX);
        assert!(s.score > 0.0);
    }

    #[test]
    fn test_multiplier_waits_for_combo() {
        let mut s = DriftScore::default();
        // Half a second of drifting keeps combo below 1
        for _ in 0..30 {
            s.update(true, 200.0, 0.5, SIM_DT);
        }
        assert!(s.combo < 1.0);
        assert_eq!(s.multiplier, MULTIPLIER_MIN);
    }

    #[test]
    fn test_decay_is_gradual() {
        let mut s = DriftScore {
            score: 10.0,
            multiplier: 3.0,
            combo: 2.0,
        };
        assert!(!s.update(true, 200.0, 0.05, SIM_DT));
        assert!(s.combo > 1.9);
        assert_eq!(s.multiplier, 3.0);

        for _ in 0..60 * 5 {
            s.update(true, 10.0, 0.0, SIM_DT);
        }
        assert_eq!(s.combo, 0.0);
        assert_eq!(s.multiplier, MULTIPLIER_MIN);
        assert_eq!(s.score, 10.0);
    }

    #[test]
    fn test_off_track_resets_immediately() {
        let mut s = DriftScore {
            score: 50.0,
            multiplier: 4.5,
            combo: 3.2,
        };
        assert!(!s.update(false, 300.0, 0.8, SIM_DT));
        assert_eq!(s.combo, 0.0);
        assert_eq!(s.multiplier, MULTIPLIER_MIN);
        assert_eq!(s.score, 50.0);
    }

    #[test]
    fn test_grass_drag() {
        let v = apply_grass_drag(Vec2::new(100.0, -50.0), SIM_DT);
        assert!(v.length() < Vec2::new(100.0, -50.0).length());
        assert_eq!(apply_grass_drag(Vec2::ONE, 10.0), Vec2::ZERO);
    }
}
