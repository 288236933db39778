//! Display smoothing
//!
//! Worker snapshots arrive at their own cadence, so drawing them raw
//! stutters. The smoother eases the drawn pose toward the newest snapshot
//! each frame. It only affects what gets drawn; telemetry passes straight
//! through.

use glam::Vec2;

use crate::sim::DisplaySnapshot;
use crate::{damp, wrap_angle};

/// Smoothing time constant for the drawn pose, seconds
pub const DISPLAY_TAU: f32 = 0.06;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySmoother {
    tau: f32,
    current: Option<DisplaySnapshot>,
}

impl Default for DisplaySmoother {
    fn default() -> Self {
        Self::new(DISPLAY_TAU)
    }
}

impl DisplaySmoother {
    pub fn new(tau: f32) -> Self {
        Self { tau, current: None }
    }

    /// Jump straight to `target`
    pub fn snap(&mut self, target: DisplaySnapshot) -> DisplaySnapshot {
        self.current = Some(target);
        target
    }

    /// Ease toward `target` over one frame of length `dt`
    pub fn follow(&mut self, target: DisplaySnapshot, dt: f32) -> DisplaySnapshot {
        let Some(mut shown) = self.current else {
            return self.snap(target);
        };
        if !(dt.is_finite() && dt > 0.0) {
            return shown;
        }

        shown.car.position = damp_vec(shown.car.position, target.car.position, self.tau, dt);
        shown.car.velocity = damp_vec(shown.car.velocity, target.car.velocity, self.tau, dt);
        shown.camera = damp_vec(shown.camera, target.camera, self.tau, dt);

        // Shortest arc so a wrap near ±π doesn't spin the car
        let delta = wrap_angle(target.car.heading - shown.car.heading);
        shown.car.heading = wrap_angle(shown.car.heading + damp(0.0, delta, self.tau, dt));

        shown.telemetry = target.telemetry;

        self.current = Some(shown);
        shown
    }

    /// Last drawn snapshot
    pub fn current(&self) -> Option<DisplaySnapshot> {
        self.current
    }
}

fn damp_vec(current: Vec2, target: Vec2, tau: f32, dt: f32) -> Vec2 {
    Vec2::new(
        damp(current.x, target.x, tau, dt),
        damp(current.y, target.y, tau, dt),
    )
}
