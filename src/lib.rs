//! Drift Arcade - endless procedural drift track
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track, car dynamics, on-track checks, drift scoring)
//! - `runtime`: Fixed-step scheduling, inline or on a worker thread, plus display smoothing
//! - `renderer`: Contract for the external renderer and its sample cache
//! - `settings`: Data-driven session configuration
//! - `error`: Error types for the fallible boundaries

pub mod error;
pub mod renderer;
pub mod runtime;
pub mod settings;
pub mod sim;

pub use error::{SessionError, SettingsError, TrackError};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Simulation tick rate
    pub const SIM_HZ: f32 = 60.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / SIM_HZ;
    /// Maximum simulation steps drained per rendered frame; leftover debt is dropped
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Constant cross-section of the drivable strip
    pub const TRACK_WIDTH: f32 = 240.0;
    /// Fraction of the half-width the car may stray before it counts as off-track
    pub const ON_TRACK_MARGIN: f32 = 0.98;

    /// Worker publishes a snapshot every N ticks (30 Hz at the default tick rate)
    pub const SNAPSHOT_EVERY_TICKS: u32 = 2;
    /// Telemetry push interval for the HUD
    pub const TELEMETRY_INTERVAL_MS: u32 = 120;
}

/// Wrap an angle into (-π, π]
#[inline]
pub fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Frame-rate independent exponential smoothing of `current` toward `target`
/// with time constant `tau` seconds.
#[inline]
pub fn damp(current: f32, target: f32, tau: f32, dt: f32) -> f32 {
    if tau <= 0.0 {
        return target;
    }
    current + (target - current) * (1.0 - (-dt / tau).exp())
}

/// Install the platform logger (env_logger natively, the browser console on wasm).
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::warn!("Logger already installed");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if env_logger::try_init().is_err() {
            log::warn!("Logger already installed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-6);
        assert!((wrap_angle(-7.0) - (-7.0 + 2.0 * PI)).abs() < 1e-5);
        assert_eq!(wrap_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_damp_converges() {
        let mut x = 0.0;
        for _ in 0..600 {
            x = damp(x, 10.0, 0.1, 1.0 / 60.0);
        }
        assert!((x - 10.0).abs() < 1e-3);
        assert_eq!(damp(3.0, 7.0, 0.0, 0.016), 7.0);
    }
}
