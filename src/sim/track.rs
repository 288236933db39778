//! Procedural track centerline
//!
//! The centerline is a sum of sine bands, `x = Σ a·sin(y·f + φ)`, sampled as an
//! infinite curve along the longitudinal axis `y`. Only the phases are random;
//! amplitudes and frequencies are fixed so every seed has the same "feel".

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::TrackRng;
use crate::consts::TRACK_WIDTH;
use crate::error::TrackError;

/// Band (amplitude, frequency) pairs, large slow swings first
pub const BAND_SHAPES: [(f32, f32); 4] = [
    (160.0, 0.0021),
    (70.0, 0.0052),
    (28.0, 0.012),
    (10.0, 0.027),
];

/// One sine term of the centerline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackBand {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

/// Immutable description of one track. Replace it, never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    seed: u32,
    width: f32,
    bands: Vec<TrackBand>,
}

impl TrackConfig {
    pub fn new(seed: u32, width: f32, bands: Vec<TrackBand>) -> Result<Self, TrackError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(TrackError::InvalidWidth(width));
        }
        if bands.is_empty() {
            return Err(TrackError::NoBands);
        }
        Ok(Self { seed, width, bands })
    }

    /// Same layout with a different width
    pub fn with_width(&self, width: f32) -> Result<Self, TrackError> {
        Self::new(self.seed, width, self.bands.clone())
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    pub fn bands(&self) -> &[TrackBand] {
        &self.bands
    }

    /// Largest possible |centerX| over the whole curve
    pub fn max_offset(&self) -> f32 {
        self.bands.iter().map(|b| b.amplitude.abs()).sum()
    }
}

/// Centerline sample at one longitudinal coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub center_x: f32,
    /// Unit direction of travel along the curve
    pub tangent: Vec2,
    /// Tangent rotated 90° counter-clockwise
    pub normal: Vec2,
}

/// Build the track for a seed with the default width
pub fn create_track_config(seed: u32) -> TrackConfig {
    let mut rng = TrackRng::new(seed);
    let bands = BAND_SHAPES
        .iter()
        .map(|&(amplitude, frequency)| TrackBand {
            amplitude,
            frequency,
            phase: rng.range(0.0, std::f32::consts::TAU),
        })
        .collect();

    log::info!("Generated track for seed {}", seed);

    TrackConfig {
        seed,
        width: TRACK_WIDTH,
        bands,
    }
}

/// Centerline X at `y`
#[inline]
pub fn center_x(config: &TrackConfig, y: f32) -> f32 {
    config
        .bands
        .iter()
        .map(|b| b.amplitude * (y * b.frequency + b.phase).sin())
        .sum()
}

/// Centerline position, tangent and normal at `y`
#[inline]
pub fn sample_track(config: &TrackConfig, y: f32) -> TrackSample {
    let mut x = 0.0;
    let mut dx = 0.0;
    for b in &config.bands {
        let (s, c) = (y * b.frequency + b.phase).sin_cos();
        x += b.amplitude * s;
        dx += b.amplitude * b.frequency * c;
    }

    // dy/dy == 1, so the tangent never degenerates
    let tangent = Vec2::new(dx, 1.0).normalize();
    let normal = Vec2::new(-tangent.y, tangent.x);

    TrackSample {
        center_x: x,
        tangent,
        normal,
    }
}
