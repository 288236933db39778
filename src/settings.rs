//! Session settings
//!
//! Loaded from JSON; every field has a default so partial files are fine.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{SIM_HZ, SNAPSHOT_EVERY_TICKS, TELEMETRY_INTERVAL_MS, TRACK_WIDTH};
use crate::error::SettingsError;
use crate::runtime::Topology;
use crate::sim::CarTuning;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Upper bound for the adaptive render scale
    pub fn max_render_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.75,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }

    /// Frame time the render scale controller tries to stay under
    pub fn frame_budget_ms(&self) -> f32 {
        match self {
            QualityPreset::Low => 33.3,
            QualityPreset::Medium => 16.7,
            QualityPreset::High => 16.7,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            other => Err(SettingsError::Invalid(format!(
                "unknown quality preset '{other}'"
            ))),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Preferred execution topology (falls back to local if a worker can't start)
    pub topology: Topology,
    /// Track seed; random when absent
    pub seed: Option<u32>,
    pub track_width: f32,
    /// Simulation tick rate
    pub tick_hz: f32,
    /// Worker snapshot cadence in ticks
    pub snapshot_every_ticks: u32,
    pub telemetry_interval_ms: u32,
    /// Overrides the preset's render scale ceiling
    pub max_render_scale: Option<f32>,
    pub tuning: CarTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            topology: Topology::Worker,
            seed: None,
            track_width: TRACK_WIDTH,
            tick_hz: SIM_HZ,
            snapshot_every_ticks: SNAPSHOT_EVERY_TICKS,
            telemetry_interval_ms: TELEMETRY_INTERVAL_MS,
            max_render_scale: None,
            tuning: CarTuning::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.tick_hz.is_finite() && self.tick_hz > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "tick_hz must be positive, got {}",
                self.tick_hz
            )));
        }
        if !(self.track_width.is_finite() && self.track_width > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "track_width must be positive, got {}",
                self.track_width
            )));
        }
        if self.snapshot_every_ticks == 0 {
            return Err(SettingsError::Invalid(
                "snapshot_every_ticks must be at least 1".into(),
            ));
        }
        if let Some(scale) = self.max_render_scale
            && !(scale.is_finite() && scale > 0.0)
        {
            return Err(SettingsError::Invalid(format!(
                "max_render_scale must be positive, got {scale}"
            )));
        }
        if !(self.tuning.max_speed.is_finite() && self.tuning.max_speed > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "tuning.max_speed must be positive, got {}",
                self.tuning.max_speed
            )));
        }
        Ok(())
    }

    /// Fixed simulation timestep in seconds
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_hz
    }

    /// Effective render scale ceiling
    pub fn max_render_scale(&self) -> f32 {
        self.max_render_scale
            .unwrap_or_else(|| self.quality.max_render_scale())
    }

    /// Telemetry interval in seconds
    pub fn telemetry_interval(&self) -> f32 {
        self.telemetry_interval_ms as f32 / 1000.0
    }
}
