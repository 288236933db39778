//! Error types for the fallible boundaries
//!
//! The per-tick path never fails: out-of-range inputs are clamped where they
//! are used. Errors only exist where a caller can act on them.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid track construction
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    #[error("track width must be positive and finite, got {0}")]
    InvalidWidth(f32),
    #[error("track needs at least one band")]
    NoBands,
}

/// Fatal session start failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no drawable surface available")]
    NoSurface,
    #[error("render surface has zero size ({width}x{height})")]
    ZeroSizedSurface { width: u32, height: u32 },
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Settings loading failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
