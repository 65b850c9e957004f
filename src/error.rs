//! Configuration errors
//!
//! The simulation itself never fails; only loading and validating
//! tuning tables or settings can.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("enemy table is empty")]
    NoEnemies,

    #[error("enemy archetype `{0}` has no positive spawn weight")]
    ZeroWeights(String),

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must be a probability in [0, 1] (got {value})")]
    InvalidProbability { field: &'static str, value: f32 },

    #[error("{field}: minimum {min} exceeds base {base}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        base: f32,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fail with `NonPositive` unless `value > 0`
pub(crate) fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Fail with `InvalidProbability` unless `value` is in [0, 1]
pub(crate) fn ensure_probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}
