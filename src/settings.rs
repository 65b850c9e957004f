//! Host and simulation options
//!
//! Loaded from a JSON file by the native host; everything has a default.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SUBSTEPS, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::error::{ConfigError, ensure_positive};

/// How a projectile treats several enemies overlapping it in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HitPolicy {
    /// Damage only the lowest-id overlapping enemy
    #[default]
    SingleTarget,
    /// Damage every overlapping enemy before being consumed
    AllOverlapping,
}

impl HitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitPolicy::SingleTarget => "single_target",
            HitPolicy::AllOverlapping => "all_overlapping",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single_target" | "single" => Some(HitPolicy::SingleTarget),
            "all_overlapping" | "all" => Some(HitPolicy::AllOverlapping),
            _ => None,
        }
    }
}

/// Simulation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run seed for reproducibility
    pub seed: u64,

    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,

    // === Rules ===
    pub hit_policy: HitPolicy,

    // === Scheduling ===
    /// Maximum ticks run by a single `advance` call
    pub max_substeps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,
            hit_policy: HitPolicy::SingleTarget,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl Settings {
    /// Default settings with the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn playfield(&self) -> Vec2 {
        Vec2::new(self.playfield_width, self.playfield_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("playfield_width", self.playfield_width)?;
        ensure_positive("playfield_height", self.playfield_height)?;
        ensure_positive("max_substeps", self.max_substeps as f32)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| ConfigError::io(path, e))?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_policy_parse() {
        assert_eq!(HitPolicy::from_str("ALL"), Some(HitPolicy::AllOverlapping));
        assert_eq!(
            HitPolicy::from_str(HitPolicy::SingleTarget.as_str()),
            Some(HitPolicy::SingleTarget)
        );
        assert_eq!(HitPolicy::from_str("pierce"), None);
    }

    #[test]
    fn test_partial_settings_json() {
        let settings = Settings::from_json(r#"{ "seed": 7, "hit_policy": "all_overlapping" }"#)
            .unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.hit_policy, HitPolicy::AllOverlapping);
        assert_eq!(settings.playfield_width, PLAYFIELD_WIDTH);
    }

    #[test]
    fn test_invalid_playfield_rejected() {
        let result = Settings::from_json(r#"{ "playfield_width": 0.0 }"#);
        assert!(matches!(result, Err(ConfigError::NonPositive { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Settings::load("/nonexistent/swarm-survivor/settings.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
