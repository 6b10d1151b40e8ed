//! Engine configuration.
//!
//! Every magic number inherited from the original choreography -- retry
//! ceilings, step durations, settle delays, hunger odds -- is a config
//! field here, with defaults equal to the inherited values. The canonical
//! configuration lives in `bearden-config.yaml` at the project root;
//! every section and field is optional and falls back to its default.

use std::path::Path;

use bearden_agents::HungerConfig;
use bearden_types::Cell;
use bearden_world::{PathConfig, RoomConfig};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Tunables for path-following motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// How long one cell-to-cell step takes, in milliseconds.
    pub step_duration_ms: u64,
    /// How often the interpolated position is sampled, in milliseconds.
    pub frame_interval_ms: u64,
    /// Duration of the outward half of a bounce (no-path feedback).
    pub bounce_out_ms: u64,
    /// Duration of the return half of a bounce.
    pub bounce_back_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            step_duration_ms: 300,
            frame_interval_ms: 25,
            bounce_out_ms: 150,
            bounce_back_ms: 300,
        }
    }
}

/// Tunables for the clearance choreography.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClearanceConfig {
    /// Duration of a token flight between a house and the authority.
    pub flight_duration_ms: u64,
    /// Per-cell duration of a token riding a connection path.
    pub path_step_ms: u64,
    /// Where the authority sits on screen, as a grid anchor for token
    /// flights.
    pub authority_anchor: Cell,
    /// Resource name used when deriving queries for house entry.
    pub house_name: String,
}

impl Default for ClearanceConfig {
    fn default() -> Self {
        Self {
            flight_duration_ms: 800,
            path_step_ms: 50,
            authority_anchor: Cell::new(0, 0),
            house_name: String::from("cottage"),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Room generation settings.
    pub rooms: RoomConfig,
    /// Path search settings.
    pub paths: PathConfig,
    /// Hunger roll settings.
    pub hunger: HungerConfig,
    /// Motion timing settings.
    pub motion: MotionConfig,
    /// Clearance choreography settings.
    pub clearance: ClearanceConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&raw)?;
        Ok(config)
    }
}
