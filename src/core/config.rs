//! Engine configuration with documented constants
//!
//! The tick period and world-speed factor are the only externally tunable
//! parameters of the movement engine. Everything else (unit balance) lives
//! in the immutable unit catalog.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the movement engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === SCHEDULER ===
    /// Seconds between two poll ticks
    ///
    /// Every tick picks up all movements whose arrival time has passed,
    /// so this is also the worst-case lateness of an arrival.
    pub tick_interval_seconds: u64,

    /// Maximum movements processed in one tick (None = all arrived)
    ///
    /// Anything over the cap stays queued for the next tick.
    pub max_movements_per_tick: Option<usize>,

    // === TRAVEL ===
    /// Global multiplier applied to every unit speed
    ///
    /// At 5.0, a unit with speed 10 covers 50 distance units per hour.
    pub world_speed_factor: f64,

    /// Seconds per distance unit for scout and trade movements
    ///
    /// These ignore unit speed entirely and use a flat schedule.
    pub scout_trade_tile_seconds: u64,

    /// Lower bound of a scout/trade trip, in seconds
    pub scout_trade_min_seconds: u64,

    /// Upper bound of a scout/trade trip, in seconds
    pub scout_trade_max_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 5,
            max_movements_per_tick: None,

            world_speed_factor: 5.0,

            // 15s per tile, never shorter than 15s or longer than 5 minutes
            scout_trade_tile_seconds: 15,
            scout_trade_min_seconds: 15,
            scout_trade_max_seconds: 300,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML, filling missing keys with defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_seconds == 0 {
            return Err(ConfigError::Invalid("tick_interval_seconds must be positive".into()));
        }

        if self.world_speed_factor <= 0.0 || !self.world_speed_factor.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "world_speed_factor ({}) must be a positive number",
                self.world_speed_factor
            )));
        }

        if self.scout_trade_min_seconds > self.scout_trade_max_seconds {
            return Err(ConfigError::Invalid(format!(
                "scout_trade_min_seconds ({}) should be <= scout_trade_max_seconds ({})",
                self.scout_trade_min_seconds, self.scout_trade_max_seconds
            )));
        }

        if self.scout_trade_tile_seconds < self.scout_trade_min_seconds
            || self.scout_trade_tile_seconds > self.scout_trade_max_seconds
        {
            return Err(ConfigError::Invalid(format!(
                "scout_trade_tile_seconds ({}) must lie within [{}, {}]",
                self.scout_trade_tile_seconds, self.scout_trade_min_seconds, self.scout_trade_max_seconds
            )));
        }

        if self.max_movements_per_tick == Some(0) {
            return Err(ConfigError::Invalid("max_movements_per_tick must be positive when set".into()));
        }

        Ok(())
    }
}
