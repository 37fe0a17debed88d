//! # Config Module
//!
//! TOML configuration with defaults for every field.
//!
//! ```toml
//! log_level = "info"
//!
//! [database]
//! url = "sqlite:data/speedy.db?mode=rwc"
//! max_connections = 5
//!
//! [rewards.join_bonus]
//! policy = "flat"
//! amount = 1200
//!
//! [event]
//! name = "Speedy's Birthday"
//! target = "2026-01-21T00:00:00Z"
//! ```

use crate::rewards::JoinBonusPolicy;
use crate::settings::DisplaySettings;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub rewards: RewardsConfig,

    #[serde(default)]
    pub event: EventConfig,

    /// Seed values for the display settings document
    #[serde(default)]
    pub settings: DisplaySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            database: DatabaseConfig::default(),
            rewards: RewardsConfig::default(),
            event: EventConfig::default(),
            settings: DisplaySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default)]
    pub join_bonus: JoinBonusPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_event_name")]
    pub name: String,

    /// Countdown target
    #[serde(default = "default_event_target")]
    pub target: DateTime<Utc>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            name: default_event_name(),
            target: default_event_target(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_url() -> String {
    "sqlite:data/speedy.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_event_name() -> String {
    "Speedy's Birthday".to_string()
}

fn default_event_target() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 21, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

impl AppConfig {
    /// Load configuration from file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from string
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Validation("database.url is empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        self.rewards
            .join_bonus
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(())
    }
}
