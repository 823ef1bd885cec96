//! Application configuration, read from a TOML file.

use crate::error::Result;
use crate::models::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "mathetrainer.toml";
pub const CONFIG_ENV_VAR: &str = "MATHETRAINER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file holding wrong answers, history and rewards.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_feedback_delay")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_close_delay")]
    pub close_delay_ms: u64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Initial values of the settings form.
    #[serde(default)]
    pub defaults: Settings,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("mathetrainer.sqlite3")
}
fn default_log_filter() -> String {
    "mathetrainer=info".to_string()
}
fn default_feedback_delay() -> u64 {
    1000
}
fn default_close_delay() -> u64 {
    500
}
fn default_tick_interval() -> u64 {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_filter: default_log_filter(),
            feedback_delay_ms: default_feedback_delay(),
            close_delay_ms: default_close_delay(),
            tick_interval_ms: default_tick_interval(),
            defaults: Settings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Config path from `MATHETRAINER_CONFIG`, falling back to `./mathetrainer.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
