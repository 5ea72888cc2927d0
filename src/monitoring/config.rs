//! Logging configuration, read from the environment:
//!
//! - `MONITORING_ENABLED`: install the subscriber at all (default true)
//! - `RUST_LOG`: filter directive, also used as the fallback level
//! - `LOG_FORMAT`: `text` or `json` console output
//! - `LOG_DIR`: where daily log files go (default `~/.docchat/logs`)
//! - `LOG_FILE_ENABLED`: write JSON log files as well

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_dir: PathBuf,
    pub enable_file_logging: bool,
    pub enable_console_logging: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            log_dir: default_log_dir(),
            enable_file_logging: false,
            enable_console_logging: true,
        }
    }
}

fn default_log_dir() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
        .join(".docchat")
        .join("logs")
}

/// Unset or unrecognised values keep the default.
fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key).map(|v| v.trim().to_lowercase()) {
        Ok(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Ok(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

impl MonitoringConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("MONITORING_ENABLED", defaults.enabled),
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: env::var("LOG_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),
            log_dir: env::var_os("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            enable_file_logging: env_flag("LOG_FILE_ENABLED", defaults.enable_file_logging),
            enable_console_logging: defaults.enable_console_logging,
        }
    }

    pub fn ensure_log_dir(&self) -> std::io::Result<()> {
        if !self.log_dir.is_dir() {
            std::fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }
}
