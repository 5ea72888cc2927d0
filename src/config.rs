// src/config.rs
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::extract::CsvMode;
use crate::memory::chunker::ChunkerConfig;
use crate::memory::prompt::{BudgetUnit, HistoryWindow, PromptOptions};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GROQ_API_KEY is not set. Please set the GROQ_API_KEY environment variable.")]
    MissingApiKey,

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub llm_timeout_secs: u64,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_context_budget: usize,
    pub budget_unit: BudgetUnit,
    /// 0 keeps the full conversation
    pub history_turns: usize,
    pub csv_mode: CsvMode,
    pub summary_enabled: bool,
    pub summary_prefix_chars: usize,

    pub max_sessions: usize,
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let api_key = vars
            .get("GROQ_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            host: vars
                .get("BACKEND_HOST")
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: vars.parse("BACKEND_PORT", 3010)?,
            api_key,
            base_url: vars
                .get("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: vars
                .get("GROQ_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout_secs: vars.parse("LLM_TIMEOUT_SECS", 60)?,
            chunk_size: vars.parse("CHUNK_SIZE", 1000)?,
            chunk_overlap: vars.parse("CHUNK_OVERLAP", 200)?,
            max_context_budget: vars.parse("MAX_CONTEXT_BUDGET", 3000)?,
            budget_unit: vars.parse("CONTEXT_BUDGET_UNIT", BudgetUnit::Tokens)?,
            history_turns: vars.parse("HISTORY_TURNS", 4)?,
            csv_mode: vars.parse("CSV_MODE", CsvMode::Summary)?,
            summary_enabled: vars.flag("SUMMARY_ENABLED", true)?,
            summary_prefix_chars: vars.parse("SUMMARY_PREFIX_CHARS", 3000)?,
            max_sessions: vars.parse("MAX_SESSIONS", 256)?,
            max_upload_bytes: vars.parse("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    pub fn prompt_options(&self) -> PromptOptions {
        let history_window = if self.history_turns == 0 {
            HistoryWindow::Full
        } else {
            HistoryWindow::Last(self.history_turns)
        };
        PromptOptions {
            max_context_budget: self.max_context_budget,
            history_window,
        }
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                }),
            },
            None => Ok(default),
        }
    }
}
