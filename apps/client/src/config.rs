use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_DATA_DIR: &str = ".interview-client";

/// Client configuration loaded from environment variables.
/// Read once at startup; components receive clones, never the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP base address of the backend. Empty means "relative to the current origin",
    /// which for this client only works when callers pass absolute URLs.
    pub api_base_url: String,
    /// Root for the credential file and the draft object store.
    pub data_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: optional_env("API_BASE_URL")?.unwrap_or_default(),
            data_dir: optional_env("DATA_DIR")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Builds a config without touching the environment.
    pub fn new(api_base_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Config {
            api_base_url: api_base_url.into(),
            data_dir: data_dir.into(),
            rust_log: "info".to_string(),
        }
    }

    /// The base address for real-time endpoints, `None` when unset or blank.
    pub fn realtime_base(&self) -> Option<&str> {
        let trimmed = self.api_base_url.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

fn optional_env(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Environment variable '{key}' is not valid UTF-8")),
    }
}
