use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: ApiKey,
    pub anthropic_api_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Ingest truncation budget, in characters.
    pub research_char_budget: usize,
    pub max_output_tokens: u32,
    pub preview_chars: usize,
    /// When set, every session log is mirrored to `{dir}/{session_id}.csv`.
    pub snapshot_dir: Option<PathBuf>,
    pub prompt_template_path: Option<PathBuf>,
    pub persona: Option<String>,
    pub generation_rate_limit: usize,
    pub generation_rate_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            anthropic_api_key: ApiKey::new(require_env("ANTHROPIC_API_KEY")?),
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            research_char_budget: parse_env("RESEARCH_CHAR_BUDGET", 8_000)?,
            max_output_tokens: parse_env("MAX_OUTPUT_TOKENS", 2_000)?,
            preview_chars: parse_env("PREVIEW_CHARS", 150)?,
            snapshot_dir: optional_env("PROSPECT_SNAPSHOT_DIR").map(PathBuf::from),
            prompt_template_path: optional_env("PROMPT_TEMPLATE_PATH").map(PathBuf::from),
            persona: optional_env("SALES_PERSONA"),
            generation_rate_limit: parse_env("GENERATION_RATE_LIMIT", 5)?,
            generation_rate_window_secs: parse_env("GENERATION_RATE_WINDOW_SECS", 60)?,
        };

        if config.research_char_budget == 0 {
            anyhow::bail!("RESEARCH_CHAR_BUDGET must be greater than zero");
        }
        if config.max_output_tokens == 0 {
            anyhow::bail!("MAX_OUTPUT_TOKENS must be greater than zero");
        }

        Ok(config)
    }
}

/// Completion-service credential. Never printed, not even in `Debug` output.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
