//! Bot Configuration
//!
//! Environment-driven, loaded once at startup. The bot token is the only
//! hard requirement; unset feed sources are skipped silently and every
//! other knob has a default.

use std::path::PathBuf;
use std::time::Duration;

use crypto_analyst::news::FeedSource;

use crate::error::{BotError, Result};

/// Models tried in order of preference.
const DEFAULT_MODELS: &[&str] = &["gemini-2.5-pro", "gemini-2.5-flash", "gemini-1.5-flash"];

/// Wall-clock budget for one model attempt.
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 300;

/// Named feed sources and the environment variables holding their URLs.
const FEED_VARS: &[(&str, &str)] = &[
    ("CoinDesk", "RSS_COINDESK"),
    ("CoinTelegraph", "RSS_COINTELEGRAPH"),
    ("Decrypt", "RSS_DECRYPT"),
];

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Telegram bot token from @BotFather
    pub bot_token: String,

    /// Feed sources with a configured URL
    pub feeds: Vec<FeedSource>,

    /// Directory holding per-conversation memory files
    pub memory_dir: PathBuf,

    /// Path of the audit query log
    pub query_log_path: PathBuf,

    /// Model fallback order
    pub models: Vec<String>,

    /// Per-model-attempt timeout
    pub attempt_timeout: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("COINCUB_BOT_TOKEN")
            .map_err(|_| BotError::Config("COINCUB_BOT_TOKEN is not set".into()))?;

        let feeds = FEED_VARS
            .iter()
            .filter_map(|(name, var)| {
                std::env::var(var)
                    .ok()
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| FeedSource {
                        name: (*name).to_string(),
                        url,
                    })
            })
            .collect();

        let models = std::env::var("COINCUB_MODELS")
            .map(|raw| {
                raw.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect());

        let attempt_timeout = std::env::var("COINCUB_MODEL_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map_or(Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS), Duration::from_secs);

        Ok(Self {
            bot_token,
            feeds,
            memory_dir: std::env::var("COINCUB_MEMORY_DIR")
                .map_or_else(|_| PathBuf::from("memory"), PathBuf::from),
            query_log_path: std::env::var("COINCUB_QUERY_LOG")
                .map_or_else(|_| PathBuf::from("query_log.json"), PathBuf::from),
            models,
            attempt_timeout,
        })
    }
}
