//! CoinCub Telegram Bot
//!
//! Crypto intelligence assistant: extracts token entities from chat
//! queries, gathers fresh news context from configured feeds, and drives
//! an ordered multi-model fallback chain to produce exactly one
//! consolidated analysis per request.

mod bot;
mod config;
mod error;
mod orchestrator;
mod telegram;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{FileMemoryStore, ModelChain, QueryLog};
use agent_runtime::GeminiCliBackend;
use crypto_analyst::analyst::Analyst;
use crypto_analyst::extract::TokenExtractor;
use crypto_analyst::feed::HttpFeedFetcher;
use crypto_analyst::news::NewsAggregator;

use crate::bot::Bot;
use crate::config::BotConfig;
use crate::orchestrator::Orchestrator;
use crate::telegram::{TelegramClient, TelegramTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = BotConfig::from_env()?;

    if config.feeds.is_empty() {
        tracing::warn!("no feed sources configured - analyses will run without news context");
    } else {
        for feed in &config.feeds {
            tracing::info!(source = %feed.name, "feed configured");
        }
    }
    tracing::info!(models = ?config.models, "model fallback order");

    // Storage
    let memory = Arc::new(FileMemoryStore::new(config.memory_dir.clone()));
    let audit = Arc::new(QueryLog::new(config.query_log_path.clone()));

    // Analysis pipeline
    let news = Arc::new(NewsAggregator::new(
        Arc::new(HttpFeedFetcher::new()),
        config.feeds.clone(),
    ));
    let chain = ModelChain::new(
        Arc::new(GeminiCliBackend::from_env()),
        config.models.clone(),
        config.attempt_timeout,
    );
    let analyst = Arc::new(Analyst::new(chain, audit));

    // Transport
    let client = TelegramClient::new(&config.bot_token);
    let transport = Arc::new(TelegramTransport::new(client.clone()));

    let orchestrator = Arc::new(Orchestrator::new(
        transport.clone(),
        memory,
        Arc::new(TokenExtractor::default()),
        news,
        analyst,
    ));

    Bot::new(client, transport, orchestrator).run().await;

    Ok(())
}
