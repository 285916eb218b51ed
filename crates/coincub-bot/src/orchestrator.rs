//! Request Orchestration
//!
//! Drives one analysis request end to end: entity extraction, news
//! context, memory read/write, model invocation with fallback notices,
//! and exactly one consolidated reply. A typing indicator runs for the
//! whole invocation span and is cancelled on every path out of it.
//!
//! Memory gets both halves of the turn regardless of outcome: the user's
//! query before invocation, the assistant's final text (success or
//! failure message) after. The next request's memory read then always
//! sees a complete pair.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use agent_core::{ConversationId, MemoryStore, Role, UserQuery};
use crypto_analyst::analyst::Analyst;
use crypto_analyst::extract::TokenExtractor;
use crypto_analyst::news::{render_context, NewsAggregator};

use crate::telegram::ChatTransport;

/// Headline budget for zero-or-one-identifier requests.
const GENERAL_HEADLINES: usize = 6;

/// Headline budget per identifier when comparing two tokens.
const COMPARISON_HEADLINES: usize = 3;

/// Interval between typing indicator emissions.
const TYPING_INTERVAL: Duration = Duration::from_secs(4);

/// Reply for empty queries.
const USAGE_HINT: &str = "Please provide a token or question after the command. Example: `/ask btc`";

/// Lines mentioning these fragments are dropped from model output before
/// delivery; the backend must never echo local filesystem artifacts.
const BLOCKED_FRAGMENTS: &[&str] = &[".env", "readme", ".toml", "working directory"];

pub struct Orchestrator {
    transport: Arc<dyn ChatTransport>,
    memory: Arc<dyn MemoryStore>,
    extractor: Arc<TokenExtractor>,
    news: Arc<NewsAggregator>,
    analyst: Arc<Analyst>,
    typing_interval: Duration,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        memory: Arc<dyn MemoryStore>,
        extractor: Arc<TokenExtractor>,
        news: Arc<NewsAggregator>,
        analyst: Arc<Analyst>,
    ) -> Self {
        Self {
            transport,
            memory,
            extractor,
            news,
            analyst,
            typing_interval: TYPING_INTERVAL,
        }
    }

    /// Override the typing cadence (tests want milliseconds, not seconds).
    pub fn with_typing_interval(mut self, interval: Duration) -> Self {
        self.typing_interval = interval;
        self
    }

    /// Handle one query end to end, delivering exactly one reply.
    pub async fn handle_query(&self, query: UserQuery) {
        let conversation = query.conversation;
        let text = query.text.trim().to_string();

        if text.is_empty() {
            self.reply(&conversation, USAGE_HINT).await;
            return;
        }

        if let Err(e) = self.memory.append(&conversation, Role::User, &text).await {
            warn!(conversation = %conversation, error = %e, "user memory write failed");
        }

        debug!(conversation = %conversation, "extracting identifiers");
        let identifiers = self.extractor.extract(&text);

        debug!(conversation = %conversation, count = identifiers.len(), "aggregating context");
        let context_block = self.gather_context(&identifiers).await;

        let memory = self.memory.read(&conversation).await;

        // Liveness signal for the whole invocation span, cancelled exactly
        // once on every path out of the invocation below.
        let typing = TypingTask::spawn(
            self.transport.clone(),
            conversation.to_string(),
            self.typing_interval,
        );

        // Fallback notices arrive as channel messages from the chain; the
        // listener delivers at most one user-visible notice per request.
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let notice_sent = Arc::new(AtomicBool::new(false));
        let listener =
            self.spawn_notice_listener(notice_rx, conversation.to_string(), notice_sent.clone());

        let result = self
            .analyst
            .analyze(
                &identifiers,
                &context_block,
                &text,
                &conversation,
                &memory,
                Some(&notice_tx),
            )
            .await;
        drop(notice_tx);

        typing.stop().await;
        // The listener drains and exits once the chain's sender is gone.
        let _ = listener.await;

        if let Err(e) = self.memory.append(&conversation, Role::Assistant, &result.text).await {
            warn!(conversation = %conversation, error = %e, "assistant memory write failed");
        }

        // A failed analysis stays quiet when the fallback notice already
        // told the user something went wrong.
        if result.succeeded || !notice_sent.load(Ordering::SeqCst) {
            self.reply(&conversation, &result.text).await;
        }

        info!(conversation = %conversation, succeeded = result.succeeded, "request finished");
    }

    /// Identifier count shapes the headline budget: 6 for zero or one, 3
    /// per identifier for a comparison (fetched per identifier, then
    /// concatenated), general pulse for three or more.
    async fn gather_context(&self, identifiers: &[String]) -> String {
        match identifiers {
            [single] => {
                let headlines = self.news.fetch_headlines(Some(single), GENERAL_HEADLINES).await;
                render_context(&headlines, "No relevant news found.")
            }
            [first, second] => {
                let mut headlines = self
                    .news
                    .fetch_headlines(Some(first), COMPARISON_HEADLINES)
                    .await;
                headlines.extend(
                    self.news
                        .fetch_headlines(Some(second), COMPARISON_HEADLINES)
                        .await,
                );
                render_context(&headlines, "No relevant news found.")
            }
            _ => {
                let headlines = self.news.fetch_headlines(None, GENERAL_HEADLINES).await;
                render_context(&headlines, "No general news found.")
            }
        }
    }

    fn spawn_notice_listener(
        &self,
        mut rx: mpsc::UnboundedReceiver<String>,
        chat_id: String,
        sent: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            while let Some(model) = rx.recv().await {
                if sent.swap(true, Ordering::SeqCst) {
                    continue;
                }
                let notice = format!(
                    "My primary AI model (`{model}`) appears to be busy. I'm trying a faster alternative..."
                );
                if let Err(e) = transport.send_reply(&chat_id, &notice).await {
                    warn!(chat_id = %chat_id, error = %e, "fallback notice delivery failed");
                }
            }
        })
    }

    async fn reply(&self, conversation: &ConversationId, text: &str) {
        let cleaned = clean_response(text);
        if let Err(e) = self.transport.send_reply(conversation.as_str(), &cleaned).await {
            error!(conversation = %conversation, error = %e, "reply delivery failed");
        }
    }
}

/// Drop lines that mention local filesystem or config artifacts.
pub fn clean_response(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let lowered = line.to_lowercase();
            !BLOCKED_FRAGMENTS.iter().any(|fragment| lowered.contains(fragment))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Recurring typing indicator, alive for the invocation span only.
///
/// A failed emission is logged and the loop continues; the indicator never
/// aborts the analysis it decorates. Cancellation is structured: `stop`
/// triggers the token and awaits the task, so no emission can race past it.
struct TypingTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TypingTask {
    fn spawn(transport: Arc<dyn ChatTransport>, chat_id: String, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = transport.send_typing(&chat_id).await {
                    warn!(chat_id = %chat_id, error = %e, "typing indicator failed");
                }
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
            }
        });
        Self { cancel, handle }
    }

    async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}
