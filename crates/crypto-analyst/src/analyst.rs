//! Analysis Invocation
//!
//! Drives the model chain with a task-specific prompt and records every
//! successful analysis in the audit log. Infallible by design: backend
//! failures fold into a failure `AnalysisResult` instead of an error, so
//! the orchestrator always has exactly one result to deliver.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use agent_core::{AgentError, AnalysisResult, ConversationId, MemoryEntry, ModelChain, QueryLog};

use crate::prompt::{build_prompt, AnalysisTask};

pub struct Analyst {
    chain: ModelChain,
    audit: Arc<QueryLog>,
}

impl Analyst {
    pub fn new(chain: ModelChain, audit: Arc<QueryLog>) -> Self {
        Self { chain, audit }
    }

    /// Run one analysis end to end.
    ///
    /// Each failed model's identifier is forwarded on `notices` as it
    /// happens; the caller decides what (if anything) to tell the user.
    pub async fn analyze(
        &self,
        identifiers: &[String],
        context_block: &str,
        raw_query: &str,
        conversation: &ConversationId,
        memory: &[MemoryEntry],
        notices: Option<&mpsc::UnboundedSender<String>>,
    ) -> AnalysisResult {
        let task = AnalysisTask::from_identifiers(identifiers);
        let prompt = build_prompt(&task, context_block, memory, raw_query);

        info!(conversation = %conversation, task = %task, "dispatching analysis");
        let run = self.chain.run(&prompt, notices).await;

        match run.output {
            Some(text) => {
                if let Err(e) = self.audit.append(conversation, raw_query, &text).await {
                    warn!(conversation = %conversation, error = %e, "audit log write failed");
                }
                AnalysisResult {
                    text,
                    succeeded: true,
                }
            }
            None => {
                warn!(
                    conversation = %conversation,
                    attempts = run.attempts.len(),
                    "all models exhausted"
                );
                AnalysisResult {
                    text: AgentError::AllModelsExhausted.user_message(),
                    succeeded: false,
                }
            }
        }
    }
}
