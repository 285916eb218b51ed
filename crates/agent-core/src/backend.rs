//! Model Backend Abstraction
//!
//! Defines the seam between the analysis pipeline and concrete generative
//! backends, plus the ordered-fallback chain that drives them.
//!
//! The chain tries a fixed list of model identifiers in order of
//! preference. The first model whose output survives diagnostic stripping
//! wins; everything else (empty output, timeout, invocation fault) records
//! an attempt and advances. There is no retry loop beyond the list.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;

/// A single generative backend invocation.
///
/// Implementations run one model once and return its raw output. A nonzero
/// exit status or transport fault is an `Err`; empty output is `Ok` and
/// left to the chain to classify.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

/// How one model attempt ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    EmptyOutput,
    Timeout,
    Error(String),
}

/// Record of one model attempt within a chain run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelAttempt {
    pub model: String,
    pub outcome: AttemptOutcome,
}

/// Final result of an analysis request
///
/// Exactly one is produced per query. The orchestrator owns persisting it
/// to memory and delivering it to the transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    pub succeeded: bool,
}

/// Outcome of a full chain run
#[derive(Debug)]
pub struct ChainRun {
    /// First usable output, if any model produced one
    pub output: Option<String>,

    /// Every attempt made, in order
    pub attempts: Vec<ModelAttempt>,
}

/// Ordered multi-model fallback runner
pub struct ModelChain {
    backend: Arc<dyn ModelBackend>,
    models: Vec<String>,
    attempt_timeout: Duration,
}

impl ModelChain {
    pub fn new(backend: Arc<dyn ModelBackend>, models: Vec<String>, attempt_timeout: Duration) -> Self {
        Self {
            backend,
            models,
            attempt_timeout,
        }
    }

    /// Models in order of preference
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Try each model in order; the first non-empty output after diagnostic
    /// stripping wins and stops the chain.
    ///
    /// Each failed model's identifier is pushed onto `notices` before
    /// advancing, so the caller can surface degraded service while the
    /// chain is still running.
    pub async fn run(&self, prompt: &str, notices: Option<&mpsc::UnboundedSender<String>>) -> ChainRun {
        let mut attempts = Vec::with_capacity(self.models.len());

        for model in &self.models {
            info!(model = %model, "attempting model");

            let attempt = tokio::time::timeout(self.attempt_timeout, self.backend.generate(model, prompt)).await;
            let outcome = match attempt {
                Ok(Ok(raw)) => {
                    let output = strip_diagnostics(&raw);
                    if output.is_empty() {
                        AttemptOutcome::EmptyOutput
                    } else {
                        info!(model = %model, "model produced a response");
                        attempts.push(ModelAttempt {
                            model: model.clone(),
                            outcome: AttemptOutcome::Success,
                        });
                        return ChainRun {
                            output: Some(output),
                            attempts,
                        };
                    }
                }
                Ok(Err(e)) => AttemptOutcome::Error(e.to_string()),
                Err(_) => AttemptOutcome::Timeout,
            };

            warn!(model = %model, outcome = ?outcome, "model attempt failed, trying next");
            attempts.push(ModelAttempt {
                model: model.clone(),
                outcome,
            });
            if let Some(tx) = notices {
                let _ = tx.send(model.clone());
            }
        }

        ChainRun {
            output: None,
            attempts,
        }
    }
}

/// Drop diagnostic lines (those starting with an `[INFO]` marker) from raw
/// model output and trim the remainder.
pub fn strip_diagnostics(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("[INFO]"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays a scripted sequence of outcomes and records the
    /// models it was asked for.
    struct ScriptedBackend {
        calls: Mutex<Vec<String>>,
        outputs: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedBackend {
        fn new(outputs: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                outputs: Mutex::new(outputs.into()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn generate(&self, model: &str, _prompt: &str) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|m| (*m).to_string()).collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut notices = Vec::new();
        while let Ok(model) = rx.try_recv() {
            notices.push(model);
        }
        notices
    }

    #[tokio::test]
    async fn first_usable_output_wins_after_fallback() {
        let backend = ScriptedBackend::new(vec![Ok(String::new()), Ok(String::new()), Ok("OK".into())]);
        let chain = ModelChain::new(backend.clone(), models(&["alpha", "beta", "gamma"]), Duration::from_secs(5));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = chain.run("prompt", Some(&tx)).await;

        assert_eq!(run.output.as_deref(), Some("OK"));
        assert_eq!(backend.calls(), vec!["alpha", "beta", "gamma"]);
        assert_eq!(drain(&mut rx), vec!["alpha", "beta"]);
        assert_eq!(run.attempts.len(), 3);
        assert_eq!(run.attempts[0].outcome, AttemptOutcome::EmptyOutput);
        assert_eq!(run.attempts[2].outcome, AttemptOutcome::Success);
    }

    #[tokio::test]
    async fn first_model_success_skips_the_rest() {
        let backend = ScriptedBackend::new(vec![Ok("analysis".into())]);
        let chain = ModelChain::new(backend.clone(), models(&["alpha", "beta"]), Duration::from_secs(5));

        let run = chain.run("prompt", None).await;

        assert_eq!(run.output.as_deref(), Some("analysis"));
        assert_eq!(backend.calls(), vec!["alpha"]);
    }

    #[tokio::test]
    async fn exhaustion_notifies_every_failing_model() {
        let backend = ScriptedBackend::new(vec![
            Err(AgentError::ModelInvocation("boom".into())),
            Ok(String::new()),
            Err(AgentError::ModelInvocation("also boom".into())),
        ]);
        let chain = ModelChain::new(backend, models(&["alpha", "beta", "gamma"]), Duration::from_secs(5));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = chain.run("prompt", Some(&tx)).await;

        assert!(run.output.is_none());
        assert_eq!(drain(&mut rx), vec!["alpha", "beta", "gamma"]);
        assert!(matches!(run.attempts[0].outcome, AttemptOutcome::Error(_)));
        assert_eq!(run.attempts[1].outcome, AttemptOutcome::EmptyOutput);
    }

    #[tokio::test]
    async fn slow_model_times_out_and_falls_back() {
        struct SlowThenFast;

        #[async_trait]
        impl ModelBackend for SlowThenFast {
            async fn generate(&self, model: &str, _prompt: &str) -> Result<String> {
                if model == "slow" {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                Ok("late but fine".into())
            }
        }

        let chain = ModelChain::new(Arc::new(SlowThenFast), models(&["slow", "fast"]), Duration::from_millis(50));
        let run = chain.run("prompt", None).await;

        assert_eq!(run.output.as_deref(), Some("late but fine"));
        assert_eq!(run.attempts[0].outcome, AttemptOutcome::Timeout);
        assert_eq!(run.attempts[1].outcome, AttemptOutcome::Success);
    }

    #[test]
    fn diagnostic_lines_are_stripped() {
        let raw = "[INFO] loading model\nReal answer line one.\n  [INFO] tool call trace\nLine two.\n";
        assert_eq!(strip_diagnostics(raw), "Real answer line one.\nLine two.");
    }

    #[test]
    fn all_diagnostics_means_empty() {
        assert_eq!(strip_diagnostics("[INFO] a\n[INFO] b"), "");
        assert_eq!(strip_diagnostics("   \n\n"), "");
    }
}
