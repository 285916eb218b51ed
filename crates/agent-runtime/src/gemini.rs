//! Gemini CLI Backend
//!
//! Runs the `gemini` command-line client as a subprocess, one process per
//! model attempt: prompt on stdin, analysis on stdout. The chain owns
//! timeout policy, so a timed-out future must take its child with it
//! (`kill_on_drop`).

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use agent_core::{AgentError, ModelBackend, Result};

/// Gemini CLI backend configuration
#[derive(Clone, Debug)]
pub struct GeminiCliConfig {
    /// Executable to invoke
    pub program: String,
}

impl Default for GeminiCliConfig {
    fn default() -> Self {
        Self {
            program: "gemini".into(),
        }
    }
}

impl GeminiCliConfig {
    pub fn from_env() -> Self {
        let program = std::env::var("GEMINI_BIN").unwrap_or_else(|_| "gemini".into());
        Self { program }
    }
}

/// `ModelBackend` over the Gemini CLI
pub struct GeminiCliBackend {
    config: GeminiCliConfig,
}

impl GeminiCliBackend {
    pub fn new(config: GeminiCliConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(GeminiCliConfig::from_env())
    }
}

#[async_trait]
impl ModelBackend for GeminiCliBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        debug!(model = %model, program = %self.config.program, "spawning model process");

        let mut child = Command::new(&self.config.program)
            .arg("--model")
            .arg(model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AgentError::ModelInvocation(format!("failed to spawn '{}': {e}", self.config.program))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A fast-failing process may close stdin before the prompt is
            // fully written; the exit status decides what that means.
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                debug!(model = %model, error = %e, "prompt write interrupted");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("process wait failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentError::ModelInvocation(format!(
                "'{}' exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
