//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Core error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model invocation failed (spawn fault, nonzero exit, transport error)
    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    /// Model attempt exceeded its wall-clock budget
    #[error("Model '{model}' timed out after {seconds}s")]
    ModelTimeout { model: String, seconds: u64 },

    /// Model ran but produced no usable output
    #[error("Model '{0}' returned empty output")]
    EmptyOutput(String),

    /// Every configured model failed or returned nothing usable
    #[error("All configured models failed to respond")]
    AllModelsExhausted,

    /// Memory store failure
    #[error("Memory error: {0}")]
    Memory(String),

    /// Audit log failure
    #[error("Audit log error: {0}")]
    Audit(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable with a different model
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::ModelInvocation(_)
                | AgentError::ModelTimeout { .. }
                | AgentError::EmptyOutput(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::AllModelsExhausted => {
                "A critical error occurred: all available AI models failed to respond. Please try again later.".into()
            }
            AgentError::ModelTimeout { .. } | AgentError::ModelInvocation(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
