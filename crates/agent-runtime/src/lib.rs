//! # agent-runtime
//!
//! Concrete model backends for the analysis pipeline.
//!
//! ## Backends
//!
//! - **Gemini CLI** (default): subprocess invocation of the `gemini`
//!   command-line client
//!
//! The `ModelBackend` seam in `agent-core` keeps hosted-API backends
//! pluggable without pipeline changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::GeminiCliBackend;
//!
//! let backend = GeminiCliBackend::from_env();
//! let chain = ModelChain::new(Arc::new(backend), models, timeout);
//! ```

pub mod gemini;

pub use gemini::{GeminiCliBackend, GeminiCliConfig};

// Re-export core types for convenience
pub use agent_core::{AgentError, ModelBackend, ModelChain, Result};
