//! # agent-core
//!
//! Provider-agnostic orchestration primitives: the model backend seam with
//! ordered fallback, per-conversation append-only memory, and the analysis
//! audit log.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Request pipeline                        │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ MemoryStore │  │  ModelChain │  │   ModelBackend      │  │
//! │  │  (history)  │──│ (fallback)  │──│   (one invocation)  │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ModelBackend` trait enables swapping between a CLI subprocess, a
//! hosted API, or a test double without changing pipeline logic.

pub mod audit;
pub mod backend;
pub mod error;
pub mod memory;
pub mod message;

pub use audit::{AuditRecord, QueryLog};
pub use backend::{
    strip_diagnostics, AnalysisResult, AttemptOutcome, ChainRun, ModelAttempt, ModelBackend,
    ModelChain,
};
pub use error::{AgentError, Result};
pub use memory::{FileMemoryStore, MemoryStore};
pub use message::{ConversationId, MemoryEntry, Role, UserQuery};
