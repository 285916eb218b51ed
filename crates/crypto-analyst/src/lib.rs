//! # crypto-analyst
//!
//! Crypto token analysis on top of `agent-core`: deterministic token
//! entity extraction, news context aggregation across configured feeds,
//! and prompt-driven model invocation with audit logging.
//!
//! ## Request shape
//!
//! ```text
//! query text ──▶ TokenExtractor ──▶ identifiers
//! identifiers ─▶ NewsAggregator ──▶ context block
//! everything ──▶ Analyst ─────────▶ AnalysisResult
//! ```
//!
//! The number of extracted identifiers selects the prompt branch: one
//! token gets a deep analysis, two get a side-by-side comparison, zero or
//! three-plus fall back to general conversation.

pub mod analyst;
pub mod error;
pub mod extract;
pub mod feed;
pub mod news;
pub mod prompt;

pub use analyst::Analyst;
pub use error::{AnalystError, Result};
pub use extract::TokenExtractor;
pub use feed::HttpFeedFetcher;
pub use news::{render_context, Article, FeedEntry, FeedFetcher, FeedSource, NewsAggregator};
pub use prompt::{build_prompt, AnalysisTask};
