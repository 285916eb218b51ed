//! Token Entity Extraction
//!
//! Turns raw user text into an ordered, deduplicated list of candidate
//! token identifiers using a fixed stop-word table and deterministic
//! normalization. Pure: no network, no side effects beyond diagnostic
//! logging. Linguistic correctness is explicitly not the goal; the
//! heuristic only has to be deterministic and cheap.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// `$sym` ticker references: a dollar sign followed by 2-10 alphanumerics.
static SIGIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([a-z0-9]{2,10})").expect("sigil regex"));

/// Everything except word characters, whitespace and hyphens. Apostrophes
/// are removed outright, so "don't" becomes "dont" (which can coalesce two
/// words; accepted quirk).
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("punctuation regex"));

/// Candidate word tokens: alphanumeric-or-hyphen runs of 2-20 characters.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z0-9-]{2,20}\b").expect("word regex"));

/// Words that can never be token identifiers.
const STOP_WORDS: &[&str] = &[
    // Articles, prepositions, pronouns and other grammar glue
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "but", "by", "can", "could", "did", "do", "does", "doing", "for", "from",
    "further", "goes", "going", "had", "has", "have", "having", "he", "her", "how", "i", "if",
    "in", "into", "is", "it", "its", "just", "me", "more", "my", "no", "not", "now", "of", "on",
    "or", "our", "should", "so", "some", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "to", "up", "us", "was", "we", "were", "what", "when", "where",
    "which", "who", "why", "will", "with", "would", "you", "your",
    // Action and intent verbs
    "analyze", "buy", "check", "compare", "comparing", "explain", "find", "get", "give", "go",
    "know", "list", "look", "see", "sell", "show", "tell", "tells", "trade", "view",
    // Financial and crypto boilerplate
    "cap", "chart", "coin", "coins", "crypto", "data", "details", "info", "information",
    "liquidity", "market", "movers", "overview", "performance", "performing", "price", "prices",
    "report", "stats", "summary", "token", "tokens", "value", "volatility", "volume",
    // Descriptive qualifiers
    "bad", "best", "good", "high", "hot", "latest", "low", "new", "recent", "risky", "safe",
    "top", "trending", "trendiest", "trendy", "worse", "worst",
    // Time words
    "currently", "today", "tomorrow", "tmr", "tmrw", "yesterday", "ytd",
    // Quantifiers
    "each", "every", "few", "most",
    // Conversational fillers
    "hello", "help", "hey", "ok", "okay", "please", "pls", "plz", "thank", "thanks", "thx",
    // Comparison connectors
    "versus", "vs",
    // Contraction remnants left over after apostrophe stripping
    "hows", "whats", "whens", "wheres", "whys",
];

/// Stop-word-driven token extractor.
///
/// The word table is built once and never mutated after load; share one
/// instance per process and pass it by reference.
#[derive(Debug)]
pub struct TokenExtractor {
    stop_words: HashSet<&'static str>,
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }
}

impl TokenExtractor {
    /// Extract candidate identifiers, sigil symbols first, deduplicated
    /// preserving first occurrence.
    pub fn extract(&self, raw: &str) -> Vec<String> {
        if raw.trim().is_empty() {
            return Vec::new();
        }

        let lowered = raw.to_lowercase();

        // Sigil symbols first, then strip them so they are not re-extracted
        // as plain words.
        let sigils: Vec<String> = SIGIL
            .captures_iter(&lowered)
            .map(|cap| cap[1].to_string())
            .collect();
        let without_sigils = SIGIL.replace_all(&lowered, "");
        let cleaned = PUNCTUATION.replace_all(&without_sigils, "");

        let words = WORD
            .find_iter(&cleaned)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(token))
            .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string);

        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for token in sigils.into_iter().chain(words) {
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }

        debug!(?tokens, query = raw, "extracted tokens");
        tokens
    }
}
