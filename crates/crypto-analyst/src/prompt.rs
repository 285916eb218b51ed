//! Analysis Prompt Construction
//!
//! Pure functions from request inputs to the full prompt handed to a model
//! backend. The task branch is a tagged variant selected once per request,
//! never ad hoc string branching at call sites.

use agent_core::{MemoryEntry, Role};

/// Core instruction block shared by every task
pub const ANALYST_PROMPT: &str = r#"You are CoinCub, an AI crypto intelligence assistant embedded in a chat client.

## Core Rules

1. **Ground every claim** - Base analysis on the market data your tools return and the news context provided; never invent prices or events.
2. **Token analysis** - For a single token, cover price action, market cap, volume, 7-day volatility, liquidity, and relevant news, in that order.
3. **Comparisons** - When comparing two tokens, present a Markdown table with one row per metric (Price, Market Cap, Volume, 7D Volatility, Liquidity) and one column per token.
4. **General conversation** - Answer from the conversation history and the news pulse; keep it short and helpful.
5. **Formatting** - Plain Markdown only. No HTML. Keep responses under a few hundred words unless a table is required.
6. **Honesty about gaps** - If a metric is unavailable, say so instead of guessing."#;

/// Appended unconditionally; pins the `interval` parameter of any tool the
/// backend decides to call, whatever the task branch.
pub const SAFETY_NET_PROMPT: &str = r#"---
## ABSOLUTE SAFETY RULE
You have many tools. Sometimes you might choose one that requires an 'interval'.
**IF AND ONLY IF you call a tool that needs an `interval` parameter, you MUST use `"interval": "1d"`.**
This is your only fallback. Your primary goal is to use the tools as described in your main instructions (e.g., for snapshots or comparisons). This rule is to prevent an error if you deviate."#;

/// Task-specific branch of the analysis prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisTask {
    /// Deep analysis of one token
    Single(String),
    /// Side-by-side comparison of two tokens
    Pair(String, String),
    /// General conversation; no implicit tool calls
    General,
}

impl AnalysisTask {
    /// Zero or three-plus identifiers fall back to general conversation.
    pub fn from_identifiers(identifiers: &[String]) -> Self {
        match identifiers {
            [one] => Self::Single(one.clone()),
            [one, two] => Self::Pair(one.clone(), two.clone()),
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for AnalysisTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisTask::Single(token) => write!(f, "single({token})"),
            AnalysisTask::Pair(a, b) => write!(f, "pair({a}, {b})"),
            AnalysisTask::General => write!(f, "general"),
        }
    }
}

/// Render memory entries the way the prompt embeds them.
pub fn render_transcript(memory: &[MemoryEntry]) -> String {
    memory
        .iter()
        .map(|entry| match entry.role {
            Role::User => format!("User: {}", entry.text),
            Role::Assistant => format!("You: {}", entry.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full prompt: base block, exactly one task section, safety net.
pub fn build_prompt(
    task: &AnalysisTask,
    context_block: &str,
    memory: &[MemoryEntry],
    raw_query: &str,
) -> String {
    let transcript = render_transcript(memory);

    let task_section = match task {
        AnalysisTask::Single(token) => format!(
            r#"---
## Current Task
- **Analyze this token:** {token}
- **Recent News:**
{context_block}
- **User History:** {transcript}
- **User's Query:** "{raw_query}"

**Your Instructions:** Perform a full analysis of **{token}**, synthesizing live market data with the **Recent News** provided. Follow your core rules."#
        ),
        AnalysisTask::Pair(first, second) => format!(
            r#"---
## Current Task: Compare Two Tokens
- **Tokens to Compare:** {first} vs {second}
- **Relevant News Context:**
{context_block}
- **User's Query:** "{raw_query}"
- **User History:** {transcript}

**YOUR IMMEDIATE INSTRUCTIONS:**
1. **Use your market data tools** to get the key metrics (Price, Market Cap, Volume, 7D Volatility, and Liquidity) for **both {first} and {second}**.
2. **You MUST generate a Markdown comparison table** using this data, exactly as defined in your core rules.
3. After the table, **you MUST provide a one-line summary** that compares their stability and risk; use the **Relevant News Context** to inform your final summary statement about risk and stability."#
        ),
        AnalysisTask::General => format!(
            r#"---
## Current Task
- **This is a general conversational query.** Do not assume it's about a specific token unless mentioned.
- **General Market News Pulse:**
{context_block}
- **User History:**
{transcript}
- **User's Query:** "{raw_query}"

**Your Instructions:** Follow your core rules for General Conversation. Analyze the user history for context. **Do NOT call any tools unless the user explicitly asks for new data.** Provide a helpful, conversational response."#
        ),
    };

    format!(
        "{ANALYST_PROMPT}\n{}\n{}",
        task_section.trim(),
        SAFETY_NET_PROMPT.trim()
    )
}
