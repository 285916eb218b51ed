//! News Context Aggregation
//!
//! Retrieves recent headlines from configured feed sources and filters
//! them by token identifier. Feed mechanics sit behind the `FeedFetcher`
//! seam; an unreachable or unconfigured source is skipped, never surfaced.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// A configured feed source
#[derive(Clone, Debug)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// One raw feed entry; absent fields are empty strings
#[derive(Clone, Debug, Default)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub published: String,
    pub link: String,
}

/// A headline ready for prompt context. Request-scoped, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub title: String,
    /// Raw publish string from the feed; parsed only for sorting
    pub published: String,
    pub link: String,
}

/// Retrieval seam for one feed source
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>>;
}

/// Headline aggregation across all configured sources
pub struct NewsAggregator {
    fetcher: Arc<dyn FeedFetcher>,
    sources: Vec<FeedSource>,
}

impl NewsAggregator {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, sources: Vec<FeedSource>) -> Self {
        Self { fetcher, sources }
    }

    /// Most-recent-first headlines, at most `max_count`.
    ///
    /// With no identifier every entry qualifies (general market pulse).
    /// With an identifier, an entry qualifies only when the identifier
    /// appears in the lowercase title+summary as a whole word or as a
    /// sigil-prefixed whole word.
    pub async fn fetch_headlines(&self, identifier: Option<&str>, max_count: usize) -> Vec<Article> {
        let matcher = identifier.map(identifier_matcher);
        let mut articles = Vec::new();

        for source in &self.sources {
            let entries = match self.fetcher.fetch(source).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(source = %source.name, error = %e, "feed unavailable, skipping");
                    continue;
                }
            };

            for entry in entries {
                if let Some(re) = &matcher {
                    let combined = format!("{} {}", entry.title, entry.summary).to_lowercase();
                    if !re.is_match(&combined) {
                        continue;
                    }
                }
                articles.push(Article {
                    source: source.name.clone(),
                    title: entry.title.trim().to_string(),
                    published: entry.published.trim().to_string(),
                    link: entry.link.trim().to_string(),
                });
            }
        }

        sort_most_recent_first(&mut articles);
        articles.truncate(max_count);
        articles
    }
}

/// Render headlines as the markdown block embedded in prompts.
pub fn render_context(articles: &[Article], empty_label: &str) -> String {
    if articles.is_empty() {
        return empty_label.to_string();
    }
    articles
        .iter()
        .map(|a| format!("- \u{201c}{}\u{201d} — {}, {}", a.title, a.source, a.published))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whole word, optionally sigil-prefixed.
fn identifier_matcher(identifier: &str) -> Regex {
    let escaped = regex::escape(&identifier.to_lowercase());
    Regex::new(&format!(r"(\b|\$){escaped}\b")).expect("identifier regex")
}

/// Sort newest-first by best-effort publish date. If any entry fails to
/// parse, keep feed-native order; a sorting problem must never propagate.
fn sort_most_recent_first(articles: &mut Vec<Article>) {
    let dates: Option<Vec<DateTime<FixedOffset>>> = articles
        .iter()
        .map(|a| parse_publish_date(&a.published))
        .collect();

    let Some(dates) = dates else {
        debug!("unparseable publish date, keeping feed order");
        return;
    };

    let mut keyed: Vec<_> = dates.into_iter().zip(std::mem::take(articles)).collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    articles.extend(keyed.into_iter().map(|(_, article)| article));
}

/// RFC 2822 (the RSS convention) first, then RFC 3339 (Atom).
fn parse_publish_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalystError;

    /// Fetcher with canned entries per source name.
    struct CannedFetcher {
        entries: Vec<(&'static str, Vec<FeedEntry>)>,
    }

    #[async_trait]
    impl FeedFetcher for CannedFetcher {
        async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>> {
            self.entries
                .iter()
                .find(|(name, _)| *name == source.name)
                .map(|(_, entries)| entries.clone())
                .ok_or_else(|| AnalystError::Feed(format!("no such feed: {}", source.name)))
        }
    }

    fn entry(title: &str, summary: &str, published: &str) -> FeedEntry {
        FeedEntry {
            title: title.into(),
            summary: summary.into(),
            published: published.into(),
            link: "https://example.com/a".into(),
        }
    }

    fn source(name: &str) -> FeedSource {
        FeedSource {
            name: name.into(),
            url: format!("https://example.com/{name}"),
        }
    }

    fn aggregator(entries: Vec<(&'static str, Vec<FeedEntry>)>, sources: &[&str]) -> NewsAggregator {
        NewsAggregator::new(
            Arc::new(CannedFetcher { entries }),
            sources.iter().copied().map(source).collect(),
        )
    }

    #[tokio::test]
    async fn no_identifier_includes_everything() {
        let agg = aggregator(
            vec![(
                "Desk",
                vec![
                    entry("Bitcoin rallies", "", "Tue, 04 Aug 2026 10:00:00 GMT"),
                    entry("Quiet day for alts", "", "Tue, 04 Aug 2026 09:00:00 GMT"),
                ],
            )],
            &["Desk"],
        );

        let articles = agg.fetch_headlines(None, 6).await;
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn identifier_requires_whole_word() {
        let agg = aggregator(
            vec![(
                "Desk",
                vec![
                    entry("PEPE jumps 20%", "", ""),
                    entry("Pepefork drama continues", "", ""),
                    entry("Markets wobble", "frogs and pepe memes", ""),
                ],
            )],
            &["Desk"],
        );

        let articles = agg.fetch_headlines(Some("pepe"), 6).await;
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["PEPE jumps 20%", "Markets wobble"]);
    }

    #[tokio::test]
    async fn sigil_prefixed_mention_matches() {
        let agg = aggregator(
            vec![("Desk", vec![entry("Traders pile into $sol today", "", "")])],
            &["Desk"],
        );

        assert_eq!(agg.fetch_headlines(Some("sol"), 6).await.len(), 1);
    }

    #[tokio::test]
    async fn newest_first_when_dates_parse() {
        let agg = aggregator(
            vec![(
                "Desk",
                vec![
                    entry("older", "", "Mon, 03 Aug 2026 10:00:00 GMT"),
                    entry("newest", "", "Wed, 05 Aug 2026 10:00:00 GMT"),
                    entry("middle", "", "Tue, 04 Aug 2026 10:00:00 GMT"),
                ],
            )],
            &["Desk"],
        );

        let titles: Vec<_> = agg
            .fetch_headlines(None, 6)
            .await
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["newest", "middle", "older"]);
    }

    #[tokio::test]
    async fn unparseable_date_keeps_feed_order() {
        let agg = aggregator(
            vec![(
                "Desk",
                vec![
                    entry("first", "", "Mon, 03 Aug 2026 10:00:00 GMT"),
                    entry("second", "", "sometime last week"),
                    entry("third", "", "Wed, 05 Aug 2026 10:00:00 GMT"),
                ],
            )],
            &["Desk"],
        );

        let titles: Vec<_> = agg
            .fetch_headlines(None, 6)
            .await
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn truncates_to_max_count() {
        let entries = (0..10)
            .map(|i| entry(&format!("headline {i}"), "", ""))
            .collect();
        let agg = aggregator(vec![("Desk", entries)], &["Desk"]);

        assert_eq!(agg.fetch_headlines(None, 3).await.len(), 3);
    }

    #[tokio::test]
    async fn failing_source_is_skipped_silently() {
        let agg = aggregator(
            vec![("Desk", vec![entry("still here", "", "")])],
            &["Ghost", "Desk"],
        );

        let articles = agg.fetch_headlines(None, 6).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "Desk");
    }

    #[test]
    fn context_renders_one_line_per_headline() {
        let articles = vec![Article {
            source: "Desk".into(),
            title: "Bitcoin rallies".into(),
            published: "Tue, 04 Aug 2026 10:00:00 GMT".into(),
            link: String::new(),
        }];

        let block = render_context(&articles, "No relevant news found.");
        assert!(block.contains("Bitcoin rallies"));
        assert!(block.contains("Desk"));

        assert_eq!(render_context(&[], "No relevant news found."), "No relevant news found.");
    }
}
