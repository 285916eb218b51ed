//! HTTP Feed Retrieval
//!
//! Minimal RSS/Atom entry extraction over `reqwest`. Feeds in the wild are
//! messy; this parser pulls out the four fields the aggregator needs and
//! treats anything absent as an empty string.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::news::{FeedEntry, FeedFetcher, FeedSource};

static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(?:item|entry)[\s>](.*?)</(?:item|entry)>").expect("item regex"));
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").expect("title regex"));
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:description|summary)[^>]*>(.*?)</(?:description|summary)>")
        .expect("summary regex")
});
static PUBLISHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:pubDate|published|updated)[^>]*>(.*?)</(?:pubDate|published|updated)>")
        .expect("published regex")
});
static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<link[^>]*>(.*?)</link>").expect("link regex"));
static LINK_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<link[^>]*href="([^"]*)""#).expect("link href regex"));
static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<!\[CDATA\[(.*)\]\]>\s*$").expect("cdata regex"));

/// `FeedFetcher` over plain HTTP GET
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("coincub/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("http client");
        Self { client }
    }
}

impl Default for HttpFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>> {
        let body = self
            .client
            .get(&source.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let entries = parse_entries(&body);
        debug!(source = %source.name, count = entries.len(), "feed fetched");
        Ok(entries)
    }
}

/// Extract entries from an RSS `<item>` or Atom `<entry>` document.
fn parse_entries(body: &str) -> Vec<FeedEntry> {
    ITEM.captures_iter(body)
        .map(|item| {
            let block = &item[1];
            FeedEntry {
                title: field(&TITLE, block),
                summary: field(&SUMMARY, block),
                published: field(&PUBLISHED, block),
                link: link_field(block),
            }
        })
        .collect()
}

fn field(re: &Regex, block: &str) -> String {
    re.captures(block)
        .map(|cap| clean_text(&cap[1]))
        .unwrap_or_default()
}

/// RSS puts the URL in the tag body; Atom uses a self-closing `href` link.
fn link_field(block: &str) -> String {
    let tagged = field(&LINK_TAG, block);
    if !tagged.is_empty() {
        return tagged;
    }
    LINK_HREF
        .captures(block)
        .map(|cap| cap[1].to_string())
        .unwrap_or_default()
}

/// Strip CDATA wrappers and decode the handful of entities feeds use.
fn clean_text(raw: &str) -> String {
    let text = CDATA
        .captures(raw)
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| raw.to_string());

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Desk</title>
    <item>
      <title><![CDATA[Bitcoin &amp; friends rally]]></title>
      <description>BTC leads the market higher</description>
      <pubDate>Tue, 04 Aug 2026 10:00:00 GMT</pubDate>
      <link>https://example.com/btc-rally</link>
    </item>
    <item>
      <title>Quiet day for alts</title>
      <link>https://example.com/alts</link>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title type="html">Solana upgrade ships</title>
    <summary>Validators report smooth rollout</summary>
    <published>2026-08-04T10:00:00Z</published>
    <link href="https://example.com/sol-upgrade"/>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_are_extracted() {
        let entries = parse_entries(RSS_SAMPLE);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Bitcoin & friends rally");
        assert_eq!(entries[0].summary, "BTC leads the market higher");
        assert_eq!(entries[0].published, "Tue, 04 Aug 2026 10:00:00 GMT");
        assert_eq!(entries[0].link, "https://example.com/btc-rally");
    }

    #[test]
    fn missing_fields_are_empty_strings() {
        let entries = parse_entries(RSS_SAMPLE);
        assert_eq!(entries[1].summary, "");
        assert_eq!(entries[1].published, "");
    }

    #[test]
    fn atom_entries_are_extracted() {
        let entries = parse_entries(ATOM_SAMPLE);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Solana upgrade ships");
        assert_eq!(entries[0].link, "https://example.com/sol-upgrade");
        assert_eq!(entries[0].published, "2026-08-04T10:00:00Z");
    }

    #[test]
    fn garbage_documents_yield_no_entries() {
        assert!(parse_entries("not xml at all").is_empty());
        assert!(parse_entries("<rss><channel></channel></rss>").is_empty());
    }
}
