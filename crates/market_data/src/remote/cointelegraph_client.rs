use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::remote::USER_AGENT;
use crate::traits::NewsSource;

/// Headlines kept per digest.
const MAX_HEADLINES: usize = 5;

pub struct CointelegraphClient {
    client: Client,
    feed_url: String,
}

impl CointelegraphClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client."),
            feed_url: env::var("NEWS_FEED_URL")
                .unwrap_or_else(|_| "https://cointelegraph.com/rss".to_string()),
        }
    }

    async fn fetch_feed(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from news feed", status);
        }

        response.text().await.context("Failed to read feed body")
    }
}

#[async_trait]
impl NewsSource for CointelegraphClient {
    async fn fetch_digest(&self, ticker: &str) -> String {
        match self.fetch_feed().await {
            Ok(feed) => digest_for(&extract_titles(&feed), ticker),
            Err(e) => {
                warn!("News fetch failed for {}: {:#}", ticker, e);
                String::new()
            }
        }
    }
}

impl Default for CointelegraphClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls headline titles out of an RSS document with a plain text scan.
/// Only titles inside <item> blocks count, which skips the channel's own
/// <title> element.
pub fn extract_titles(feed: &str) -> Vec<String> {
    feed.split("<item>")
        .skip(1)
        .filter_map(|chunk| find_tag(chunk, "title"))
        .collect()
}

/// Joins the headlines that mention the ticker, case-insensitively and
/// ignoring any leading "$".
pub fn digest_for(titles: &[String], ticker: &str) -> String {
    let needle = ticker.trim_start_matches('$').to_lowercase();
    if needle.is_empty() {
        return String::new();
    }

    titles
        .iter()
        .filter(|t| t.to_lowercase().contains(&needle))
        .take(MAX_HEADLINES)
        .cloned()
        .collect::<Vec<_>>()
        .join(" | ")
}

fn find_tag(chunk: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = chunk.find(&open)? + open.len();
    let end = chunk[start..].find(&close)? + start;

    let raw = chunk[start..end].trim();
    let cleaned = raw
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(raw);

    Some(cleaned.trim().to_string())
}
