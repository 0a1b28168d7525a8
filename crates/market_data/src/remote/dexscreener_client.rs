use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use common::models::PairSnapshot;
use reqwest::Client;
use tracing::{debug, warn};

use crate::remote::dexscreener_response::SearchResponse;
use crate::remote::USER_AGENT;
use crate::traits::MarketDataSource;

pub struct DexScreenerClient {
    client: Client,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client."),
            base_url: env::var("DEXSCREENER_BASE_URL")
                .unwrap_or_else(|_| "https://api.dexscreener.com".to_string()),
        }
    }

    async fn search(&self, query: &str) -> anyhow::Result<SearchResponse> {
        let url = format!("{}/latest/dex/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from pair search", status);
        }

        response
            .json::<SearchResponse>()
            .await
            .context("Failed to parse JSON response")
    }
}

#[async_trait]
impl MarketDataSource for DexScreenerClient {
    async fn fetch_pair(&self, ticker: &str) -> Option<PairSnapshot> {
        let symbol = ticker.trim_start_matches('$');

        match self.search(symbol).await {
            Ok(response) => {
                let snapshot = response.best_match(symbol).map(|p| p.to_snapshot(ticker));
                if snapshot.is_none() {
                    debug!("No tradable pair found for {}", ticker);
                }
                snapshot
            }
            Err(e) => {
                warn!("Pair lookup failed for {}: {:#}", ticker, e);
                None
            }
        }
    }
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self::new()
    }
}
