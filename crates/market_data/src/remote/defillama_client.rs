use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use common::models::ChainFlow;
use reqwest::Client;
use tracing::warn;

use crate::remote::defillama_response::ChainTvl;
use crate::remote::USER_AGENT;
use crate::traits::ChainFlowSource;

pub struct DefiLlamaClient {
    client: Client,
    base_url: String,
}

impl DefiLlamaClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client."),
            base_url: env::var("DEFILLAMA_BASE_URL")
                .unwrap_or_else(|_| "https://api.llama.fi".to_string()),
        }
    }

    async fn fetch_chains(&self) -> anyhow::Result<Vec<ChainTvl>> {
        let url = format!("{}/v2/chains", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from chain TVL endpoint", status);
        }

        response
            .json::<Vec<ChainTvl>>()
            .await
            .context("Failed to parse JSON response")
    }
}

#[async_trait]
impl ChainFlowSource for DefiLlamaClient {
    async fn fetch_flows(&self) -> Vec<ChainFlow> {
        match self.fetch_chains().await {
            Ok(chains) => chains.iter().map(ChainTvl::to_flow).collect(),
            Err(e) => {
                warn!("Chain flow fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }
}

impl Default for DefiLlamaClient {
    fn default() -> Self {
        Self::new()
    }
}
