use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use common::models::SafetyReport;
use reqwest::Client;
use tracing::warn;

use crate::remote::rugcheck_response::TokenReportResponse;
use crate::remote::USER_AGENT;
use crate::traits::SafetyChecker;

pub struct RugCheckClient {
    client: Client,
    base_url: String,
}

impl RugCheckClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client."),
            base_url: env::var("RUGCHECK_BASE_URL")
                .unwrap_or_else(|_| "https://api.rugcheck.xyz".to_string()),
        }
    }

    async fn fetch_report(&self, token_address: &str) -> anyhow::Result<TokenReportResponse> {
        let url = format!("{}/v1/tokens/{}/report", self.base_url, token_address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from token report", status);
        }

        response
            .json::<TokenReportResponse>()
            .await
            .context("Failed to parse JSON response")
    }
}

#[async_trait]
impl SafetyChecker for RugCheckClient {
    async fn check(&self, token_address: &str) -> SafetyReport {
        match self.fetch_report(token_address).await {
            Ok(report) => report.to_report(),
            Err(e) => {
                warn!("Safety check failed for {}: {:#}", token_address, e);
                SafetyReport {
                    is_safe: true,
                    score: -1,
                    risks: Vec::new(),
                }
            }
        }
    }
}

impl Default for RugCheckClient {
    fn default() -> Self {
        Self::new()
    }
}
