use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::{TextGenBackend, USER_AGENT};

const API_URL: &str = "https://api.cerebras.ai/v1/chat/completions";

pub struct CerebrasBackend {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl CerebrasBackend {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client."),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextGenBackend for CerebrasBackend {
    async fn generate(&self, prompt: &str, instruction: &str) -> String {
        let mut messages = Vec::new();
        if !instruction.is_empty() {
            messages.push(json!({ "role": "system", "content": instruction }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            "max_tokens": 1024
        });

        let response = match self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Cerebras request failed: {}", e);
                return format!("Error: {}", e);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Cerebras API error {}: {}", status.as_u16(), body);
            return format!("Error: Cerebras API returned {} - {}", status.as_u16(), body);
        }

        match response.json::<ChatResponse>().await {
            Ok(data) => match data.choices.first() {
                Some(choice) => choice.message.content.clone(),
                None => {
                    error!("Cerebras response had no choices");
                    "Error: Could not parse Cerebras response.".to_string()
                }
            },
            Err(e) => {
                error!("Cerebras response decode failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}
