use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::{TextGenBackend, USER_AGENT};

const API_URL: &str = "https://api.cohere.com/v2/chat";

pub struct CohereBackend {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl ChatResponse {
    fn first_text(&self) -> Option<String> {
        self.message
            .as_ref()
            .and_then(|m| m.content.first())
            .map(|block| block.text.clone())
    }
}

impl CohereBackend {
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
impl TextGenBackend for CohereBackend {
    async fn generate(&self, prompt: &str, instruction: &str) -> String {
        let mut messages = Vec::new();
        if !instruction.is_empty() {
            messages.push(json!({ "role": "system", "content": instruction }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let payload = json!({
            "model": self.model,
            "messages": messages
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
                error!("Cohere request failed: {}", e);
                return format!("Error: {}", e);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Cohere API error {}: {}", status.as_u16(), body);
            return format!("Error: Cohere API returned {}", status.as_u16());
        }

        match response.json::<ChatResponse>().await {
            Ok(data) => data.first_text().unwrap_or_else(|| {
                error!("Cohere response had no message content");
                "Error: Could not parse Cohere response.".to_string()
            }),
            Err(e) => {
                error!("Cohere response decode failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}
