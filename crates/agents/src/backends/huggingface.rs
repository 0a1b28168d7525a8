use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::{TextGenBackend, USER_AGENT};

pub struct HuggingFaceBackend {
    client: Client,
    api_token: String,
    url: String,
}

/// The inference API answers either with a list of generations or with an
/// error object, depending on model state.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generations(Vec<Generation>),
    Failure { error: String },
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: String,
}

impl HuggingFaceBackend {
    pub fn new(api_token: &str, model: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client."),
            api_token: api_token.to_string(),
            url: format!("https://api-inference.huggingface.co/models/{}", model),
        }
    }
}

#[async_trait]
impl TextGenBackend for HuggingFaceBackend {
    async fn generate(&self, prompt: &str, instruction: &str) -> String {
        let full_prompt = format!(
            "<|system|>\n{}\n<|user|>\n{}\n<|assistant|>\n",
            instruction, prompt
        );

        let payload = json!({
            "inputs": full_prompt,
            "parameters": {
                "max_new_tokens": 512,
                "temperature": 0.7,
                "return_full_text": false
            }
        });

        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("HuggingFace request failed: {}", e);
                return format!("Error: {}", e);
            }
        };

        let status = response.status();
        if status.as_u16() == 503 {
            // Cold model, still spinning up
            return "Error: Model is loading, please try again in 30s.".to_string();
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HuggingFace API error {}: {}", status.as_u16(), body);
            return format!("Error: HF API returned {}", status.as_u16());
        }

        match response.json::<InferenceResponse>().await {
            Ok(InferenceResponse::Generations(generations)) => generations
                .first()
                .map(|g| g.generated_text.trim().to_string())
                .unwrap_or_else(|| {
                    error!("HuggingFace response had no generations");
                    "Error: Could not parse HF response.".to_string()
                }),
            Ok(InferenceResponse::Failure { error }) => format!("Error: {}", error),
            Err(e) => {
                error!("HuggingFace response decode failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}
