use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::{TextGenBackend, USER_AGENT};

pub struct GeminiBackend {
    client: Client,
    // Google routes the key through a query parameter, so the key lives
    // inside the URL. Never log it.
    url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
    }
}

impl GeminiBackend {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client."),
            url: format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
                model, api_key
            ),
        }
    }
}

#[async_trait]
impl TextGenBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, instruction: &str) -> String {
        // generateContent has no dedicated system slot in this API version,
        // so the instruction is folded into the user text.
        let text = if instruction.is_empty() {
            prompt.to_string()
        } else {
            format!(
                "System Instruction: {}\n\nUser Query: {}",
                instruction, prompt
            )
        };

        let payload = json!({
            "contents": [ { "parts": [ { "text": text } ] } ],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 800 }
        });

        let response = match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Gemini request failed: {}", e);
                return format!("Error: {}", e);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status.as_u16(), body);
            return format!("Error: Gemini API returned {}", status.as_u16());
        }

        match response.json::<GenerateResponse>().await {
            Ok(data) => data.first_text().unwrap_or_else(|| {
                error!("Gemini response had no candidates");
                "Error: Could not parse Gemini response.".to_string()
            }),
            Err(e) => {
                error!("Gemini response decode failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}
