pub mod cerebras;
pub mod cohere;
pub mod gemini;
pub mod github;
pub mod groq;
pub mod huggingface;

pub use cerebras::CerebrasBackend;
pub use cohere::CohereBackend;
pub use gemini::GeminiBackend;
pub use github::GitHubModelsBackend;
pub use groq::GroqBackend;
pub use huggingface::HuggingFaceBackend;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub(crate) const USER_AGENT: &str = "persona_bot/0.1.0";

/// One text-generation capability per persona. Ordinary failures (timeouts,
/// bad status codes, unparsable bodies) come back as replies carrying the
/// error marker, never as panics, so one dead backend degrades exactly one
/// persona.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGenBackend: Send + Sync {
    async fn generate(&self, prompt: &str, instruction: &str) -> String;
}

/// Replies with this prefix are failed calls and carry no decision.
pub fn is_error_reply(reply: &str) -> bool {
    reply.starts_with("Error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_marker_is_a_prefix_check() {
        assert!(is_error_reply("Error: Gemini API returned 429"));
        assert!(!is_error_reply("ACTION: BUY\nError mentioned later"));
        assert!(!is_error_reply("All clear"));
    }
}
