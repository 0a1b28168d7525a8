use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use tracing::{info, warn};

use crate::backends::{
    CerebrasBackend, CohereBackend, GeminiBackend, GitHubModelsBackend, GroqBackend,
    HuggingFaceBackend, TextGenBackend,
};
use crate::catalog::{DEFAULT_PERSONAS, OPTIMIZER_PERSONA_ID};

/// Live backends keyed by persona id. A persona whose provider key is not
/// configured gets no entry and sits out every ensemble round.
#[derive(Clone)]
pub struct BackendRoster {
    backends: HashMap<String, Arc<dyn TextGenBackend>>,
}

impl BackendRoster {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Builds a backend for every default persona whose API key is present
    /// in the environment.
    pub fn from_env() -> Self {
        let mut roster = Self::new();

        for spec in &DEFAULT_PERSONAS {
            match backend_from_env(spec.provider, spec.model) {
                Some(backend) => roster.insert(spec.id, backend),
                None => warn!("Could not load backend for {} (missing key?)", spec.id),
            }
        }

        info!(
            "Backend roster ready: {}/{} personas have a live backend",
            roster.len(),
            DEFAULT_PERSONAS.len()
        );
        roster
    }

    pub fn insert(&mut self, persona_id: &str, backend: Arc<dyn TextGenBackend>) {
        self.backends.insert(persona_id.to_string(), backend);
    }

    pub fn get(&self, persona_id: &str) -> Option<Arc<dyn TextGenBackend>> {
        self.backends.get(persona_id).cloned()
    }

    /// Backend the evolution loop uses to rewrite instructions.
    pub fn optimizer(&self) -> Option<Arc<dyn TextGenBackend>> {
        self.get(OPTIMIZER_PERSONA_ID)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Default for BackendRoster {
    fn default() -> Self {
        Self::new()
    }
}

fn backend_from_env(provider: &str, model: &str) -> Option<Arc<dyn TextGenBackend>> {
    match provider {
        "gemini" => {
            let key = non_empty_env("GEMINI_API_KEY")?;
            Some(Arc::new(GeminiBackend::new(&key, model)))
        }
        "groq" => {
            let key = non_empty_env("GROQ_API_KEY")?;
            Some(Arc::new(GroqBackend::new(&key, model)))
        }
        "github" => {
            let key = non_empty_env("GITHUB_TOKEN")?;
            Some(Arc::new(GitHubModelsBackend::new(&key, model)))
        }
        "huggingface" => {
            let key = non_empty_env("HUGGINGFACE_API_TOKEN")?;
            Some(Arc::new(HuggingFaceBackend::new(&key, model)))
        }
        "cerebras" => {
            let key = non_empty_env("CEREBRAS_API_KEY")?;
            Some(Arc::new(CerebrasBackend::new(&key, model)))
        }
        "cohere" => {
            let key = non_empty_env("COHERE_API_KEY")?;
            Some(Arc::new(CohereBackend::new(&key, model)))
        }
        unknown => {
            warn!("Unknown model provider: {}", unknown);
            None
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
