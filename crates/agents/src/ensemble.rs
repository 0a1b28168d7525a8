use common::models::{Decision, DecisionAction, Technicals};
use futures_util::future::join_all;
use sqlx::SqlitePool;
use storage::repositories::PersonasRepository;
use tracing::{debug, error};

use crate::backends::is_error_reply;
use crate::roster::BackendRoster;

pub struct DecisionEnsemble {
    pool: SqlitePool,
    roster: BackendRoster,
}

impl DecisionEnsemble {
    pub fn new(pool: SqlitePool, roster: BackendRoster) -> Self {
        Self { pool, roster }
    }

    /// Fans one candidate ticker out to every active persona with a live
    /// backend and collects whatever comes back. Instructions are re-read
    /// from the registry on every call so rewrites take effect immediately.
    /// A failed backend contributes nothing; a malformed reply still counts,
    /// with per-field defaults filling the gaps.
    pub async fn get_decisions(
        &self,
        ticker: &str,
        technicals: &Technicals,
        news_summary: &str,
    ) -> Vec<Decision> {
        let personas = match PersonasRepository::active(&self.pool).await {
            Ok(personas) => personas,
            Err(e) => {
                error!("Could not load personas: {}", e);
                return Vec::new();
            }
        };

        let prompt = build_prompt(ticker, technicals, news_summary);

        let mut tasks = Vec::new();
        for persona in personas {
            let Some(backend) = self.roster.get(&persona.persona_id) else {
                debug!("Persona {} has no backend, skipping", persona.persona_id);
                continue;
            };
            let prompt = prompt.clone();
            tasks.push(async move {
                let reply = backend.generate(&prompt, &persona.instructions).await;
                (persona.persona_id, reply)
            });
        }

        if tasks.is_empty() {
            return Vec::new();
        }

        let mut decisions = Vec::new();
        for (persona_id, reply) in join_all(tasks).await {
            if is_error_reply(&reply) {
                error!("Persona {} failed: {}", persona_id, reply);
                continue;
            }
            decisions.push(parse_decision(&persona_id, &reply));
        }
        decisions
    }
}

pub fn build_prompt(ticker: &str, technicals: &Technicals, news_summary: &str) -> String {
    format!(
        "Market Data for {}:\n\
         Price: ${}\n\
         RSI: {}\n\
         MACD: {}\n\
         Moving Avg: {}\n\
         Volume Z-Score: {}\n\
         News Summary: {}\n\n\
         Task: DECIDE.\n\
         Do you want to BUY, SELL, or HOLD?\n\n\
         Format:\n\
         ACTION: [BUY/SELL/HOLD]\n\
         CONFIDENCE: [0-100]\n\
         REASON: [One sentence rationale]",
        ticker,
        technicals.price,
        technicals.rsi,
        technicals.macd,
        technicals.moving_avg,
        technicals.volume_z,
        news_summary
    )
}

/// Best-effort parse of the three-field reply format. Each field falls back
/// independently: HOLD, zero confidence, the raw reply as reason. Never
/// fails outright; a free-form reply is still a valid (if useless) decision.
pub fn parse_decision(persona_id: &str, raw: &str) -> Decision {
    let mut action = DecisionAction::Hold;
    let mut confidence: i64 = 0;
    let mut reason = raw.to_string();

    for line in raw.lines() {
        if let Some(value) = field_value(line, "ACTION:") {
            if let Some(parsed) = DecisionAction::parse(&value) {
                action = parsed;
            }
        }
        if let Some(value) = field_value(line, "CONFIDENCE:") {
            if let Ok(parsed) = value.parse::<i64>() {
                confidence = parsed;
            }
        }
        if let Some(value) = field_value(line, "REASON:") {
            reason = value;
        }
    }

    Decision {
        persona_id: persona_id.to_string(),
        action,
        confidence,
        reason,
        raw_output: raw.to_string(),
    }
}

fn field_value(line: &str, marker: &str) -> Option<String> {
    let idx = line.find(marker)?;
    Some(line[idx + marker.len()..].trim().to_string())
}
