use std::sync::Arc;

use sqlx::SqlitePool;
use storage::repositories::{PersonasRepository, TradesRepository};
use tracing::{info, warn};

use crate::backends::TextGenBackend;

/// Closed trades inspected per learning pass.
const REVIEW_WINDOW: i64 = 5;
/// Outcomes between these bounds are noise and trigger no rewrite.
const LOSS_TRIGGER_PCT: f64 = -5.0;
const WIN_TRIGGER_PCT: f64 = 10.0;

pub const REWRITE_MARKER: &str = "NEW_PROMPT:";

pub struct EvolutionLoop {
    pool: SqlitePool,
    optimizer: Option<Arc<dyn TextGenBackend>>,
}

impl EvolutionLoop {
    pub fn new(pool: SqlitePool, optimizer: Option<Arc<dyn TextGenBackend>>) -> Self {
        Self { pool, optimizer }
    }

    /// Reviews the most recently closed trades and, for each big win or big
    /// loss, asks the optimizer to rewrite the owning persona's
    /// instructions. The rewrite lands in the registry immediately.
    pub async fn run_learning_loop(&self) -> Result<(), sqlx::Error> {
        info!("Running strategy learning loop");

        let Some(optimizer) = &self.optimizer else {
            warn!("No optimizer backend available, skipping learning loop");
            return Ok(());
        };

        let trades = TradesRepository::recent_closed(&self.pool, REVIEW_WINDOW).await?;

        for trade in trades {
            let Some(persona_id) = &trade.persona_id else {
                continue;
            };

            let framing = if trade.pnl_pct < LOSS_TRIGGER_PCT {
                "You took a significant LOSS using the current strategy. Analyzing the failure..."
            } else if trade.pnl_pct > WIN_TRIGGER_PCT {
                "You had a massive WIN. Reinforce this behavior..."
            } else {
                continue;
            };

            let Some(persona) = PersonasRepository::get(&self.pool, persona_id).await? else {
                warn!("Trade {} references unknown persona {}", trade.id, persona_id);
                continue;
            };

            let prompt = build_critique_prompt(
                persona_id,
                &trade.ticker,
                trade.pnl_pct,
                &persona.instructions,
                framing,
            );

            let reply = optimizer.generate(&prompt, "").await;
            match extract_rewrite(&reply) {
                Some(new_instructions) => {
                    PersonasRepository::update_instructions(&self.pool, persona_id, &new_instructions)
                        .await?;
                    info!("Evolved persona {}: {:.60}", persona_id, new_instructions);
                }
                None => {
                    warn!("Optimizer gave no usable rewrite for {}", persona_id);
                }
            }
        }

        Ok(())
    }
}

pub fn build_critique_prompt(
    persona_id: &str,
    ticker: &str,
    pnl_pct: f64,
    current_instructions: &str,
    framing: &str,
) -> String {
    format!(
        "Role: Strategy Optimizer\n\
         Bot: {}\n\
         Trade: {}\n\
         Result: {}% PnL\n\
         Current System Prompt: \"{}\"\n\n\
         Task: {}\n\n\
         CROSS-AGENT LEARNING:\n\
         If other agents succeeded where you failed, incorporate their logic \
         (e.g., if they checked Volume/Whales and you didn't).\n\
         Target: IMPROVE ACCURACY.\n\n\
         Format:\n\
         NEW_PROMPT: [The new text only]",
        persona_id, ticker, pnl_pct, current_instructions, framing
    )
}

/// Pulls the rewritten instruction text out of an optimizer reply. Replies
/// without the marker, or with nothing after it, carry no rewrite.
pub fn extract_rewrite(reply: &str) -> Option<String> {
    let idx = reply.find(REWRITE_MARKER)?;
    let text = reply[idx + REWRITE_MARKER.len()..].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockTextGenBackend;
    use chrono::Utc;
    use common::models::trade::{Trade, STATUS_OPEN};

    async fn insert_closed(pool: &SqlitePool, id: &str, persona: &str, pnl_pct: f64) {
        let trade = Trade {
            id: id.to_string(),
            ticker: "WIF".to_string(),
            entry_price: 1.0,
            amount: 100.0,
            entry_time: Utc::now(),
            status: STATUS_OPEN.to_string(),
            exit_price: 0.0,
            exit_time: None,
            pnl: 0.0,
            pnl_pct: 0.0,
            confidence_at_entry: 75.0,
            notes: String::new(),
            persona_id: Some(persona.to_string()),
        };
        TradesRepository::insert_open(pool, &trade).await.unwrap();
        TradesRepository::mark_closed(pool, id, 1.0, Utc::now(), pnl_pct, pnl_pct, "closed")
            .await
            .unwrap();
    }

    #[test]
    fn rewrite_extraction_takes_text_after_the_marker() {
        assert_eq!(
            extract_rewrite("Thinking...\nNEW_PROMPT: Be patient. Wait for volume."),
            Some("Be patient. Wait for volume.".to_string())
        );
        assert_eq!(extract_rewrite("No marker here"), None);
        assert_eq!(extract_rewrite("NEW_PROMPT:   "), None);
    }

    #[test]
    fn critique_prompt_quotes_the_current_instructions() {
        let prompt = build_critique_prompt("p1", "WIF", -6.0, "Buy dips.", "Analyze the failure");
        assert!(prompt.contains("Bot: p1"));
        assert!(prompt.contains("Result: -6% PnL"));
        assert!(prompt.contains("Current System Prompt: \"Buy dips.\""));
        assert!(prompt.contains("NEW_PROMPT:"));
    }

    #[tokio::test]
    async fn big_loss_triggers_exactly_one_rewrite() {
        let pool = storage::db::connect_in_memory().await.unwrap();
        PersonasRepository::insert_if_missing(&pool, "p1", "P One", "gemini", "Buy dips.")
            .await
            .unwrap();
        insert_closed(&pool, "t1", "p1", -6.0).await;

        let mut optimizer = MockTextGenBackend::new();
        optimizer
            .expect_generate()
            .withf(|prompt, instruction| {
                prompt.contains("significant LOSS") && instruction.is_empty()
            })
            .times(1)
            .returning(|_, _| "NEW_PROMPT: Stop catching falling knives.".to_string());

        let evolution = EvolutionLoop::new(pool.clone(), Some(Arc::new(optimizer)));
        evolution.run_learning_loop().await.unwrap();

        let persona = PersonasRepository::get(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(persona.instructions, "Stop catching falling knives.");
    }

    #[tokio::test]
    async fn moderate_outcome_is_inside_the_deadband() {
        let pool = storage::db::connect_in_memory().await.unwrap();
        PersonasRepository::insert_if_missing(&pool, "p1", "P One", "gemini", "Buy dips.")
            .await
            .unwrap();
        insert_closed(&pool, "t1", "p1", 2.0).await;

        let mut optimizer = MockTextGenBackend::new();
        optimizer.expect_generate().times(0);

        let evolution = EvolutionLoop::new(pool.clone(), Some(Arc::new(optimizer)));
        evolution.run_learning_loop().await.unwrap();

        let persona = PersonasRepository::get(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(persona.instructions, "Buy dips.", "no rewrite inside the deadband");
    }

    #[tokio::test]
    async fn big_win_reinforces_with_a_rewrite() {
        let pool = storage::db::connect_in_memory().await.unwrap();
        PersonasRepository::insert_if_missing(&pool, "p1", "P One", "gemini", "Buy dips.")
            .await
            .unwrap();
        insert_closed(&pool, "t1", "p1", 12.5).await;

        let mut optimizer = MockTextGenBackend::new();
        optimizer
            .expect_generate()
            .withf(|prompt, _| prompt.contains("massive WIN"))
            .times(1)
            .returning(|_, _| "NEW_PROMPT: Keep buying confirmed dips.".to_string());

        let evolution = EvolutionLoop::new(pool.clone(), Some(Arc::new(optimizer)));
        evolution.run_learning_loop().await.unwrap();

        let persona = PersonasRepository::get(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(persona.instructions, "Keep buying confirmed dips.");
    }

    #[tokio::test]
    async fn reply_without_marker_leaves_instructions_alone() {
        let pool = storage::db::connect_in_memory().await.unwrap();
        PersonasRepository::insert_if_missing(&pool, "p1", "P One", "gemini", "Buy dips.")
            .await
            .unwrap();
        insert_closed(&pool, "t1", "p1", -8.0).await;

        let mut optimizer = MockTextGenBackend::new();
        optimizer
            .expect_generate()
            .times(1)
            .returning(|_, _| "I refuse to answer in the requested format.".to_string());

        let evolution = EvolutionLoop::new(pool.clone(), Some(Arc::new(optimizer)));
        evolution.run_learning_loop().await.unwrap();

        let persona = PersonasRepository::get(&pool, "p1").await.unwrap().unwrap();
        assert_eq!(persona.instructions, "Buy dips.");
    }

    #[tokio::test]
    async fn missing_optimizer_is_a_clean_no_op() {
        let pool = storage::db::connect_in_memory().await.unwrap();
        let evolution = EvolutionLoop::new(pool, None);
        evolution.run_learning_loop().await.unwrap();
    }
}
