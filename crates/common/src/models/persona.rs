use chrono::{DateTime, Utc};

/// A registry row for one trading persona. Seeded once from the built-in
/// catalog; only `instructions` is rewritten afterwards (by the evolution
/// loop), and only the track-record columns move with closed trades.
#[derive(Debug, Clone)]
pub struct Persona {
    pub persona_id: String,
    pub name: String,
    pub model_provider: String,
    pub instructions: String,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub active: bool,
    pub last_updated: Option<DateTime<Utc>>,
}
