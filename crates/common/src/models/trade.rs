use chrono::{DateTime, Utc};

pub const STATUS_OPEN: &str = "OPEN";
pub const STATUS_CLOSED: &str = "CLOSED";

/// One paper position, from open to close. Rows are append-only: a trade is
/// inserted OPEN, updated exactly once to CLOSED, and never deleted.
#[derive(Debug, Clone)]
pub struct Trade {
    pub id: String,
    pub ticker: String,
    pub entry_price: f64,
    /// Token units bought, not cash.
    pub amount: f64,
    pub entry_time: DateTime<Utc>,
    pub status: String, // 'OPEN' | 'CLOSED'
    pub exit_price: f64,
    pub exit_time: Option<DateTime<Utc>>,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub confidence_at_entry: f64,
    pub notes: String,
    pub persona_id: Option<String>,
}
