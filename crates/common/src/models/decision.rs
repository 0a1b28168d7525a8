use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionAction {
    Buy,
    Sell,
    Hold,
}

impl DecisionAction {
    /// Parses an action token from a model reply. Anything that isn't an
    /// exact BUY/SELL/HOLD (case-insensitive) is treated as unparseable.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "BUY" => Some(DecisionAction::Buy),
            "SELL" => Some(DecisionAction::Sell),
            "HOLD" => Some(DecisionAction::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::Buy => "BUY",
            DecisionAction::Sell => "SELL",
            DecisionAction::Hold => "HOLD",
        }
    }
}

/// One persona's verdict for one ticker. Ephemeral, produced per ensemble call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub persona_id: String,
    pub action: DecisionAction,
    pub confidence: i64, // persona-reported, 0-100 by convention
    pub reason: String,
    /// Full backend reply, kept for audit.
    pub raw_output: String,
}
