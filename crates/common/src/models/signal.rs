use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Neutral,
    Bullish,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Neutral => "NEUTRAL",
            SignalDirection::Bullish => "BULLISH",
        }
    }
}

/// One scored evaluation of a ticker. Built fresh on every pass, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub sentiment_z: f64,
    pub volume_z: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub confidence: i64, // 0..=99
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub direction: SignalDirection,
    pub risk_reward: String, // "1:2" or "1:3"
}

/// The slice of market state the decision ensemble sees for one ticker.
#[derive(Debug, Clone)]
pub struct Technicals {
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub moving_avg: f64,
    pub volume_z: f64,
}
