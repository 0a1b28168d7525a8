use serde::{Deserialize, Serialize};

/// Best trading pair found for a ticker on an aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub ticker: String,
    pub price: f64,
    /// 24h transaction count, used as the volume series input.
    pub volume_24h: f64,
    pub liquidity_usd: f64,
    pub chain: String,
    pub token_address: String,
    pub pair_url: String,
}

/// Net 7-day liquidity movement for one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainFlow {
    pub chain: String,
    pub net_flow_7d: f64,
}

#[derive(Debug, Clone)]
pub struct SafetyReport {
    pub is_safe: bool,
    pub score: i64,
    pub risks: Vec<String>,
}
