use async_trait::async_trait;
use common::models::{ChainFlow, PairSnapshot, SafetyReport};

/// Price/volume/liquidity lookup for one ticker. Implementations resolve
/// transport errors internally: an unknown ticker and a failed request
/// both come back as None, already logged.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_pair(&self, ticker: &str) -> Option<PairSnapshot>;
}

/// Seven-day net liquidity flow per chain. Empty on failure.
#[async_trait]
pub trait ChainFlowSource: Send + Sync {
    async fn fetch_flows(&self) -> Vec<ChainFlow>;
}

/// Free-text news digest for one ticker. Empty when nothing relevant
/// is in the feed or the feed is unreachable.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_digest(&self, ticker: &str) -> String;
}

/// Token safety verdict. An unreachable checker reports safe with a
/// sentinel score of -1 so one dead endpoint never stalls the pipeline.
#[async_trait]
pub trait SafetyChecker: Send + Sync {
    async fn check(&self, token_address: &str) -> SafetyReport;
}
