use common::models::ChainFlow;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChainTvl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tvl: f64,
    #[serde(rename = "tvlPrevWeek", default)]
    pub tvl_prev_week: Option<f64>,
}

impl ChainTvl {
    /// Net liquidity that moved onto the chain over the last week. A chain
    /// without a prior-week reading reports zero flow, not an inflow equal
    /// to its whole TVL.
    pub fn to_flow(&self) -> ChainFlow {
        let net_flow_7d = match self.tvl_prev_week {
            Some(prev) => self.tvl - prev,
            None => 0.0,
        };

        ChainFlow {
            chain: self.name.clone(),
            net_flow_7d,
        }
    }
}
