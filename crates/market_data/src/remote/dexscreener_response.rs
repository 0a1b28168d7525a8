use common::models::PairSnapshot;
use serde::Deserialize;

/// Chains we are willing to trade on, in preference order. Anything else
/// ranks behind all of these.
const CHAIN_PRIORITY: [&str; 4] = ["solana", "ethereum", "base", "bsc"];

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub pairs: Option<Vec<PairData>>,
}

#[derive(Debug, Deserialize)]
pub struct PairData {
    #[serde(rename = "chainId", default)]
    pub chain_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "baseToken")]
    pub base_token: BaseToken,
    #[serde(rename = "priceUsd", default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub txns: Option<Txns>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
}

#[derive(Debug, Deserialize)]
pub struct BaseToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Txns {
    #[serde(default)]
    pub h24: TxnWindow,
}

#[derive(Debug, Default, Deserialize)]
pub struct TxnWindow {
    #[serde(default)]
    pub buys: u64,
    #[serde(default)]
    pub sells: u64,
}

#[derive(Debug, Deserialize)]
pub struct Liquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

impl SearchResponse {
    /// Picks the pair to trade for a symbol. Search results include loose
    /// matches, so only exact base-token symbols count; preferred chains
    /// come first and deepest liquidity wins within a chain.
    pub fn best_match(&self, symbol: &str) -> Option<&PairData> {
        let wanted = symbol.to_uppercase();
        let mut candidates: Vec<&PairData> = self
            .pairs
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|p| p.base_token.symbol.to_uppercase() == wanted)
            .collect();

        candidates.sort_by(|a, b| {
            chain_rank(&a.chain_id).cmp(&chain_rank(&b.chain_id)).then(
                b.liquidity_usd()
                    .partial_cmp(&a.liquidity_usd())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        candidates.into_iter().next()
    }
}

impl PairData {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    pub fn to_snapshot(&self, ticker: &str) -> PairSnapshot {
        let txn_count = self
            .txns
            .as_ref()
            .map(|t| t.h24.buys + t.h24.sells)
            .unwrap_or(0);

        PairSnapshot {
            ticker: ticker.to_string(),
            price: self
                .price_usd
                .as_deref()
                .unwrap_or("0")
                .parse::<f64>()
                .unwrap_or(0_f64),
            volume_24h: txn_count as f64,
            liquidity_usd: self.liquidity_usd(),
            chain: self.chain_id.clone(),
            token_address: self.base_token.address.clone(),
            pair_url: self.url.clone(),
        }
    }
}

fn chain_rank(chain_id: &str) -> usize {
    CHAIN_PRIORITY
        .iter()
        .position(|c| chain_id.eq_ignore_ascii_case(c))
        .unwrap_or(CHAIN_PRIORITY.len())
}
