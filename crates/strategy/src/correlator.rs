//! Fuses anomaly scores, technical indicators and chain liquidity flows
//! into one bounded confidence score with entry/target/stop levels.

use common::models::{ChainFlow, Signal, SignalDirection};
use tracing::info;

use crate::indicators::{self, Macd};
use crate::stats;

/// Confidence above which a signal is marked BULLISH and its levels widen.
pub const BULLISH_THRESHOLD: i64 = 70;

/// Scores one ticker. Deterministic: the same inputs always produce the
/// same Signal.
#[allow(clippy::too_many_arguments)]
pub fn correlate(
    ticker: &str,
    sentiment_history: &[f64],
    volume_history: &[f64],
    price_history: &[f64],
    current_sentiment: f64,
    current_volume: f64,
    current_price: f64,
    chain: &str,
    chain_flows: &[ChainFlow],
) -> Signal {
    let sent_z = stats::z_score(current_sentiment, sentiment_history);
    let vol_z = stats::z_score(current_volume, volume_history);

    // Indicators need a meaningful window; fall back to neutral otherwise
    let (rsi, macd) = if price_history.len() > 10 {
        (
            indicators::rsi(price_history, 14),
            indicators::macd(price_history, 12, 26, 9),
        )
    } else {
        (50.0, Macd::zero())
    };

    // Base score (0-60): requires sentiment and volume to spike together
    let mut score = 0.0;
    if sent_z > 0.0 && vol_z > 0.0 {
        score = (sent_z.min(3.0) + vol_z.min(3.0)) / 6.0 * 60.0;
    }

    // Indicator adjustment
    if rsi < 30.0 {
        score += 20.0;
    } else if rsi < 45.0 {
        score += 10.0;
    }
    if macd.hist > 0.0 {
        score += 10.0;
    }

    score += flow_boost(chain, chain_flows);

    let confidence = score.min(99.0) as i64;

    let (entry_price, mut target_price, mut stop_loss) = if current_price > 0.0 {
        (
            current_price,
            current_price * 1.10,
            current_price * 0.95,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let mut direction = SignalDirection::Neutral;
    let mut risk_reward = "1:2".to_string();

    if confidence > BULLISH_THRESHOLD {
        direction = SignalDirection::Bullish;
        risk_reward = "1:3".to_string();
        target_price = current_price * 1.25;
        stop_loss = current_price * 0.92;
        info!(
            "BULLISH signal for {}: confidence {} (sent_z {:.2}, vol_z {:.2}, rsi {:.1})",
            ticker, confidence, sent_z, vol_z, rsi
        );
    }

    Signal {
        ticker: ticker.to_string(),
        sentiment_z: sent_z,
        volume_z: vol_z,
        rsi,
        macd: macd.line,
        macd_signal: macd.signal,
        macd_hist: macd.hist,
        confidence,
        entry_price,
        target_price,
        stop_loss,
        direction,
        risk_reward,
    }
}

/// Bonus points when the token's chain shows positive 7-day net inflows.
/// Chain names match case-insensitively; outflows add nothing.
fn flow_boost(chain: &str, chain_flows: &[ChainFlow]) -> f64 {
    if chain.is_empty() {
        return 0.0;
    }

    let flow = chain_flows
        .iter()
        .find(|f| f.chain.eq_ignore_ascii_case(chain));

    match flow {
        Some(f) if f.net_flow_7d > 50_000_000.0 => 15.0,
        Some(f) if f.net_flow_7d > 10_000_000.0 => 10.0,
        Some(f) if f.net_flow_7d > 0.0 => 5.0,
        _ => 0.0,
    }
}
