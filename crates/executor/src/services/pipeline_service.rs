use std::collections::HashMap;
use std::sync::Arc;

use agents::ensemble::DecisionEnsemble;
use common::models::{ChainFlow, DecisionAction, Signal, SignalDirection, Technicals};
use market_data::traits::{ChainFlowSource, MarketDataSource, NewsSource, SafetyChecker};
use strategy::{correlator, indicators};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use trader::PaperTrader;

/// Cash committed per approved BUY decision.
const STAKE_PER_TRADE_USD: f64 = 100.0;
/// Personas reporting less conviction than this don't get a position.
const MIN_DECISION_CONFIDENCE: i64 = 60;
/// Observations kept per ticker for the z-score and indicator windows.
const HISTORY_WINDOW: usize = 50;

/// Rolling per-ticker observations accumulated across analysis passes.
/// In-memory only: after a restart the correlator simply warms up again
/// from neutral defaults.
#[derive(Default)]
struct TickerHistory {
    sentiment: Vec<f64>,
    volume: Vec<f64>,
    price: Vec<f64>,
}

impl TickerHistory {
    fn push(&mut self, sentiment: f64, volume: f64, price: f64) {
        self.sentiment.push(sentiment);
        self.volume.push(volume);
        self.price.push(price);
        if self.price.len() > HISTORY_WINDOW {
            self.sentiment.remove(0);
            self.volume.remove(0);
            self.price.remove(0);
        }
    }
}

/// Drives one watchlist through the decision pipeline: market snapshot →
/// safety gate → news digest → correlate → alert → ensemble → ledger.
/// Every stage degrades per ticker; a dead collaborator costs one ticker
/// one pass, never the loop.
pub struct PipelineService {
    watchlist: &'static [&'static str],
    market: Arc<dyn MarketDataSource>,
    flows: Arc<dyn ChainFlowSource>,
    news: Arc<dyn NewsSource>,
    safety: Arc<dyn SafetyChecker>,
    ensemble: DecisionEnsemble,
    ledger: PaperTrader,
    alert_tx: broadcast::Sender<String>,
    history: HashMap<String, TickerHistory>,
}

impl PipelineService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        watchlist: &'static [&'static str],
        market: Arc<dyn MarketDataSource>,
        flows: Arc<dyn ChainFlowSource>,
        news: Arc<dyn NewsSource>,
        safety: Arc<dyn SafetyChecker>,
        ensemble: DecisionEnsemble,
        ledger: PaperTrader,
        alert_tx: broadcast::Sender<String>,
    ) -> Self {
        Self {
            watchlist,
            market,
            flows,
            news,
            safety,
            ensemble,
            ledger,
            alert_tx,
            history: HashMap::new(),
        }
    }

    pub async fn run_analysis_pass(&mut self) {
        let chain_flows = self.flows.fetch_flows().await;

        for ticker in self.watchlist {
            self.analyze_ticker(ticker, &chain_flows).await;
        }
    }

    async fn analyze_ticker(&mut self, ticker: &str, chain_flows: &[ChainFlow]) {
        info!("Analyzing {}...", ticker);

        let Some(pair) = self.market.fetch_pair(ticker).await else {
            debug!("No market data for {}, skipping", ticker);
            return;
        };

        if !pair.token_address.is_empty() {
            let report = self.safety.check(&pair.token_address).await;
            if !report.is_safe {
                warn!(
                    "{} flagged as UNSAFE (score {}), skipping",
                    ticker, report.score
                );
                return;
            }
        }

        let digest = self.news.fetch_digest(ticker).await;
        let sentiment = headline_count(&digest);

        let history = self.history.entry(ticker.to_string()).or_default();
        let signal = correlator::correlate(
            ticker,
            &history.sentiment,
            &history.volume,
            &history.price,
            sentiment,
            pair.volume_24h,
            pair.price,
            &pair.chain,
            chain_flows,
        );
        history.push(sentiment, pair.volume_24h, pair.price);
        let moving_avg = indicators::bollinger(&history.price, 20, 2.0).middle;

        info!(
            "{}: confidence {} ({})",
            ticker,
            signal.confidence,
            signal.direction.as_str()
        );

        if signal.direction != SignalDirection::Bullish {
            return;
        }

        if self.alert_tx.send(format_alert(&signal)).is_err() {
            debug!("No alert listeners attached");
        }

        let technicals = Technicals {
            price: pair.price,
            rsi: signal.rsi,
            macd: signal.macd,
            moving_avg,
            volume_z: signal.volume_z,
        };

        let decisions = self
            .ensemble
            .get_decisions(ticker, &technicals, &digest)
            .await;
        info!("{}: {} persona decisions", ticker, decisions.len());

        for decision in decisions {
            if decision.action != DecisionAction::Buy
                || decision.confidence < MIN_DECISION_CONFIDENCE
            {
                debug!(
                    "{}: {} says {} ({}), no trade",
                    ticker,
                    decision.persona_id,
                    decision.action.as_str(),
                    decision.confidence
                );
                continue;
            }

            let notes = format!("{}: {}", decision.persona_id, decision.reason);
            match self
                .ledger
                .open_trade(
                    ticker,
                    pair.price,
                    STAKE_PER_TRADE_USD,
                    decision.confidence as f64,
                    &notes,
                    Some(&decision.persona_id),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => debug!("{}: trade for {} rejected", ticker, decision.persona_id),
                Err(e) => warn!("Ledger error opening {} trade: {}", ticker, e),
            }
        }
    }

    /// Refreshes current prices for the watchlist and lets the ledger apply
    /// its exit thresholds. Tickers without a quote this pass are skipped.
    pub async fn run_price_check_pass(&self) {
        let mut prices = HashMap::new();
        for ticker in self.watchlist {
            if let Some(pair) = self.market.fetch_pair(ticker).await {
                if pair.price > 0.0 {
                    prices.insert(ticker.replace('$', "").to_uppercase(), pair.price);
                }
            }
        }

        if prices.is_empty() {
            debug!("No prices available, skipping trade check");
            return;
        }

        if let Err(e) = self.ledger.check_trades(&prices).await {
            warn!("Trade check failed: {}", e);
        }
    }
}

/// Sentiment proxy: how many headlines in the digest mention the ticker.
/// The digest joins titles with " | ", so the count is segments.
fn headline_count(digest: &str) -> f64 {
    if digest.is_empty() {
        0.0
    } else {
        digest.split(" | ").count() as f64
    }
}

fn format_alert(signal: &Signal) -> String {
    format!(
        "🚨 {} signal for {}\n\
         Confidence: {}/99\n\
         Entry: ${:.6}\n\
         Target: ${:.6} | Stop: ${:.6} (R/R {})\n\
         RSI: {:.1} | MACD hist: {:.6} | Vol Z: {:.2}",
        signal.direction.as_str(),
        signal.ticker,
        signal.confidence,
        signal.entry_price,
        signal.target_price,
        signal.stop_loss,
        signal.risk_reward,
        signal.rsi,
        signal.macd_hist,
        signal.volume_z
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agents::backends::TextGenBackend;
    use agents::roster::BackendRoster;
    use async_trait::async_trait;
    use common::models::{PairSnapshot, SafetyReport};
    use std::sync::Mutex;
    use storage::db::connect_in_memory;
    use storage::repositories::PersonasRepository;

    #[derive(Clone)]
    struct ScriptedMarket {
        state: Arc<Mutex<(f64, f64)>>, // (price, 24h txns)
    }

    #[async_trait]
    impl MarketDataSource for ScriptedMarket {
        async fn fetch_pair(&self, ticker: &str) -> Option<PairSnapshot> {
            let (price, volume) = *self.state.lock().unwrap();
            Some(PairSnapshot {
                ticker: ticker.to_string(),
                price,
                volume_24h: volume,
                liquidity_usd: 1_000_000.0,
                chain: "solana".to_string(),
                token_address: "So11111111111111111111111111111111111111112".to_string(),
                pair_url: String::new(),
            })
        }
    }

    struct FixedFlows(Vec<ChainFlow>);

    #[async_trait]
    impl ChainFlowSource for FixedFlows {
        async fn fetch_flows(&self) -> Vec<ChainFlow> {
            self.0.clone()
        }
    }

    #[derive(Clone)]
    struct ScriptedNews {
        digest: Arc<Mutex<String>>,
    }

    #[async_trait]
    impl NewsSource for ScriptedNews {
        async fn fetch_digest(&self, _ticker: &str) -> String {
            self.digest.lock().unwrap().clone()
        }
    }

    struct FixedSafety {
        is_safe: bool,
    }

    #[async_trait]
    impl SafetyChecker for FixedSafety {
        async fn check(&self, _token_address: &str) -> SafetyReport {
            SafetyReport {
                is_safe: self.is_safe,
                score: if self.is_safe { 100 } else { 9000 },
                risks: Vec::new(),
            }
        }
    }

    struct ScriptedBackend {
        reply: String,
    }

    #[async_trait]
    impl TextGenBackend for ScriptedBackend {
        async fn generate(&self, _prompt: &str, _instruction: &str) -> String {
            self.reply.clone()
        }
    }

    struct Harness {
        pipeline: PipelineService,
        market_state: Arc<Mutex<(f64, f64)>>,
        digest: Arc<Mutex<String>>,
        ledger: PaperTrader,
    }

    async fn harness(is_safe: bool, reply: &str) -> Harness {
        let pool = connect_in_memory().await.unwrap();
        PersonasRepository::insert_if_missing(&pool, "alpha", "Alpha", "gemini", "Buy dips.")
            .await
            .unwrap();

        let mut roster = BackendRoster::new();
        roster.insert(
            "alpha",
            Arc::new(ScriptedBackend {
                reply: reply.to_string(),
            }),
        );

        let market_state = Arc::new(Mutex::new((10.0, 100.0)));
        let digest = Arc::new(Mutex::new(String::new()));
        let (alert_tx, _) = broadcast::channel(16);

        let pipeline = PipelineService::new(
            &["$SOL"],
            Arc::new(ScriptedMarket {
                state: market_state.clone(),
            }),
            Arc::new(FixedFlows(vec![ChainFlow {
                chain: "Solana".to_string(),
                net_flow_7d: 60_000_000.0,
            }])),
            Arc::new(ScriptedNews {
                digest: digest.clone(),
            }),
            Arc::new(FixedSafety { is_safe }),
            DecisionEnsemble::new(pool.clone(), roster),
            PaperTrader::new(pool.clone()),
            alert_tx,
        );

        Harness {
            pipeline,
            market_state,
            digest,
            ledger: PaperTrader::new(pool),
        }
    }

    /// Feeds five quiet observations, then a spike: both z-scores saturate
    /// (60 points) and the solana inflow adds 15, clearing the bullish bar.
    async fn warm_up_and_spike(h: &mut Harness) {
        let volumes = [100.0, 120.0, 90.0, 110.0, 100.0];
        let digests = ["sol steady", "", "sol up | sol treasury", "", "sol note"];
        for (volume, digest) in volumes.iter().zip(digests) {
            h.market_state.lock().unwrap().1 = *volume;
            *h.digest.lock().unwrap() = digest.to_string();
            h.pipeline.run_analysis_pass().await;
        }

        h.market_state.lock().unwrap().1 = 500.0;
        *h.digest.lock().unwrap() = "a | b | c | d | e".to_string();
        h.pipeline.run_analysis_pass().await;
    }

    #[tokio::test]
    async fn bullish_spike_opens_a_trade_and_take_profit_closes_it() {
        let mut h = harness(true, "ACTION: BUY\nCONFIDENCE: 90\nREASON: momentum confirmed").await;

        warm_up_and_spike(&mut h).await;

        let open = h.ledger.open_trades().await.unwrap();
        assert_eq!(open.len(), 1, "spike pass should open exactly one trade");
        assert_eq!(open[0].ticker, "$SOL");
        assert_eq!(open[0].entry_price, 10.0);
        assert_eq!(open[0].persona_id.as_deref(), Some("alpha"));
        assert_eq!(h.ledger.get_balance("USD").await.unwrap(), 9900.0);

        // +15% triggers the ledger's take-profit on the next price check
        h.market_state.lock().unwrap().0 = 11.5;
        h.pipeline.run_price_check_pass().await;

        assert!(h.ledger.open_trades().await.unwrap().is_empty());
        assert_eq!(h.ledger.get_balance("USD").await.unwrap(), 10015.0);
    }

    #[tokio::test]
    async fn quiet_market_never_reaches_the_ensemble() {
        let mut h = harness(true, "ACTION: BUY\nCONFIDENCE: 99\nREASON: always buy").await;

        for _ in 0..4 {
            h.pipeline.run_analysis_pass().await;
        }

        assert!(h.ledger.open_trades().await.unwrap().is_empty());
        assert_eq!(h.ledger.get_balance("USD").await.unwrap(), 10000.0);
    }

    #[tokio::test]
    async fn unsafe_token_is_gated_before_scoring() {
        let mut h = harness(false, "ACTION: BUY\nCONFIDENCE: 99\nREASON: yolo").await;

        warm_up_and_spike(&mut h).await;

        assert!(h.ledger.open_trades().await.unwrap().is_empty());
        assert_eq!(h.ledger.get_balance("USD").await.unwrap(), 10000.0);
    }

    #[tokio::test]
    async fn low_conviction_buy_is_ignored() {
        let mut h = harness(true, "ACTION: BUY\nCONFIDENCE: 40\nREASON: mild interest").await;

        warm_up_and_spike(&mut h).await;

        assert!(h.ledger.open_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hold_decision_opens_nothing() {
        let mut h = harness(true, "ACTION: HOLD\nCONFIDENCE: 95\nREASON: waiting").await;

        warm_up_and_spike(&mut h).await;

        assert!(h.ledger.open_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bullish_signal_is_broadcast_to_the_alert_channel() {
        let mut h = harness(true, "ACTION: HOLD\nCONFIDENCE: 0\nREASON: none").await;
        let mut rx = h.pipeline.alert_tx.subscribe();

        warm_up_and_spike(&mut h).await;

        let alert = rx.try_recv().expect("spike should produce one alert");
        assert!(alert.contains("BULLISH"));
        assert!(alert.contains("$SOL"));
    }

    #[test]
    fn headline_count_splits_the_digest() {
        assert_eq!(headline_count(""), 0.0);
        assert_eq!(headline_count("one headline"), 1.0);
        assert_eq!(headline_count("a | b | c"), 3.0);
    }

    #[test]
    fn alert_text_carries_levels_and_risk_reward() {
        let signal = Signal {
            ticker: "$SOL".to_string(),
            sentiment_z: 3.0,
            volume_z: 2.5,
            rsi: 28.0,
            macd: 0.1,
            macd_signal: 0.05,
            macd_hist: 0.05,
            confidence: 85,
            entry_price: 100.0,
            target_price: 125.0,
            stop_loss: 92.0,
            direction: SignalDirection::Bullish,
            risk_reward: "1:3".to_string(),
        };

        let text = format_alert(&signal);
        assert!(text.contains("BULLISH signal for $SOL"));
        assert!(text.contains("Confidence: 85/99"));
        assert!(text.contains("Target: $125"));
        assert!(text.contains("R/R 1:3"));
    }
}
