use dotenvy::dotenv;
use std::{env, sync::Arc};
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use agents::catalog;
use agents::ensemble::DecisionEnsemble;
use agents::evolution::EvolutionLoop;
use agents::roster::BackendRoster;
use common::logger;
use market_data::remote::{
    CointelegraphClient, DefiLlamaClient, DexScreenerClient, RugCheckClient,
};
use trader::PaperTrader;

use crate::services::pipeline_service::PipelineService;
use crate::services::telegram_service::TelegramService;

mod services;

const WATCHLIST: &[&str; 5] = &["$SOL", "$BTC", "$ETH", "$PEPE", "$WIF"];

/// Full analysis pass: scrape, correlate, ask the ensemble, open trades.
const ANALYSIS_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Exit checks against current prices only.
const PRICE_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Strategy evolution over recently closed trades.
const LEARNING_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    debug!("System starting up...");

    let db_path =
        env::var("DATABASE_PATH").unwrap_or_else(|_| "data/ticker_agent.db".to_string());
    let pool = storage::db::connect(&db_path).await?;

    catalog::seed_registry(&pool).await?;

    let roster = BackendRoster::from_env();
    let optimizer = roster.optimizer();

    let (alert_tx, _) = broadcast::channel::<String>(100);
    match TelegramService::from_env() {
        Some(telegram) => {
            tokio::spawn(telegram.start(alert_tx.subscribe()));
        }
        None => warn!("Telegram not configured, alerts will only be logged"),
    }

    let ensemble = DecisionEnsemble::new(pool.clone(), roster);
    let ledger = PaperTrader::new(pool.clone());
    let evolution = EvolutionLoop::new(pool.clone(), optimizer);

    let mut pipeline = PipelineService::new(
        WATCHLIST,
        Arc::new(DexScreenerClient::new()),
        Arc::new(DefiLlamaClient::new()),
        Arc::new(CointelegraphClient::new()),
        Arc::new(RugCheckClient::new()),
        ensemble,
        ledger,
        alert_tx,
    );

    let mut analysis = interval(ANALYSIS_INTERVAL);
    let mut price_check = interval(PRICE_CHECK_INTERVAL);
    let mut learning = interval(LEARNING_INTERVAL);

    info!(
        "Ticker agent running: {} tickers on the watchlist",
        WATCHLIST.len()
    );

    loop {
        tokio::select! {
            _ = analysis.tick() => pipeline.run_analysis_pass().await,
            _ = price_check.tick() => pipeline.run_price_check_pass().await,
            _ = learning.tick() => {
                if let Err(e) = evolution.run_learning_loop().await {
                    error!("Learning loop failed: {}", e);
                }
            }
        }
    }
}
