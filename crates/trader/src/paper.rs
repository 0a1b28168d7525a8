use std::collections::HashMap;

use chrono::Utc;
use common::models::trade::{Trade, STATUS_OPEN};
use sqlx::SqlitePool;
use storage::repositories::{PersonasRepository, PortfolioRepository, TradesRepository};
use tracing::{debug, info, warn};

/// Fixed exit policy, expressed as fractions of the entry price.
const TAKE_PROFIT_PCT: f64 = 0.15;
const STOP_LOSS_PCT: f64 = -0.10;

const TAKE_PROFIT_REASON: &str = "Take Profit (+15%)";
const STOP_LOSS_REASON: &str = "Stop Loss (-10%)";

/// Paper-trading ledger: one cash balance plus an append-only position
/// table. Positions move OPEN -> CLOSED exactly once and are never
/// amended or deleted.
pub struct PaperTrader {
    pool: SqlitePool,
}

impl PaperTrader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_balance(&self, asset: &str) -> Result<f64, sqlx::Error> {
        PortfolioRepository::get_balance(&self.pool, asset).await
    }

    pub async fn open_trades(&self) -> Result<Vec<Trade>, sqlx::Error> {
        TradesRepository::open_trades(&self.pool).await
    }

    pub async fn recent_closed(&self, limit: i64) -> Result<Vec<Trade>, sqlx::Error> {
        TradesRepository::recent_closed(&self.pool, limit).await
    }

    /// Opens a paper position, or returns false without touching anything
    /// when the price is not positive or cash cannot cover the stake. The
    /// balance check, debit, and insert share one transaction so
    /// concurrent opens cannot overdraw.
    pub async fn open_trade(
        &self,
        ticker: &str,
        price: f64,
        amount_usd: f64,
        confidence: f64,
        notes: &str,
        persona_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        if price <= 0.0 {
            warn!("Rejected trade for {}: invalid price {}", ticker, price);
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        let balance = PortfolioRepository::get_balance(&mut *tx, "USD").await?;
        if balance < amount_usd {
            info!(
                "Insufficient balance for {}: need {:.2}, have {:.2}",
                ticker, amount_usd, balance
            );
            tx.rollback().await?;
            return Ok(false);
        }

        PortfolioRepository::set_balance(&mut *tx, "USD", balance - amount_usd).await?;

        let now = Utc::now();
        let trade = Trade {
            id: format!("{}_{}", ticker, now.format("%Y%m%d%H%M%S")),
            ticker: ticker.to_string(),
            entry_price: price,
            amount: amount_usd / price,
            entry_time: now,
            status: STATUS_OPEN.to_string(),
            exit_price: 0.0,
            exit_time: None,
            pnl: 0.0,
            pnl_pct: 0.0,
            confidence_at_entry: confidence,
            notes: notes.to_string(),
            persona_id: persona_id.map(String::from),
        };
        TradesRepository::insert_open(&mut *tx, &trade).await?;

        tx.commit().await?;

        info!(
            "Opened {}: {:.6} units of {} @ {} (${:.2})",
            trade.id, trade.amount, ticker, price, amount_usd
        );
        Ok(true)
    }

    /// Marks every open position against current prices and closes those
    /// that crossed an exit threshold. Prices are looked up under the
    /// "$"-stripped upper-cased ticker first, then the raw ticker; a
    /// position with no price this tick is left untouched.
    pub async fn check_trades(
        &self,
        current_prices: &HashMap<String, f64>,
    ) -> Result<(), sqlx::Error> {
        let open = TradesRepository::open_trades(&self.pool).await?;

        for trade in open {
            let clean = trade.ticker.replace('$', "").to_uppercase();
            let price = current_prices
                .get(&clean)
                .or_else(|| current_prices.get(&trade.ticker))
                .copied();

            let Some(current) = price else {
                debug!("No current price for {}, skipping", trade.ticker);
                continue;
            };

            let pnl_pct = (current - trade.entry_price) / trade.entry_price;

            if pnl_pct >= TAKE_PROFIT_PCT {
                self.close_trade(&trade.id, current, TAKE_PROFIT_REASON).await?;
            } else if pnl_pct <= STOP_LOSS_PCT {
                self.close_trade(&trade.id, current, STOP_LOSS_REASON).await?;
            }
        }

        Ok(())
    }

    /// Closes one position at the given exit price, crediting the proceeds
    /// back to cash and recording realized P&L. Returns false when the
    /// position was unknown or already closed.
    pub async fn close_trade(
        &self,
        trade_id: &str,
        exit_price: f64,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let Some(trade) = TradesRepository::get(&self.pool, trade_id).await? else {
            warn!("close_trade: unknown trade {}", trade_id);
            return Ok(false);
        };

        let usd_returned = trade.amount * exit_price;
        let pnl = usd_returned - trade.amount * trade.entry_price;
        let pnl_pct = (exit_price - trade.entry_price) / trade.entry_price * 100.0;

        let mut tx = self.pool.begin().await?;

        let closed = TradesRepository::mark_closed(
            &mut *tx,
            trade_id,
            exit_price,
            Utc::now(),
            pnl,
            pnl_pct,
            reason,
        )
        .await?;
        if !closed {
            tx.rollback().await?;
            return Ok(false);
        }

        let balance = PortfolioRepository::get_balance(&mut *tx, "USD").await?;
        PortfolioRepository::set_balance(&mut *tx, "USD", balance + usd_returned).await?;

        tx.commit().await?;

        info!(
            "Closed {} at {} ({}): pnl {:.2} ({:.2}%)",
            trade_id, exit_price, reason, pnl, pnl_pct
        );

        if let Some(persona_id) = &trade.persona_id {
            PersonasRepository::refresh_track_record(&self.pool, persona_id).await?;
        }

        Ok(true)
    }
}
