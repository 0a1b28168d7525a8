use chrono::{DateTime, Utc};
use common::models::trade::{Trade, STATUS_CLOSED, STATUS_OPEN};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};

pub struct TradesRepository;

impl TradesRepository {
    pub async fn insert_open(
        executor: impl SqliteExecutor<'_>,
        trade: &Trade,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO trades
                (id, ticker, entry_price, amount, entry_time, status,
                 confidence_at_entry, notes, persona_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&trade.id)
        .bind(&trade.ticker)
        .bind(trade.entry_price)
        .bind(trade.amount)
        .bind(trade.entry_time)
        .bind(&trade.status)
        .bind(trade.confidence_at_entry)
        .bind(&trade.notes)
        .bind(&trade.persona_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Trade>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM trades WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    pub async fn open_trades(pool: &SqlitePool) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM trades WHERE status = ? ORDER BY entry_time ASC")
            .bind(STATUS_OPEN)
            .fetch_all(pool)
            .await?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Most recently closed trades that are attributable to a persona,
    /// newest exit first.
    pub async fn recent_closed(pool: &SqlitePool, limit: i64) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM trades
             WHERE status = ? AND persona_id IS NOT NULL
             ORDER BY exit_time DESC
             LIMIT ?",
        )
        .bind(STATUS_CLOSED)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Transitions an OPEN trade to CLOSED, recording the exit. Returns
    /// false when the trade was missing or already closed, so a caller
    /// never credits the same position twice.
    pub async fn mark_closed(
        executor: impl SqliteExecutor<'_>,
        id: &str,
        exit_price: f64,
        exit_time: DateTime<Utc>,
        pnl: f64,
        pnl_pct: f64,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE trades
             SET status = ?, exit_price = ?, exit_time = ?, pnl = ?, pnl_pct = ?,
                 notes = notes || ' - ' || ?
             WHERE id = ? AND status = ?",
        )
        .bind(STATUS_CLOSED)
        .bind(exit_price)
        .bind(exit_time)
        .bind(pnl)
        .bind(pnl_pct)
        .bind(reason)
        .bind(id)
        .bind(STATUS_OPEN)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn from_row(row: &SqliteRow) -> Result<Trade, sqlx::Error> {
        Ok(Trade {
            id: row.try_get("id")?,
            ticker: row.try_get("ticker")?,
            entry_price: row.try_get("entry_price")?,
            amount: row.try_get("amount")?,
            entry_time: row.try_get("entry_time")?,
            status: row.try_get("status")?,
            exit_price: row.try_get("exit_price")?,
            exit_time: row.try_get("exit_time")?,
            pnl: row.try_get("pnl")?,
            pnl_pct: row.try_get("pnl_pct")?,
            confidence_at_entry: row.try_get("confidence_at_entry")?,
            notes: row.try_get("notes")?,
            persona_id: row.try_get("persona_id")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn sample_trade(id: &str, persona: Option<&str>) -> Trade {
        Trade {
            id: id.to_string(),
            ticker: "SOL".to_string(),
            entry_price: 10.0,
            amount: 100.0,
            entry_time: Utc::now(),
            status: STATUS_OPEN.to_string(),
            exit_price: 0.0,
            exit_time: None,
            pnl: 0.0,
            pnl_pct: 0.0,
            confidence_at_entry: 80.0,
            notes: "Auto-trade".to_string(),
            persona_id: persona.map(String::from),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let pool = connect_in_memory().await.unwrap();
        let trade = sample_trade("SOL_1", Some("Gemini_Trend"));

        TradesRepository::insert_open(&pool, &trade).await.unwrap();
        let stored = TradesRepository::get(&pool, "SOL_1").await.unwrap().unwrap();

        assert_eq!(stored.ticker, "SOL");
        assert_eq!(stored.entry_price, 10.0);
        assert_eq!(stored.amount, 100.0);
        assert_eq!(stored.status, STATUS_OPEN);
        assert_eq!(stored.exit_time, None);
        assert_eq!(stored.persona_id.as_deref(), Some("Gemini_Trend"));
    }

    #[tokio::test]
    async fn open_trades_excludes_closed_rows() {
        let pool = connect_in_memory().await.unwrap();
        TradesRepository::insert_open(&pool, &sample_trade("a", None))
            .await
            .unwrap();
        TradesRepository::insert_open(&pool, &sample_trade("b", None))
            .await
            .unwrap();

        let closed = TradesRepository::mark_closed(&pool, "a", 11.0, Utc::now(), 100.0, 10.0, "Take Profit")
            .await
            .unwrap();
        assert!(closed);

        let open = TradesRepository::open_trades(&pool).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "b");
    }

    #[tokio::test]
    async fn mark_closed_is_a_one_way_transition() {
        let pool = connect_in_memory().await.unwrap();
        TradesRepository::insert_open(&pool, &sample_trade("a", None))
            .await
            .unwrap();

        let first = TradesRepository::mark_closed(&pool, "a", 12.0, Utc::now(), 200.0, 20.0, "Take Profit")
            .await
            .unwrap();
        let second = TradesRepository::mark_closed(&pool, "a", 9.0, Utc::now(), -100.0, -10.0, "Stop Loss")
            .await
            .unwrap();
        assert!(first);
        assert!(!second, "a closed trade must never close again");

        let stored = TradesRepository::get(&pool, "a").await.unwrap().unwrap();
        assert_eq!(stored.exit_price, 12.0);
        assert_eq!(stored.notes, "Auto-trade - Take Profit");
        assert!(stored.exit_time.is_some());
    }

    #[tokio::test]
    async fn recent_closed_skips_unattributed_trades_and_orders_by_exit() {
        let pool = connect_in_memory().await.unwrap();
        TradesRepository::insert_open(&pool, &sample_trade("manual", None))
            .await
            .unwrap();
        TradesRepository::insert_open(&pool, &sample_trade("old", Some("Gemini_Trend")))
            .await
            .unwrap();
        TradesRepository::insert_open(&pool, &sample_trade("new", Some("Cerebras_Sniper")))
            .await
            .unwrap();

        let t0 = Utc::now();
        TradesRepository::mark_closed(&pool, "manual", 11.0, t0, 100.0, 10.0, "tp")
            .await
            .unwrap();
        TradesRepository::mark_closed(&pool, "old", 11.0, t0 + chrono::Duration::seconds(1), 100.0, 10.0, "tp")
            .await
            .unwrap();
        TradesRepository::mark_closed(&pool, "new", 11.0, t0 + chrono::Duration::seconds(2), 100.0, 10.0, "tp")
            .await
            .unwrap();

        let recent = TradesRepository::recent_closed(&pool, 5).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"], "newest exit first, persona-less rows dropped");
    }
}
