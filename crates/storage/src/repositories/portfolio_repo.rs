use chrono::Utc;
use sqlx::{Row, SqliteExecutor};

pub struct PortfolioRepository;

impl PortfolioRepository {
    /// Current balance for an asset, 0.0 when no row exists. Takes any
    /// executor so it can run standalone or inside a ledger transaction.
    pub async fn get_balance(
        executor: impl SqliteExecutor<'_>,
        asset: &str,
    ) -> Result<f64, sqlx::Error> {
        let row = sqlx::query("SELECT balance FROM portfolio WHERE asset = ?")
            .bind(asset)
            .fetch_optional(executor)
            .await?;

        match row {
            Some(row) => row.try_get("balance"),
            None => Ok(0.0),
        }
    }

    pub async fn set_balance(
        executor: impl SqliteExecutor<'_>,
        asset: &str,
        balance: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO portfolio (asset, balance, last_updated)
             VALUES (?, ?, ?)
             ON CONFLICT(asset) DO UPDATE SET
                balance = excluded.balance,
                last_updated = excluded.last_updated",
        )
        .bind(asset)
        .bind(balance)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn usd_is_seeded_with_starting_cash() {
        let pool = connect_in_memory().await.unwrap();

        let balance = PortfolioRepository::get_balance(&pool, "USD").await.unwrap();
        assert_eq!(balance, 10000.0, "fresh database should hold the seed cash");
    }

    #[tokio::test]
    async fn missing_asset_reads_as_zero() {
        let pool = connect_in_memory().await.unwrap();

        let balance = PortfolioRepository::get_balance(&pool, "EUR").await.unwrap();
        assert_eq!(balance, 0.0);
    }

    #[tokio::test]
    async fn set_balance_upserts() {
        let pool = connect_in_memory().await.unwrap();

        PortfolioRepository::set_balance(&pool, "USD", 9000.0)
            .await
            .unwrap();
        assert_eq!(
            PortfolioRepository::get_balance(&pool, "USD").await.unwrap(),
            9000.0
        );

        PortfolioRepository::set_balance(&pool, "BTC", 0.5).await.unwrap();
        assert_eq!(
            PortfolioRepository::get_balance(&pool, "BTC").await.unwrap(),
            0.5
        );
    }
}
