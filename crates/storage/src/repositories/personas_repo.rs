use chrono::Utc;
use common::models::Persona;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

pub struct PersonasRepository;

impl PersonasRepository {
    /// Registers a persona if its id is not already present. Existing rows
    /// are never touched, so instruction rewrites survive restarts.
    /// Returns true when a new row was created.
    pub async fn insert_if_missing(
        pool: &SqlitePool,
        persona_id: &str,
        name: &str,
        model_provider: &str,
        instructions: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO personas
                (persona_id, name, model_provider, instructions, last_updated)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(persona_id)
        .bind(name)
        .bind(model_provider)
        .bind(instructions)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            info!("Registered persona {} ({})", persona_id, model_provider);
        }
        Ok(created)
    }

    pub async fn active(pool: &SqlitePool) -> Result<Vec<Persona>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM personas WHERE active = 1 ORDER BY persona_id")
            .fetch_all(pool)
            .await?;

        rows.iter().map(Self::from_row).collect()
    }

    pub async fn get(pool: &SqlitePool, persona_id: &str) -> Result<Option<Persona>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM personas WHERE persona_id = ?")
            .bind(persona_id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    /// Overwrites a persona's instruction text. The evolution loop is the
    /// only caller.
    pub async fn update_instructions(
        pool: &SqlitePool,
        persona_id: &str,
        instructions: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE personas SET instructions = ?, last_updated = ? WHERE persona_id = ?",
        )
        .bind(instructions)
        .bind(Utc::now())
        .bind(persona_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Recomputes a persona's cumulative win rate and realized pnl from its
    /// closed trades.
    pub async fn refresh_track_record(
        pool: &SqlitePool,
        persona_id: &str,
    ) -> Result<(), sqlx::Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n, COALESCE(SUM(pnl > 0), 0) AS wins,
                    COALESCE(SUM(pnl), 0.0) AS total
             FROM trades
             WHERE persona_id = ? AND status = 'CLOSED'",
        )
        .bind(persona_id)
        .fetch_one(pool)
        .await?;

        let n: i64 = row.try_get("n")?;
        let wins: i64 = row.try_get("wins")?;
        let total: f64 = row.try_get("total")?;
        let win_rate = if n > 0 {
            wins as f64 / n as f64 * 100.0
        } else {
            0.0
        };

        sqlx::query(
            "UPDATE personas SET win_rate = ?, total_pnl = ?, last_updated = ?
             WHERE persona_id = ?",
        )
        .bind(win_rate)
        .bind(total)
        .bind(Utc::now())
        .bind(persona_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    fn from_row(row: &SqliteRow) -> Result<Persona, sqlx::Error> {
        Ok(Persona {
            persona_id: row.try_get("persona_id")?,
            name: row.try_get("name")?,
            model_provider: row.try_get("model_provider")?,
            instructions: row.try_get("instructions")?,
            win_rate: row.try_get("win_rate")?,
            total_pnl: row.try_get("total_pnl")?,
            active: row.try_get("active")?,
            last_updated: row.try_get("last_updated")?,
        })
    }
}
