use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use super::MIGRATION_001_SESSION_SLOTS;

/// Slot carrying the cash-count result over to the distinta closing step.
pub const FINAL_CASH_SLOT: &str = "valoreCassaCalcolato";

/// A value parked in the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSlot {
    pub key: String,
    pub value: String,
    pub stored_at: DateTime<Utc>,
}

/// Small key-value store bridging values between steps of the same session.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the store at the given file path and migrate it.
    pub async fn open(path: &str) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePool::connect(&url)
            .await
            .with_context(|| format!("Failed to open session store at {}", path))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Throwaway store living in memory, gone when dropped.
    pub async fn in_memory() -> Result<Self> {
        // A single pinned connection keeps the in-memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory session store")?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_SESSION_SLOTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Store a value, replacing whatever the slot held.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.put_at(key, value, Utc::now()).await
    }

    /// Like [`SessionStore::put`], with an explicit write time.
    pub async fn put_at(&self, key: &str, value: &str, stored_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_slots (key, value, stored_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(timestamp(stored_at))
        .execute(&self.pool)
        .await
        .context("Failed to write session slot")?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<SessionSlot>> {
        let row = sqlx::query("SELECT key, value, stored_at FROM session_slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read session slot")?;

        row.map(|row| Self::row_to_slot(&row)).transpose()
    }

    /// Read and clear a slot in one go.
    pub async fn take(&self, key: &str) -> Result<Option<SessionSlot>> {
        let slot = self.get(key).await?;
        if slot.is_some() {
            self.remove(key).await?;
        }
        Ok(slot)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_slots WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to clear session slot")?;
        Ok(())
    }

    /// Forget slots written before `cutoff`; returns how many were dropped.
    pub async fn expire_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session_slots WHERE stored_at < ?")
            .bind(timestamp(cutoff))
            .execute(&self.pool)
            .await
            .context("Failed to expire session slots")?;
        Ok(result.rows_affected())
    }

    fn row_to_slot(row: &sqlx::sqlite::SqliteRow) -> Result<SessionSlot> {
        let stored_at: String = row.get("stored_at");
        Ok(SessionSlot {
            key: row.get("key"),
            value: row.get("value"),
            stored_at: DateTime::parse_from_rfc3339(&stored_at)
                .context("Invalid stored_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

/// Fixed-width timestamps so they compare correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_take() -> Result<()> {
        let store = SessionStore::in_memory().await?;
        assert!(store.get(FINAL_CASH_SLOT).await?.is_none());

        store.put(FINAL_CASH_SLOT, "135.00").await?;
        store.put(FINAL_CASH_SLOT, "140.00").await?;

        let slot = store.get(FINAL_CASH_SLOT).await?.unwrap();
        assert_eq!(slot.value, "140.00");

        let taken = store.take(FINAL_CASH_SLOT).await?.unwrap();
        assert_eq!(taken.value, "140.00");
        assert!(store.get(FINAL_CASH_SLOT).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_expire_before() -> Result<()> {
        let store = SessionStore::in_memory().await?;
        let now = Utc::now();
        store.put("fresh", "1").await?;
        store.put_at("stale", "2", now - chrono::Duration::hours(3)).await?;

        let dropped = store.expire_before(now - chrono::Duration::hours(1)).await?;
        assert_eq!(dropped, 1);
        assert!(store.get("stale").await?.is_none());
        assert!(store.get("fresh").await?.is_some());
        Ok(())
    }
}
