//! Durable per-account settings store backed by SQLite.
//!
//! Enum fields are persisted as raw TEXT tags and treated as untrusted on
//! the way back out: every load runs them through [`normalize`], so a record
//! written by an older schema or edited by hand still produces a renderable
//! configuration.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::DEFAULT_SYNC_INTERVAL_MINUTES;
use crate::reconcile::FieldChange;
use crate::settings::{AccountSyncConfig, IntervalField, normalize};

/// Connection pool size - allows concurrent reads
const POOL_SIZE: u32 = 4;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Get a reference to the connection pool (for tests)
    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn open(path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect_with(options)
            .await
            .context("Failed to create connection pool")?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create in-memory connection pool")?;

        Self::init_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS accounts (
                account_id TEXT PRIMARY KEY,
                account_type TEXT NOT NULL,
                sync_mode TEXT NOT NULL,
                sync_interval_minutes INTEGER NOT NULL,
                night_mode_enabled INTEGER NOT NULL DEFAULT 0,
                ignore_battery_saver INTEGER NOT NULL DEFAULT 0,
                contacts_sync_days INTEGER NOT NULL DEFAULT 1,
                notes_sync_days INTEGER NOT NULL DEFAULT 1,
                calendar_sync_days INTEGER NOT NULL DEFAULT 1,
                tasks_sync_days INTEGER NOT NULL DEFAULT 1,
                cleanup_trash_days INTEGER NOT NULL DEFAULT 0,
                cleanup_drafts_days INTEGER NOT NULL DEFAULT 0,
                cleanup_spam_days INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("Failed to initialize schema")?;

        Ok(())
    }

    /// Load one account's settings, normalizing stored enum tags.
    pub async fn get(&self, account_id: &str) -> Result<Option<AccountSyncConfig>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load account settings")?;

        Ok(row.map(|row| Self::row_to_config(&row)))
    }

    /// All stored accounts, ordered by id.
    pub async fn list(&self) -> Result<Vec<AccountSyncConfig>> {
        let rows = sqlx::query("SELECT * FROM accounts ORDER BY account_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.iter().map(Self::row_to_config).collect())
    }

    /// Insert a new account record. Fails if the account already exists.
    pub async fn insert(&self, config: &AccountSyncConfig) -> Result<()> {
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            "INSERT INTO accounts (
                account_id, account_type, sync_mode, sync_interval_minutes,
                night_mode_enabled, ignore_battery_saver,
                contacts_sync_days, notes_sync_days, calendar_sync_days, tasks_sync_days,
                cleanup_trash_days, cleanup_drafts_days, cleanup_spam_days,
                updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&config.account_id)
        .bind(config.account_type.as_tag())
        .bind(config.sync_mode.as_tag())
        .bind(config.sync_interval_minutes as i64)
        .bind(config.night_mode_enabled as i64)
        .bind(config.ignore_battery_saver as i64)
        .bind(config.contacts_sync_days as i64)
        .bind(config.notes_sync_days as i64)
        .bind(config.calendar_sync_days as i64)
        .bind(config.tasks_sync_days as i64)
        .bind(config.cleanup_trash_days as i64)
        .bind(config.cleanup_drafts_days as i64)
        .bind(config.cleanup_spam_days as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert account {}", config.account_id))?;

        Ok(())
    }

    /// Persist a single field change, stamping `updated_at`.
    pub async fn update_field(&self, account_id: &str, change: &FieldChange) -> Result<()> {
        let now = Utc::now().timestamp_millis();

        let result = match change {
            FieldChange::SyncMode(mode) => {
                sqlx::query("UPDATE accounts SET sync_mode = ?, updated_at = ? WHERE account_id = ?")
                    .bind(mode.as_tag())
                    .bind(now)
                    .bind(account_id)
                    .execute(&self.pool)
                    .await
            }
            FieldChange::SyncIntervalMinutes(minutes) => {
                sqlx::query(
                    "UPDATE accounts SET sync_interval_minutes = ?, updated_at = ? WHERE account_id = ?",
                )
                .bind(*minutes as i64)
                .bind(now)
                .bind(account_id)
                .execute(&self.pool)
                .await
            }
            FieldChange::NightModeEnabled(enabled) => {
                sqlx::query(
                    "UPDATE accounts SET night_mode_enabled = ?, updated_at = ? WHERE account_id = ?",
                )
                .bind(*enabled as i64)
                .bind(now)
                .bind(account_id)
                .execute(&self.pool)
                .await
            }
            FieldChange::IgnoreBatterySaver(ignore) => {
                sqlx::query(
                    "UPDATE accounts SET ignore_battery_saver = ?, updated_at = ? WHERE account_id = ?",
                )
                .bind(*ignore as i64)
                .bind(now)
                .bind(account_id)
                .execute(&self.pool)
                .await
            }
            FieldChange::IntervalDays(field, days) => {
                // Column name comes from a fixed mapping, never from input.
                let sql = format!(
                    "UPDATE accounts SET {} = ?, updated_at = ? WHERE account_id = ?",
                    day_column(*field)
                );
                sqlx::query(&sql)
                    .bind(*days as i64)
                    .bind(now)
                    .bind(account_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .with_context(|| format!("Failed to update settings for account {}", account_id))?;

        if result.rows_affected() == 0 {
            anyhow::bail!("no stored settings for account {}", account_id);
        }

        Ok(())
    }

    /// Delete an account record. Returns whether a record existed.
    pub async fn delete(&self, account_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete account {}", account_id))?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_config(row: &SqliteRow) -> AccountSyncConfig {
        let raw_type: String = row.get("account_type");
        let raw_mode: String = row.get("sync_mode");
        let (account_type, sync_mode) = normalize(&raw_type, &raw_mode);

        AccountSyncConfig {
            account_id: row.get("account_id"),
            account_type,
            sync_mode,
            sync_interval_minutes: read_u32(
                row,
                "sync_interval_minutes",
                DEFAULT_SYNC_INTERVAL_MINUTES,
            ),
            night_mode_enabled: row.get::<i64, _>("night_mode_enabled") != 0,
            ignore_battery_saver: row.get::<i64, _>("ignore_battery_saver") != 0,
            contacts_sync_days: read_u32(row, "contacts_sync_days", 0),
            notes_sync_days: read_u32(row, "notes_sync_days", 0),
            calendar_sync_days: read_u32(row, "calendar_sync_days", 0),
            tasks_sync_days: read_u32(row, "tasks_sync_days", 0),
            cleanup_trash_days: read_u32(row, "cleanup_trash_days", 0),
            cleanup_drafts_days: read_u32(row, "cleanup_drafts_days", 0),
            cleanup_spam_days: read_u32(row, "cleanup_spam_days", 0),
        }
    }
}

fn day_column(field: IntervalField) -> &'static str {
    match field {
        IntervalField::Contacts => "contacts_sync_days",
        IntervalField::Notes => "notes_sync_days",
        IntervalField::Calendar => "calendar_sync_days",
        IntervalField::Tasks => "tasks_sync_days",
        IntervalField::CleanupTrash => "cleanup_trash_days",
        IntervalField::CleanupDrafts => "cleanup_drafts_days",
        IntervalField::CleanupSpam => "cleanup_spam_days",
    }
}

/// A hand-edited negative or oversized count degrades to the fallback
/// rather than failing the load.
fn read_u32(row: &SqliteRow, column: &str, fallback: u32) -> u32 {
    u32::try_from(row.get::<i64, _>(column)).unwrap_or(fallback)
}
