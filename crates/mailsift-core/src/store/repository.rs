//! Email repository for persistent storage of enriched records.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::Result;
use crate::pipeline::UNKNOWN_PLATFORM;
use crate::policy::AccountKey;
use crate::record::{EmailRecord, EnrichedRecord, Enrichment};

/// Repository for accepted, enriched messages and per-account sync state.
pub struct EmailRepository {
    pool: SqlitePool,
}

/// Aggregate counts over stored messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Total stored messages.
    pub total: u64,
    /// Count per account (`provider:name`).
    pub by_account: BTreeMap<String, u64>,
    /// Count per platform, `unknown` when none was detected.
    pub by_platform: BTreeMap<String, u64>,
    /// Count per notification type, `general` when none was detected.
    pub by_notification_type: BTreeMap<String, u64>,
}

impl EmailRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emails (
                id TEXT PRIMARY KEY,
                account TEXT NOT NULL,
                sender TEXT NOT NULL,
                subject TEXT NOT NULL,
                folder TEXT NOT NULL,
                body TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                has_attachments INTEGER NOT NULL DEFAULT 0,
                platform TEXT,
                notification_type TEXT,
                original_url TEXT,
                fetched_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for the usual analytics queries
        for (name, column) in [
            ("idx_emails_timestamp", "timestamp"),
            ("idx_emails_sender", "sender"),
            ("idx_emails_platform", "platform"),
            ("idx_emails_notification_type", "notification_type"),
            ("idx_emails_account", "account"),
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name} ON emails({column})"
            ))
            .execute(&self.pool)
            .await?;
        }

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sync_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or update a batch of enriched messages in one transaction.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; nothing from the
    /// batch is kept in that case.
    pub async fn upsert_batch(
        &self,
        account: &AccountKey,
        records: &[EnrichedRecord],
    ) -> Result<u64> {
        let account = account.to_string();
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for enriched in records {
            let r = &enriched.record;
            let e = &enriched.enrichment;
            let result = sqlx::query(
                r"
                INSERT INTO emails (id, account, sender, subject, folder, body, timestamp,
                                    is_read, has_attachments, platform, notification_type,
                                    original_url)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    account = excluded.account,
                    sender = excluded.sender,
                    subject = excluded.subject,
                    folder = excluded.folder,
                    body = excluded.body,
                    timestamp = excluded.timestamp,
                    is_read = excluded.is_read,
                    has_attachments = excluded.has_attachments,
                    platform = excluded.platform,
                    notification_type = excluded.notification_type,
                    original_url = excluded.original_url,
                    fetched_at = CURRENT_TIMESTAMP
                ",
            )
            .bind(&r.id)
            .bind(&account)
            .bind(&r.sender)
            .bind(&r.subject)
            .bind(&r.folder)
            .bind(&r.body)
            .bind(r.timestamp.to_rfc3339())
            .bind(r.is_read)
            .bind(r.has_attachments)
            .bind(e.platform.as_deref())
            .bind(e.notification_type.as_deref())
            .bind(e.original_url.as_deref())
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// Get a stored message by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the stored timestamp
    /// is corrupt.
    pub async fn get(&self, id: &str) -> Result<Option<EnrichedRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, sender, subject, folder, body, timestamp, is_read, has_attachments,
                   platform, notification_type, original_url
            FROM emails
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Ids of every stored message, for deduplicating the next fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn existing_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT id FROM emails")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("id")).collect())
    }

    /// Number of stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[allow(clippy::cast_sign_loss)]
    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM emails")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count") as u64)
    }

    /// Aggregate counts by account, platform and notification type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total: self.count().await?,
            by_account: self.count_grouped("account", "account").await?,
            by_platform: self
                .count_grouped(&format!("COALESCE(platform, '{UNKNOWN_PLATFORM}')"), "platform")
                .await?,
            by_notification_type: self
                .count_grouped("COALESCE(notification_type, 'general')", "notification_type")
                .await?,
        })
    }

    #[allow(clippy::cast_sign_loss)]
    async fn count_grouped(&self, expr: &str, label: &str) -> Result<BTreeMap<String, u64>> {
        let rows = sqlx::query(&format!(
            "SELECT {expr} AS {label}, COUNT(*) AS count FROM emails GROUP BY 1"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get::<String, _>(label), r.get::<i64, _>("count") as u64))
            .collect())
    }

    /// When an account was last synced successfully.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn last_sync(&self, account: &AccountKey) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT value FROM sync_state WHERE key = ?")
            .bind(sync_key(account))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| {
            DateTime::parse_from_rfc3339(&r.get::<String, _>("value"))
                .ok()
                .map(|ts| ts.with_timezone(&Utc))
        }))
    }

    /// Record a successful sync of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn set_last_sync(&self, account: &AccountKey, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sync_state (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(sync_key(account))
        .bind(at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn sync_key(account: &AccountKey) -> String {
    format!("last_sync:{account}")
}

/// Convert a database row to an enriched record.
fn row_to_record(row: &SqliteRow) -> Result<EnrichedRecord> {
    let raw_ts: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);

    Ok(EnrichedRecord {
        record: EmailRecord {
            id: row.get("id"),
            sender: row.get("sender"),
            subject: row.get("subject"),
            folder: row.get("folder"),
            timestamp,
            is_read: row.get("is_read"),
            has_attachments: row.get("has_attachments"),
            body: row.get("body"),
        },
        enrichment: Enrichment {
            platform: row.get("platform"),
            notification_type: row.get("notification_type"),
            original_url: row.get("original_url"),
        },
    })
}
