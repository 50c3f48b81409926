//! SQLite storage implementation.
//!
//! A file-based storage backend using SQLite. Two tables:
//! - `jobs`: one row per getter name, overwritten on every run
//! - `records`: one row per record key, owned by the getter that last found it
//!
//! Timestamps are stored as RFC 3339 text. A persist writes the exact same
//! string to `jobs.last_run_at` and to every `records.last_found_at`, which
//! is what makes staleness a plain comparison.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::traits::store::ResultStore;
use crate::types::{
    info::{JobInfo, RecordInfo},
    meta,
    record::Record,
    run::RunResult,
};

/// Maximum records per upsert statement.
pub const RECORD_BATCH_SIZE: usize = 800;

/// Insert-or-update keyed by a unique column.
///
/// Describes which columns are inserted and which of them are overwritten
/// when the key already exists. Columns left out of `overwrite` keep their
/// stored value.
struct Upsert {
    table: &'static str,
    conflict_key: &'static str,
    columns: &'static [&'static str],
    overwrite: &'static [&'static str],
}

impl Upsert {
    fn insert_into(&self) -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            self.table,
            self.columns.join(", ")
        ))
    }

    fn on_conflict(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        let assignments = self
            .overwrite
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");

        qb.push(" ON CONFLICT(")
            .push(self.conflict_key)
            .push(") DO UPDATE SET ")
            .push(assignments);
    }
}

const JOB_UPSERT: Upsert = Upsert {
    table: "jobs",
    conflict_key: "name",
    columns: &[
        "name",
        "last_run_at",
        "duration_seconds",
        "success",
        "records_found",
        "error",
    ],
    overwrite: &[
        "last_run_at",
        "duration_seconds",
        "success",
        "records_found",
        "error",
    ],
};

const RECORD_UPSERT: Upsert = Upsert {
    table: "records",
    conflict_key: "key",
    columns: &[
        "key",
        "country",
        "category",
        "subcategory",
        "meta",
        "first_found_at",
        "last_found_at",
        "found_by",
    ],
    // first_found_at is kept from the original insert
    overwrite: &[
        "country",
        "category",
        "subcategory",
        "meta",
        "last_found_at",
        "found_by",
    ],
};

/// SQLite-based result store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to a SQLite database, creating the file if missing.
    ///
    /// # Example URLs
    /// - `sqlite://results.db` - File-based database
    /// - `sqlite::memory:` - In-memory database (one per connection)
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(EngineError::storage)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(EngineError::storage)?;

        Ok(Self { pool })
    }

    /// Create an in-memory store with its schema (for testing).
    ///
    /// Uses a single connection that is never recycled, since every SQLite
    /// in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(EngineError::storage)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(EngineError::storage)?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::storage(format!("Invalid date {:?}: {}", raw, e)))
}

/// One row per key, the last occurrence winning.
fn latest_per_key(records: &[Record]) -> Vec<&Record> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<&Record> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(record.key.as_str()) {
            Some(&i) => unique[i] = record,
            None => {
                positions.insert(record.key.as_str(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct JobRow {
    name: String,
    last_run_at: String,
    duration_seconds: f64,
    success: bool,
    records_found: Option<i64>,
    error: Option<String>,
}

impl JobRow {
    fn into_job_info(self) -> Result<JobInfo> {
        Ok(JobInfo {
            last_run_at: parse_timestamp(&self.last_run_at)?,
            name: self.name,
            duration_seconds: self.duration_seconds,
            success: self.success,
            records_found: self.records_found,
            error: self.error,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    key: String,
    country: String,
    category: String,
    subcategory: String,
    meta: String,
    first_found_at: String,
    last_found_at: String,
    found_by: String,
}

impl RecordRow {
    fn into_record_info(self) -> Result<RecordInfo> {
        Ok(RecordInfo {
            meta: meta::from_json(&self.meta)?,
            first_found_at: parse_timestamp(&self.first_found_at)?,
            last_found_at: parse_timestamp(&self.last_found_at)?,
            key: self.key,
            country: self.country,
            category: self.category,
            subcategory: self.subcategory,
            found_by: self.found_by,
        })
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                last_run_at TEXT NOT NULL,
                duration_seconds REAL NOT NULL,
                success INTEGER NOT NULL,
                records_found INTEGER,
                error TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_last_run_at ON jobs(last_run_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(EngineError::storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id INTEGER PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                country TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT NOT NULL,
                meta TEXT NOT NULL DEFAULT '{}',
                first_found_at TEXT NOT NULL,
                last_found_at TEXT NOT NULL,
                found_by INTEGER NOT NULL REFERENCES jobs(id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_country ON records(country);
            CREATE INDEX IF NOT EXISTS idx_records_category ON records(category);
            CREATE INDEX IF NOT EXISTS idx_records_subcategory ON records(subcategory);
            CREATE INDEX IF NOT EXISTS idx_records_first_found_at ON records(first_found_at);
            CREATE INDEX IF NOT EXISTS idx_records_last_found_at ON records(last_found_at);
            CREATE INDEX IF NOT EXISTS idx_records_found_by ON records(found_by);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(EngineError::storage)?;

        Ok(())
    }

    async fn persist_at(&self, result: &RunResult, written_at: DateTime<Utc>) -> Result<()> {
        let run_at = timestamp(written_at);
        let mut tx = self.pool.begin().await.map_err(EngineError::storage)?;

        let mut job = JOB_UPSERT.insert_into();
        job.push_values(std::iter::once(result), |mut b, result| {
            b.push_bind(result.job_name.clone())
                .push_bind(run_at.clone())
                .push_bind(result.duration_seconds())
                .push_bind(result.success())
                .push_bind(result.records_found())
                .push_bind(result.error().map(str::to_string));
        });
        JOB_UPSERT.on_conflict(&mut job);
        job.push(" RETURNING id");

        let job_id: i64 = job
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .map_err(EngineError::storage)?;

        let Some(records) = result.records() else {
            tx.commit().await.map_err(EngineError::storage)?;
            return Ok(());
        };

        let records = latest_per_key(records);
        for (batch, chunk) in records.chunks(RECORD_BATCH_SIZE).enumerate() {
            let rows = chunk
                .iter()
                .map(|record| Ok((*record, meta::to_json(&record.meta)?)))
                .collect::<Result<Vec<_>>>()?;

            let mut upsert = RECORD_UPSERT.insert_into();
            upsert.push_values(rows, |mut b, (record, meta)| {
                b.push_bind(record.key.clone())
                    .push_bind(record.country.clone())
                    .push_bind(record.category.clone())
                    .push_bind(record.subcategory.clone())
                    .push_bind(meta)
                    .push_bind(timestamp(record.discovered_at))
                    .push_bind(run_at.clone())
                    .push_bind(job_id);
            });
            RECORD_UPSERT.on_conflict(&mut upsert);

            upsert
                .build()
                .execute(&mut *tx)
                .await
                .map_err(EngineError::storage)?;

            debug!(getter = %result.job_name, batch, rows = chunk.len(), "record batch upserted");
        }

        tx.commit().await.map_err(EngineError::storage)?;
        Ok(())
    }

    async fn job_infos(&self) -> Result<Vec<JobInfo>> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT name, last_run_at, duration_seconds, success, records_found, error FROM jobs ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::storage)?;

        rows.into_iter().map(|r| r.into_job_info()).collect()
    }

    async fn job_info(&self, name: &str) -> Result<Option<JobInfo>> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT name, last_run_at, duration_seconds, success, records_found, error FROM jobs WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(EngineError::storage)?;

        row.map(|r| r.into_job_info()).transpose()
    }

    async fn records(&self) -> Result<Vec<RecordInfo>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT r.key, r.country, r.category, r.subcategory, r.meta,
                   r.first_found_at, r.last_found_at, j.name AS found_by
            FROM records r
            JOIN jobs j ON j.id = r.found_by
            ORDER BY r.key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::storage)?;

        rows.into_iter().map(|r| r.into_record_info()).collect()
    }

    async fn remove_orphaned_jobs(&self, known: &[&str]) -> Result<Vec<String>> {
        let stored: Vec<String> = sqlx::query_scalar("SELECT name FROM jobs ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(EngineError::storage)?;

        let orphans: Vec<String> = stored
            .into_iter()
            .filter(|name| !known.contains(&name.as_str()))
            .collect();

        if orphans.is_empty() {
            return Ok(orphans);
        }

        let mut tx = self.pool.begin().await.map_err(EngineError::storage)?;
        for name in &orphans {
            let removed = sqlx::query(
                "DELETE FROM records WHERE found_by IN (SELECT id FROM jobs WHERE name = ?)",
            )
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(EngineError::storage)?;

            sqlx::query("DELETE FROM jobs WHERE name = ?")
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(EngineError::storage)?;

            info!(getter = %name, records = removed.rows_affected(), "removed orphaned getter");
        }
        tx.commit().await.map_err(EngineError::storage)?;

        Ok(orphans)
    }

    async fn remove_stale_records(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM records
            WHERE EXISTS (
                SELECT 1 FROM jobs j
                WHERE j.id = records.found_by
                  AND j.last_run_at != records.last_found_at
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(EngineError::storage)?;

        Ok(result.rows_affected())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(EngineError::storage)?;

        sqlx::query("DELETE FROM records")
            .execute(&mut *tx)
            .await
            .map_err(EngineError::storage)?;
        sqlx::query("DELETE FROM jobs")
            .execute(&mut *tx)
            .await
            .map_err(EngineError::storage)?;

        tx.commit().await.map_err(EngineError::storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn upsert_renders_overwrite_list() {
        let mut qb = RECORD_UPSERT.insert_into();
        qb.push("VALUES (1)");
        RECORD_UPSERT.on_conflict(&mut qb);

        let sql = qb.sql();
        assert!(sql.starts_with(
            "INSERT INTO records (key, country, category, subcategory, meta, first_found_at, last_found_at, found_by) "
        ));
        assert!(sql.contains("ON CONFLICT(key) DO UPDATE SET country = excluded.country"));
        assert!(sql.contains("last_found_at = excluded.last_found_at"));
        assert!(!sql.contains("first_found_at = excluded"));
    }

    #[test]
    fn last_duplicate_wins() {
        let records = vec![
            record("a.nl").with_meta_entry("n", 1i64),
            record("b.nl"),
            record("a.nl").with_meta_entry("n", 2i64),
        ];

        let unique = latest_per_key(&records);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].key, "a.nl");
        assert_eq!(unique[0].meta["n"], crate::types::MetaValue::Integer(2));
        assert_eq!(unique[1].key, "b.nl");
    }

    #[test]
    fn timestamps_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&timestamp(now)).unwrap();
        assert_eq!(timestamp(parsed), timestamp(now));
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.create_schema().await.unwrap();
        assert!(store.job_infos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_schema_is_a_storage_error() {
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();

        let err = store
            .persist(&RunResult::failed("nl_a", "timeout"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Storage(_)));
    }
}
