//! Storage trait for run results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{
    info::{JobInfo, RecordInfo},
    run::RunResult,
};

/// Durable storage of getter runs and the records they found.
///
/// One `JobInfo` row per getter name (overwritten on every run) and one
/// `RecordInfo` row per record key (overwritten on rediscovery, with the
/// original `first_found_at` kept).
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Create tables and indexes if they do not exist.
    async fn create_schema(&self) -> Result<()>;

    /// Persist one run result, stamped with the current time.
    ///
    /// Upserts the job row, then (on success only) upserts every record in
    /// fixed-size batches. The whole call commits or rolls back as a unit.
    async fn persist(&self, result: &RunResult) -> Result<()> {
        self.persist_at(result, Utc::now()).await
    }

    /// Persist one run result with an explicit write time.
    ///
    /// `written_at` becomes the job's `last_run_at` and the `last_found_at` of
    /// every record in the result. Persisting the same result again later
    /// advances both.
    async fn persist_at(&self, result: &RunResult, written_at: DateTime<Utc>) -> Result<()>;

    /// All persisted job rows, ordered by name.
    async fn job_infos(&self) -> Result<Vec<JobInfo>>;

    /// The persisted row for a single getter.
    async fn job_info(&self, name: &str) -> Result<Option<JobInfo>> {
        Ok(self
            .job_infos()
            .await?
            .into_iter()
            .find(|info| info.name == name))
    }

    /// All persisted records with their owning getter's name, ordered by key.
    async fn records(&self) -> Result<Vec<RecordInfo>>;

    /// Delete jobs whose name is not in `known`, together with their records.
    ///
    /// Returns the removed job names.
    async fn remove_orphaned_jobs(&self, known: &[&str]) -> Result<Vec<String>>;

    /// Delete records that were not reconfirmed by their getter's latest run.
    ///
    /// Returns the number of records removed.
    async fn remove_stale_records(&self) -> Result<u64>;

    /// Delete everything.
    async fn clear_all(&self) -> Result<()>;
}
