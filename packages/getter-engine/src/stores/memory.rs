//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::traits::store::ResultStore;
use crate::types::{
    info::{JobInfo, RecordInfo},
    meta::Meta,
    run::RunResult,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    country: String,
    category: String,
    subcategory: String,
    meta: Meta,
    first_found_at: DateTime<Utc>,
    last_found_at: DateTime<Utc>,
    found_by: String,
}

#[derive(Default)]
struct State {
    jobs: BTreeMap<String, JobInfo>,
    records: BTreeMap<String, StoredRecord>,
}

/// In-memory result store with the same semantics as the SQL store.
///
/// Useful for testing the runner without a database. Data is lost when the
/// store is dropped.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the number of stored jobs.
    pub fn job_count(&self) -> usize {
        self.state().jobs.len()
    }

    /// Get the number of stored records.
    pub fn record_count(&self) -> usize {
        self.state().records.len()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn create_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn persist_at(&self, result: &RunResult, written_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state();

        state.jobs.insert(
            result.job_name.clone(),
            JobInfo {
                name: result.job_name.clone(),
                last_run_at: written_at,
                duration_seconds: result.duration_seconds(),
                success: result.success(),
                records_found: result.records_found(),
                error: result.error().map(str::to_string),
            },
        );

        let Some(records) = result.records() else {
            return Ok(());
        };

        for record in records {
            let first_found_at = state
                .records
                .get(&record.key)
                .map(|existing| existing.first_found_at)
                .unwrap_or(record.discovered_at);

            state.records.insert(
                record.key.clone(),
                StoredRecord {
                    country: record.country.clone(),
                    category: record.category.clone(),
                    subcategory: record.subcategory.clone(),
                    meta: record.meta.clone(),
                    first_found_at,
                    last_found_at: written_at,
                    found_by: result.job_name.clone(),
                },
            );
        }

        Ok(())
    }

    async fn job_infos(&self) -> Result<Vec<JobInfo>> {
        Ok(self.state().jobs.values().cloned().collect())
    }

    async fn records(&self) -> Result<Vec<RecordInfo>> {
        Ok(self
            .state()
            .records
            .iter()
            .map(|(key, r)| RecordInfo {
                key: key.clone(),
                country: r.country.clone(),
                category: r.category.clone(),
                subcategory: r.subcategory.clone(),
                meta: r.meta.clone(),
                first_found_at: r.first_found_at,
                last_found_at: r.last_found_at,
                found_by: r.found_by.clone(),
            })
            .collect())
    }

    async fn remove_orphaned_jobs(&self, known: &[&str]) -> Result<Vec<String>> {
        let mut state = self.state();

        let orphans: Vec<String> = state
            .jobs
            .keys()
            .filter(|name| !known.contains(&name.as_str()))
            .cloned()
            .collect();

        for name in &orphans {
            state.jobs.remove(name);
            state.records.retain(|_, r| &r.found_by != name);
        }

        Ok(orphans)
    }

    async fn remove_stale_records(&self) -> Result<u64> {
        let mut state = self.state();
        let State { jobs, records } = &mut *state;

        let before = records.len();
        records.retain(|_, r| {
            jobs.get(&r.found_by)
                .map(|job| job.last_run_at == r.last_found_at)
                .unwrap_or(false)
        });

        Ok((before - records.len()) as u64)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.state();
        state.records.clear();
        state.jobs.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use chrono::TimeZone;

    #[tokio::test]
    async fn repersisting_advances_last_found_at_only() {
        let store = MemoryStore::new();
        let found_at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let result = RunResult::succeeded("nl_a", vec![record("a.nl").with_discovered_at(found_at)]);

        store.persist_at(&result, found_at).await.unwrap();
        store
            .persist_at(&result, found_at + chrono::Duration::days(1))
            .await
            .unwrap();

        let stored = store.records().await.unwrap();
        assert_eq!(stored[0].first_found_at, found_at);
        assert_eq!(stored[0].last_found_at, found_at + chrono::Duration::days(1));
        assert_eq!(store.remove_stale_records().await.unwrap(), 0);
    }
}
