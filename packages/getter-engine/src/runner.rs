//! Runs getters and persists every result as it is produced.
//!
//! # Architecture
//!
//! ```text
//! Runner
//!     │
//!     ├─► GetterRegistry (all / by name / due via due_jobs + store rows)
//!     ├─► execute() each getter, one at a time
//!     └─► ResultStore.persist() before the next getter starts
//! ```
//!
//! Getters run sequentially. A crash mid-batch loses only the getter that
//! was in flight; everything before it is already committed.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::due::due_jobs;
use crate::error::Result;
use crate::executor::execute;
use crate::registry::GetterRegistry;
use crate::traits::getter::Getter;
use crate::traits::store::ResultStore;
use crate::types::run::RunResult;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Getters no longer registered, removed with their records
    pub removed_jobs: Vec<String>,
    /// Records not reconfirmed by their getter's latest run
    pub removed_records: u64,
}

/// Orchestrates getter runs against a registry and a store.
pub struct Runner<S: ResultStore> {
    registry: GetterRegistry,
    store: S,
}

impl<S: ResultStore> Runner<S> {
    pub fn new(registry: GetterRegistry, store: S) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &GetterRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registered getter names in registration order.
    pub fn list_jobs(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    /// Run every registered getter.
    pub async fn run_all(&self) -> Result<Vec<RunResult>> {
        let getters = self.registry.list().to_vec();
        self.run_getters(getters).await
    }

    /// Run the named getters in the order given.
    ///
    /// Every name is resolved before anything runs: one unknown name fails
    /// the request with `JobNotFound` and nothing is executed or persisted.
    pub async fn run_named<N: AsRef<str>>(&self, names: &[N]) -> Result<Vec<RunResult>> {
        let getters = names
            .iter()
            .map(|name| self.registry.find(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.run_getters(getters).await
    }

    /// Run every getter that is due.
    pub async fn run_due(&self) -> Result<Vec<RunResult>> {
        let names = self.due().await?;
        info!(count = names.len(), "getters due");
        self.run_named(&names).await
    }

    /// Names of the getters that are due now.
    pub async fn due(&self) -> Result<Vec<String>> {
        let infos = self.store.job_infos().await?;
        Ok(due_jobs(self.registry.names(), &infos, Utc::now()))
    }

    async fn run_getters(&self, getters: Vec<Arc<dyn Getter>>) -> Result<Vec<RunResult>> {
        let mut results = Vec::with_capacity(getters.len());

        for getter in getters {
            let result = execute(getter.as_ref()).await;
            self.store.persist(&result).await?;
            debug!(getter = %result.job_name, success = result.success(), "result persisted");
            results.push(result);
        }

        Ok(results)
    }

    /// Create the storage schema.
    pub async fn create_schema(&self) -> Result<()> {
        self.store.create_schema().await
    }

    /// Remove orphaned getters, then records that went stale.
    pub async fn clean(&self) -> Result<CleanReport> {
        let known = self.registry.names();
        let removed_jobs = self.store.remove_orphaned_jobs(&known).await?;
        let removed_records = self.store.remove_stale_records().await?;

        info!(
            removed_jobs = removed_jobs.len(),
            removed_records, "storage cleaned"
        );

        Ok(CleanReport {
            removed_jobs,
            removed_records,
        })
    }

    /// Remove all persisted data.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear_all().await?;
        info!("storage cleared");
        Ok(())
    }
}
