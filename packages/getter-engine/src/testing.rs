//! Testing utilities including mock getters and record fixtures.
//!
//! These are useful for testing applications that use the engine without
//! making real network calls.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::traits::getter::Getter;
use crate::types::{meta::Meta, record::Record};

/// A getter that returns a fixed list of records.
///
/// Counts how often it was fetched, for asserting what a runner executed.
pub struct StaticGetter {
    name: &'static str,
    description: &'static str,
    records: Vec<Record>,
    calls: Arc<AtomicUsize>,
}

impl StaticGetter {
    pub fn new(name: &'static str, records: Vec<Record>) -> Self {
        Self {
            name,
            description: "",
            records,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Shared fetch counter, still readable after the getter moved into a registry.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Getter for StaticGetter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// A getter whose fetch always fails with the given message.
pub struct FailingGetter {
    name: &'static str,
    message: String,
}

impl FailingGetter {
    pub fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Getter for FailingGetter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
        Err(anyhow::anyhow!("{}", self.message))
    }
}

/// A getter whose fetch panics with the given message.
pub struct PanickingGetter {
    name: &'static str,
    message: &'static str,
}

impl PanickingGetter {
    pub fn new(name: &'static str, message: &'static str) -> Self {
        Self { name, message }
    }
}

#[async_trait]
impl Getter for PanickingGetter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
        panic!("{}", self.message)
    }
}

/// A Dutch healthcare record with `key` used as given.
pub fn record(key: &str) -> Record {
    Record {
        key: key.to_string(),
        country: "NL".to_string(),
        category: "Healthcare".to_string(),
        subcategory: "test".to_string(),
        meta: Meta::new(),
        discovered_at: Utc::now(),
    }
}

/// `count` distinct records named `{prefix}-{i}.nl`.
pub fn records(prefix: &str, count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| record(&format!("{prefix}-{i}.nl")))
        .collect()
}
