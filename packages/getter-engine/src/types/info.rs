//! Persisted views of jobs and records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::meta::Meta;

/// Latest run of a getter, one per name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub name: String,
    pub last_run_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub success: bool,
    pub records_found: Option<i64>,
    pub error: Option<String>,
}

impl JobInfo {
    /// Human readable one-liner: record count or error text.
    pub fn description(&self) -> String {
        if self.success {
            format!("Found {} domains", self.records_found.unwrap_or(0))
        } else {
            self.error.clone().unwrap_or_default()
        }
    }
}

/// A persisted record together with the name of the getter that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub key: String,
    pub country: String,
    pub category: String,
    pub subcategory: String,
    pub meta: Meta,
    pub first_found_at: DateTime<Utc>,
    pub last_found_at: DateTime<Utc>,
    /// Name of the owning getter
    pub found_by: String,
}
