//! The outcome of one getter execution.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::record::Record;

/// What a getter run produced.
///
/// Exactly one of records or error exists, so the success flag can never
/// disagree with the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Succeeded { records: Vec<Record> },
    Failed { error: String },
}

/// Result of a single getter run.
///
/// Built once by the executor, handed to the store exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: RunOutcome,
}

impl RunResult {
    /// A successful run that finished now.
    pub fn succeeded(job_name: impl Into<String>, records: Vec<Record>) -> Self {
        Self::new(job_name, RunOutcome::Succeeded { records })
    }

    /// A failed run that finished now.
    pub fn failed(job_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            job_name,
            RunOutcome::Failed {
                error: error.into(),
            },
        )
    }

    fn new(job_name: impl Into<String>, outcome: RunOutcome) -> Self {
        let now = Utc::now();
        Self {
            job_name: job_name.into(),
            started_at: now,
            finished_at: now,
            duration: Duration::ZERO,
            outcome,
        }
    }

    /// Set start, end and duration from a measured run.
    pub fn timed(mut self, started_at: DateTime<Utc>, duration: Duration) -> Self {
        self.started_at = started_at;
        self.duration = duration;
        self.finished_at = started_at
            + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        self
    }

    /// Set the measured duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded { .. })
    }

    /// Records produced, only present on success.
    pub fn records(&self) -> Option<&[Record]> {
        match &self.outcome {
            RunOutcome::Succeeded { records } => Some(records),
            RunOutcome::Failed { .. } => None,
        }
    }

    /// Failure description, only present on failure.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Succeeded { .. } => None,
            RunOutcome::Failed { error } => Some(error),
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    pub fn records_found(&self) -> Option<i64> {
        self.records().map(|r| r.len() as i64)
    }

    /// Human readable one-liner: record count or error text.
    pub fn description(&self) -> String {
        match &self.outcome {
            RunOutcome::Succeeded { records } => format!("Found {} domains", records.len()),
            RunOutcome::Failed { error } => error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_records_only() {
        let record = Record::new("a.nl", "NL", "Healthcare", "pharmacy").unwrap();
        let result = RunResult::succeeded("nl_a", vec![record]);

        assert!(result.success());
        assert_eq!(result.records().map(|r| r.len()), Some(1));
        assert_eq!(result.error(), None);
        assert_eq!(result.records_found(), Some(1));
        assert_eq!(result.description(), "Found 1 domains");
    }

    #[test]
    fn failure_carries_error_only() {
        let result = RunResult::failed("nl_b", "timeout");

        assert!(!result.success());
        assert!(result.records().is_none());
        assert_eq!(result.error(), Some("timeout"));
        assert_eq!(result.records_found(), None);
        assert_eq!(result.description(), "timeout");
    }

    #[test]
    fn timed_derives_finish() {
        let start = Utc::now();
        let result = RunResult::failed("x", "e").timed(start, Duration::from_millis(1500));

        assert_eq!(result.finished_at - start, chrono::Duration::milliseconds(1500));
        assert!((result.duration_seconds() - 1.5).abs() < f64::EPSILON);
    }
}
