//! Decides which getters must run again.
//!
//! A getter is due when:
//! - it has never been persisted,
//! - its last run failed, or
//! - more days passed since its last run than `min(90, seconds / 20)`,
//!   where `seconds` is how long that run took.
//!
//! The ratio makes the re-run interval scale with cost: a 140 second run is
//! repeated weekly, anything above half an hour every three months.
//!
//! This mixes a ratio with a cap, so it is evaluated in memory over all
//! persisted rows rather than as a storage query.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::types::info::JobInfo;

/// Upper bound on the re-run interval, in days.
pub const MAX_INTERVAL_DAYS: f64 = 90.0;

/// Seconds of run time per day of re-run interval.
pub const RUN_SECONDS_PER_INTERVAL_DAY: f64 = 20.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Re-run interval in days for a run that took `duration_seconds`.
pub fn interval_days(duration_seconds: f64) -> f64 {
    (duration_seconds / RUN_SECONDS_PER_INTERVAL_DAY).min(MAX_INTERVAL_DAYS)
}

/// Whether a persisted getter must run again at `now`.
pub fn is_due(info: &JobInfo, now: DateTime<Utc>) -> bool {
    if !info.success {
        return true;
    }

    let elapsed_days = (now - info.last_run_at).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
    elapsed_days > interval_days(info.duration_seconds)
}

/// Names from `registered` that are due, in the order given, without duplicates.
///
/// Names with no persisted row are always due. Persisted rows for names that
/// are not registered are ignored.
pub fn due_jobs<'a, I>(registered: I, infos: &[JobInfo], now: DateTime<Utc>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let by_name: HashMap<&str, &JobInfo> =
        infos.iter().map(|info| (info.name.as_str(), info)).collect();
    let mut seen = HashSet::new();

    registered
        .into_iter()
        .filter(|name| seen.insert(*name))
        .filter(|name| match by_name.get(name) {
            Some(info) => is_due(info, now),
            None => true,
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn info(name: &str, ago: Duration, success: bool, duration_seconds: f64) -> JobInfo {
        JobInfo {
            name: name.to_string(),
            last_run_at: Utc::now() - ago,
            duration_seconds,
            success,
            records_found: if success { Some(1) } else { None },
            error: if success { None } else { Some("boom".into()) },
        }
    }

    #[test]
    fn cap_exceeded_is_due() {
        let job = info("nl_a", Duration::days(91), true, 10.0);
        assert!(is_due(&job, Utc::now()));
    }

    #[test]
    fn long_run_recent_is_not_due() {
        // 2000 / 20 = 100 days, capped at 90
        let job = info("nl_a", Duration::days(1), true, 2000.0);
        assert!(!is_due(&job, Utc::now()));
        assert_eq!(interval_days(2000.0), 90.0);
    }

    #[test]
    fn slow_job_reaches_the_cap() {
        let job = info("nl_a", Duration::days(89), true, 2000.0);
        assert!(!is_due(&job, Utc::now()));

        let job = info("nl_a", Duration::days(90) + Duration::hours(1), true, 2000.0);
        assert!(is_due(&job, Utc::now()));
    }

    #[test]
    fn weekly_for_140_seconds() {
        assert_eq!(interval_days(140.0), 7.0);
        assert!(!is_due(&info("x", Duration::days(6), true, 140.0), Utc::now()));
        assert!(is_due(&info("x", Duration::days(8), true, 140.0), Utc::now()));
    }

    #[test]
    fn failed_is_always_due() {
        let job = info("nl_a", Duration::seconds(1), false, 2000.0);
        assert!(is_due(&job, Utc::now()));
    }

    #[test]
    fn unknown_names_are_due_and_orphans_ignored() {
        let infos = vec![
            info("nl_fresh", Duration::hours(1), true, 2000.0),
            info("nl_failed", Duration::hours(1), false, 5.0),
            info("nl_removed", Duration::days(400), true, 1.0),
        ];

        let due = due_jobs(["nl_fresh", "nl_new", "nl_failed"], &infos, Utc::now());

        assert_eq!(due, vec!["nl_new".to_string(), "nl_failed".to_string()]);
    }

    #[test]
    fn no_duplicates() {
        let due = due_jobs(["nl_new", "nl_new"], &[], Utc::now());
        assert_eq!(due, vec!["nl_new".to_string()]);
    }
}
