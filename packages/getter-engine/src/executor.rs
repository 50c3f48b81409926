//! Runs one getter and captures its outcome.
//!
//! The executor never fails: errors and panics raised by the getter are
//! captured into a failed [`RunResult`].

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{info, warn};

use crate::traits::getter::Getter;
use crate::types::run::RunResult;

/// Execute a getter, timing it and capturing success or failure.
pub async fn execute(getter: &dyn Getter) -> RunResult {
    let name = getter.name();
    info!(getter = name, "starting getter");

    let started_at = chrono::Utc::now();
    let clock = Instant::now();

    let outcome = AssertUnwindSafe(getter.fetch()).catch_unwind().await;
    let elapsed = clock.elapsed();

    let result = match outcome {
        Ok(Ok(records)) => {
            info!(
                getter = name,
                records = records.len(),
                seconds = elapsed.as_secs(),
                "getter finished successfully"
            );
            RunResult::succeeded(name, records)
        }
        Ok(Err(e)) => {
            warn!(getter = name, error = %format!("{:#}", e), "getter finished with error");
            RunResult::failed(name, format!("{:#}", e))
        }
        Err(panic_info) => {
            let message = format!("getter panicked: {}", panic_message(&panic_info));
            warn!(getter = name, error = %message, "getter panicked");
            RunResult::failed(name, message)
        }
    };

    result.timed(started_at, elapsed)
}

fn panic_message(panic_info: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
