//! Periodic Data-Collection Engine
//!
//! A registry of named getters, each fetching one external source and
//! returning records, plus the machinery to run them, decide when they are
//! due again, and persist what they found.
//!
//! # Design Philosophy
//!
//! - One getter failing never stops the others
//! - Every result is persisted before the next getter starts
//! - The latest run of a getter owns every record it reconfirmed
//! - Slow sources run rarely, cheap ones often
//!
//! # Usage
//!
//! ```rust,ignore
//! use getter_engine::{GetterRegistry, Runner, SqliteStore};
//!
//! let mut registry = GetterRegistry::new();
//! registry.register(ZorgkaartGetter::new(client))?;
//!
//! let store = SqliteStore::connect("sqlite://results.db", 5).await?;
//! let runner = Runner::new(registry, store);
//! runner.create_schema().await?;
//!
//! // Everything that never ran, failed, or whose interval elapsed
//! let results = runner.run_due().await?;
//!
//! // Drop getters that no longer exist and records nobody reconfirmed
//! runner.clean().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Getter, ResultStore)
//! - [`types`] - Records, run results and persisted views
//! - [`registry`] - Name to getter lookup
//! - [`executor`] - Runs one getter, capturing errors and panics
//! - [`due`] - Re-run interval policy
//! - [`runner`] - Sequential run-then-persist orchestration and cleanup
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore)
//! - [`testing`] - Mock getters and record fixtures

pub mod due;
pub mod error;
pub mod executor;
pub mod registry;
pub mod runner;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{EngineError, RecordError, RecordResult, Result};
pub use traits::{
    getter::{FnGetter, Getter},
    store::ResultStore,
};
pub use types::{
    info::{JobInfo, RecordInfo},
    meta::{Meta, MetaValue},
    record::{keep_valid, normalize_key, Record},
    run::{RunOutcome, RunResult},
};

pub use due::{due_jobs, interval_days, is_due, MAX_INTERVAL_DAYS};
pub use executor::execute;
pub use registry::GetterRegistry;
pub use runner::{CleanReport, Runner};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;
