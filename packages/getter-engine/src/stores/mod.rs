//! Storage implementations.

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteStore, RECORD_BATCH_SIZE};
