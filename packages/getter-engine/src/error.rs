//! Typed errors for the getter engine.
//!
//! Uses `thiserror` for library errors. Failures raised by a getter's own
//! work are not errors of the engine: they are captured into a
//! [`RunResult`](crate::types::run::RunResult) and persisted.

use thiserror::Error;

/// Errors that can occur in registry, orchestration and storage operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A requested getter name is not registered
    #[error("no getter named {name}")]
    JobNotFound { name: String },

    /// Two getters were registered under the same name
    #[error("a getter named {name} is already registered")]
    DuplicateJob { name: String },

    /// Storage backend failed (unavailable, constraint violation, bad row)
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Meta column could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Wrap any backend error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

/// Errors raised while constructing a [`Record`](crate::types::record::Record).
#[derive(Debug, Error)]
pub enum RecordError {
    /// Key was empty or whitespace only
    #[error("record key is empty")]
    Empty,

    /// Key could not be parsed as a URL even after adding a scheme
    #[error("invalid url {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// Key parsed but carries no hostname
    #[error("url does not contain a hostname: {input:?}")]
    MissingHost { input: String },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type alias for record construction.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
