//! Data types shared by the registry, executor and stores.

pub mod info;
pub mod meta;
pub mod record;
pub mod run;

pub use info::{JobInfo, RecordInfo};
pub use meta::{Meta, MetaValue};
pub use record::{keep_valid, normalize_key, Record};
pub use run::{RunOutcome, RunResult};
