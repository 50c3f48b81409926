//! Public sector domain scraper.
//!
//! Getters for published registers and directories, plus the reporting and
//! export around them. Scheduling and persistence live in `getter_engine`.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`http`] - HTTP client and bounded fan-out
//! - [`getters`] - Every getter the application ships
//! - [`sheet`] - Spreadsheet rows to records
//! - [`taxonomy`] - Country and category labels
//! - [`report`] - Result tables
//! - [`export`] - CSV, JSON and README export

pub mod config;
pub mod export;
pub mod getters;
pub mod http;
pub mod report;
pub mod sheet;
pub mod taxonomy;

pub use config::Config;
pub use getters::build_registry;
