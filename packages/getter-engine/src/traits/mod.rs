pub mod getter;
pub mod store;
