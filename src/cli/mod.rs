//! CLI module - run summaries and persisted reports

pub mod report;

pub use report::{render, write_json};
