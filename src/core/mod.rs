//! Core module - shared infrastructure for uiproof
//!
//! Foundational types, configuration, and error handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{ErrorKind, Result, UiProofError};
pub use types::*;
