//! uiproof - scripted acceptance runs for hosted front-ends
//!
//! Drives a front-end, loaded from a local file or an HTTP origin, through an
//! ordered list of interactions. After each interaction it waits for the
//! expected UI state, captures screenshots, and stops on the first fatal
//! failure with the failing step and the last good screenshot.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Browser**: Remote-control trait, agent-browser transport, test page
//! - **Flow**: Conditions, waiter, actuator, capture, assertions, step runner
//! - **CLI**: Run summaries and `report.json`
//!
//! # Usage
//!
//! ```rust,no_run
//! use uiproof::browser::AgentBrowser;
//! use uiproof::core::{Config, Origin};
//! use uiproof::flow::{Scenario, StepRunner};
//!
//! #[tokio::main]
//! async fn main() -> uiproof::Result<()> {
//!     let config = Config::load();
//!     let origin = Origin::parse("http://localhost:8000")?;
//!     let runner = StepRunner::from_config(origin, &config.run);
//!     let report = runner
//!         .run(AgentBrowser::from_config(&config.browser), Scenario::preset_history().steps())
//!         .await;
//!     println!("{}", uiproof::cli::render("preset-history", &report));
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod cli;
pub mod core;
pub mod flow;

// Re-export commonly used items
pub use core::{Config, ErrorKind, Result, UiProofError};
pub use flow::{RunReport, RunStatus, Scenario, Step, StepRunner};
