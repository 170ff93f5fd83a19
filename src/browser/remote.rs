//! Remote-control trait for abstracting the browser transport
//!
//! Anything that can open a page, probe elements, act on them and take a
//! screenshot can drive a run.

use async_trait::async_trait;
use std::path::Path;

use crate::browser::state::ElementState;
use crate::core::Result;

/// One live page session
#[async_trait]
pub trait RemoteControl: Send + Sync {
    /// Load a URL and wait for the transport to acknowledge it
    async fn navigate(&self, url: &str) -> Result<()>;

    /// State of the first element matching `selector`; `None` if nothing matches
    async fn query(&self, selector: &str) -> Result<Option<ElementState>>;

    /// Option values of a select element; `None` if nothing matches
    async fn option_values(&self, selector: &str) -> Result<Option<Vec<String>>>;

    /// Click the first element matching `selector`
    async fn click(&self, selector: &str) -> Result<()>;

    /// Choose an option by value
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    /// Text content of the first element matching `selector`
    async fn text_content(&self, selector: &str) -> Result<String>;

    /// Current value of a form control
    async fn input_value(&self, selector: &str) -> Result<String>;

    /// Write a screenshot of the viewport to `path`
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Close the session
    async fn close(&self) -> Result<()>;

    /// Get the transport name
    fn name(&self) -> &str;
}
