//! Single interactions against the remote page
//!
//! No implicit waiting: a target must exist at call time. Steps that need an
//! element to appear first put a wait before the action.

use tracing::debug;

use crate::browser::RemoteControl;
use crate::core::{Result, UiProofError};

/// Performs one interaction per call on a borrowed session
pub struct Actuator<'a> {
    remote: &'a dyn RemoteControl,
}

impl<'a> Actuator<'a> {
    pub fn new(remote: &'a dyn RemoteControl) -> Self {
        Self { remote }
    }

    /// Load a resolved URL
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "navigate");
        self.remote.navigate(url).await.map_err(|e| match e {
            UiProofError::NavigationFailed { .. } => e,
            other => UiProofError::NavigationFailed {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        self.require(selector).await?;
        debug!(selector, "click");
        self.remote.click(selector).await
    }

    pub async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let options = self
            .remote
            .option_values(selector)
            .await?
            .ok_or_else(|| UiProofError::target_not_found(selector))?;

        if !options.iter().any(|o| o == value) {
            return Err(UiProofError::OptionNotFound {
                selector: selector.to_string(),
                value: value.to_string(),
            });
        }

        debug!(selector, value, "select option");
        self.remote.select_option(selector, value).await
    }

    /// Live text content; empty text is a valid result
    pub async fn read_text(&self, selector: &str) -> Result<String> {
        self.require(selector).await?;
        self.remote.text_content(selector).await
    }

    /// Live form value; an empty value is a valid result
    pub async fn read_value(&self, selector: &str) -> Result<String> {
        self.require(selector).await?;
        self.remote.input_value(selector).await
    }

    async fn require(&self, selector: &str) -> Result<()> {
        match self.remote.query(selector).await? {
            Some(_) => Ok(()),
            None => Err(UiProofError::target_not_found(selector)),
        }
    }
}
