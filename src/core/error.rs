//! Custom error types for uiproof
//!
//! One taxonomy for actuator, waiter, capture and assertion failures, plus the
//! infrastructure errors underneath them.

use serde::Serialize;
use thiserror::Error;

/// Main error type for uiproof operations
#[derive(Error, Debug)]
pub enum UiProofError {
    /// Selector matched zero elements when an action ran
    #[error("No element matches selector '{selector}'")]
    TargetNotFound { selector: String },

    /// The select element exists but has no option with this value
    #[error("Select '{selector}' has no option with value '{value}'")]
    OptionNotFound { selector: String, value: String },

    /// A waited-for state never appeared within its bound
    #[error("Timed out after {timeout_ms}ms waiting for '{target}' to be {condition}")]
    ConditionTimedOut {
        target: String,
        condition: String,
        timeout_ms: u64,
    },

    /// The remote session could not load a location
    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    /// A snapshot could not be taken or written
    #[error("Capture '{name}' failed: {reason}")]
    CaptureFailed { name: String, reason: String },

    /// A comparison configured as fatal did not hold
    #[error("Assertion failed: {message} (expected {expected}, got '{actual}')")]
    AssertionFailed {
        message: String,
        expected: String,
        actual: String,
    },

    /// The run was interrupted before its steps finished
    #[error("Run cancelled")]
    Cancelled,

    /// Browser transport errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for uiproof operations
pub type Result<T> = std::result::Result<T, UiProofError>;

/// Coarse classification of an error, stable across messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TargetNotFound,
    OptionNotFound,
    ConditionTimedOut,
    NavigationFailed,
    CaptureFailed,
    AssertionFailed,
    Cancelled,
    Browser,
    Config,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::TargetNotFound => "TargetNotFound",
            ErrorKind::OptionNotFound => "OptionNotFound",
            ErrorKind::ConditionTimedOut => "ConditionTimedOut",
            ErrorKind::NavigationFailed => "NavigationFailed",
            ErrorKind::CaptureFailed => "CaptureFailed",
            ErrorKind::AssertionFailed => "AssertionFailed",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Browser => "Browser",
            ErrorKind::Config => "Config",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

impl UiProofError {
    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a target-not-found error
    pub fn target_not_found(selector: impl Into<String>) -> Self {
        Self::TargetNotFound {
            selector: selector.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TargetNotFound { .. } => ErrorKind::TargetNotFound,
            Self::OptionNotFound { .. } => ErrorKind::OptionNotFound,
            Self::ConditionTimedOut { .. } => ErrorKind::ConditionTimedOut,
            Self::NavigationFailed { .. } => ErrorKind::NavigationFailed,
            Self::CaptureFailed { .. } => ErrorKind::CaptureFailed,
            Self::AssertionFailed { .. } => ErrorKind::AssertionFailed,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Browser(_) | Self::AgentBrowserNotFound => ErrorKind::Browser,
            Self::Config(_) => ErrorKind::Config,
            Self::Json(_) | Self::Io(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }
}
