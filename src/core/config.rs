//! Configuration management for uiproof
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/uiproof/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, UiProofError};

/// Default bound for a condition wait when a step gives none
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 3_000;

/// Default interval between condition polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default settle delay for CSS transitions with no DOM signal
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// Main configuration for uiproof
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Browser configuration
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Run configuration
    #[serde(default)]
    pub run: RunConfig,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Session name for agent-browser
    pub session_name: String,
    /// Whether to run in headed mode (visible browser)
    pub headed: bool,
    /// Upper bound for a single agent-browser invocation in ms
    pub command_timeout_ms: u64,
    /// agent-browser executable
    pub binary: String,
}

/// Step run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// File path or http(s) URL of the front-end under test
    pub origin: String,
    /// Directory screenshots and the report are written to
    pub output_dir: PathBuf,
    /// Wait bound used when a step does not set one
    pub wait_timeout_ms: u64,
    /// Interval between condition polls
    pub poll_interval_ms: u64,
    /// Settle delay for purely visual transitions
    pub settle_ms: u64,
    /// Class the front-end toggles to hide an element
    pub marker_class: String,
    /// Verbose logging
    pub debug: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            session_name: env::var("UIPROOF_BROWSER_SESSION")
                .unwrap_or_else(|_| "uiproof".to_string()),
            headed: env::var("UIPROOF_BROWSER_HEADED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            command_timeout_ms: 30_000,
            binary: "agent-browser".to_string(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            origin: env::var("UIPROOF_ORIGIN")
                .unwrap_or_else(|_| "app/src/main/assets/index.html".to_string()),
            output_dir: env::var("UIPROOF_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("verification")),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            marker_class: "hidden".to_string(),
            debug: env::var("UIPROOF_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("uiproof")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_path(&Self::config_file()) {
            return config;
        }

        Self::default()
    }

    /// Load configuration from an explicit file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();

        if !path.exists() {
            return Err(UiProofError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| UiProofError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| UiProofError::config(format!("Failed to parse config: {}", e)))
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.run.wait_timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
        assert_eq!(config.run.marker_class, "hidden");
        assert_eq!(config.browser.binary, "agent-browser");
        assert_eq!(config.browser.command_timeout_ms, 30_000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [run]
            origin = "http://localhost:8000"
            poll_interval_ms = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.run.origin, "http://localhost:8000");
        assert_eq!(config.run.poll_interval_ms, 20);
        assert_eq!(config.run.settle_ms, DEFAULT_SETTLE_MS);
        assert_eq!(config.browser.binary, "agent-browser");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load_from_path(Path::new("/nonexistent/uiproof.toml")).unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Config);
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("marker_class"));
        assert!(toml_str.contains("session_name"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("uiproof"));
    }
}
