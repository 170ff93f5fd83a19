//! Browser executor - wraps agent-browser CLI
//!
//! Every invocation is bounded by the configured command timeout and the
//! child is killed if the bound expires.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::browser::remote::RemoteControl;
use crate::browser::state::{self, ElementState};
use crate::core::config::BrowserConfig;
use crate::core::{Result, UiProofError};

/// Remote control backed by the agent-browser CLI
pub struct AgentBrowser {
    /// Executable name or path
    binary: String,
    /// Session name for isolation
    session_name: String,
    /// Whether to run in headed mode
    headed: bool,
    /// Bound for one CLI invocation
    command_timeout: Duration,
    /// Used for the HTTP origin preflight
    http: reqwest::Client,
}

impl AgentBrowser {
    /// Create a new browser session wrapper
    pub fn new(session_name: impl Into<String>) -> Self {
        Self::from_config(&BrowserConfig {
            session_name: session_name.into(),
            ..BrowserConfig::default()
        })
    }

    /// Create from browser configuration
    pub fn from_config(config: &BrowserConfig) -> Self {
        let command_timeout = Duration::from_millis(config.command_timeout_ms);
        Self {
            binary: config.binary.clone(),
            session_name: config.session_name.clone(),
            headed: config.headed,
            command_timeout,
            http: reqwest::Client::builder()
                .timeout(command_timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Check if the agent-browser executable can be launched
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run an agent-browser command
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--session", &self.session_name]);

        if self.headed {
            cmd.arg("--headed");
        }

        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::trace!(session = %self.session_name, ?args, "agent-browser");

        let output = tokio::time::timeout(self.command_timeout, cmd.output())
            .await
            .map_err(|_| {
                UiProofError::browser(format!(
                    "agent-browser {} did not finish within {}ms",
                    args.first().copied().unwrap_or_default(),
                    self.command_timeout.as_millis()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    UiProofError::AgentBrowserNotFound
                } else {
                    UiProofError::browser(format!("Failed to run agent-browser: {}", e))
                }
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(UiProofError::browser(format!(
                "agent-browser command failed: {}",
                stderr.trim()
            )))
        }
    }

    /// Run a command and return JSON output
    async fn run_json_command(&self, args: &[&str]) -> Result<String> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");
        self.run_command(&full_args).await
    }

    /// Fail fast on a served origin that is not answering
    async fn preflight(&self, url: &str) -> Result<()> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UiProofError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if response.status().is_server_error() || response.status().is_client_error() {
            return Err(UiProofError::NavigationFailed {
                url: url.to_string(),
                reason: format!("origin answered {}", response.status()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteControl for AgentBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.preflight(url).await?;
        }
        self.run_command(&["open", url]).await?;
        // Best effort: static pages may never report network idle.
        if let Err(e) = self.run_command(&["wait", "--load", "networkidle"]).await {
            tracing::debug!(error = %e, "load wait skipped");
        }
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementState>> {
        let output = self
            .run_json_command(&["eval", &state::probe_script(selector)])
            .await?;
        state::parse_probe(&output)
    }

    async fn option_values(&self, selector: &str) -> Result<Option<Vec<String>>> {
        let output = self
            .run_json_command(&["eval", &state::options_script(selector)])
            .await?;
        state::parse_options(&output)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.run_command(&["click", &first_match(selector)])
            .await
            .map(|_| ())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        self.run_command(&["select", &first_match(selector), value])
            .await
            .map(|_| ())
    }

    async fn text_content(&self, selector: &str) -> Result<String> {
        let output = self
            .run_json_command(&["eval", &state::text_script(selector)])
            .await?;
        state::parse_read(&output)?.ok_or_else(|| UiProofError::target_not_found(selector))
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        let output = self
            .run_json_command(&["eval", &state::value_script(selector)])
            .await?;
        state::parse_read(&output)?.ok_or_else(|| UiProofError::target_not_found(selector))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.run_command(&["screenshot", path.as_ref()]).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.run_command(&["close"]).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "agent-browser"
    }
}

/// Locator for the first element matching `selector`, the same element the
/// probe scripts inspect. Plain selectors are strict and reject multiple matches.
fn first_match(selector: &str) -> String {
    format!("{} >> nth=0", selector)
}

impl Default for AgentBrowser {
    fn default() -> Self {
        Self::new("uiproof")
    }
}
