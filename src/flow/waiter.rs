//! Bounded polling until a condition holds
//!
//! State is probed fresh on every poll; nothing is cached between polls or
//! between waits.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::browser::RemoteControl;
use crate::core::config::RunConfig;
use crate::core::{Result, UiProofError};
use crate::flow::condition::Condition;

/// Polls remote element state until a condition holds or a bound elapses
#[derive(Debug, Clone)]
pub struct ConditionWaiter {
    poll_interval: Duration,
    default_timeout: Duration,
    marker_class: String,
}

impl ConditionWaiter {
    pub fn new(poll_interval: Duration, default_timeout: Duration, marker_class: impl Into<String>) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            default_timeout,
            marker_class: marker_class.into(),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_millis(config.wait_timeout_ms),
            config.marker_class.clone(),
        )
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Wait until `condition` holds for `selector`.
    ///
    /// The condition is always checked at least once, so an already
    /// satisfied condition returns immediately even with a zero bound.
    /// Returns the time spent waiting.
    pub async fn wait(
        &self,
        remote: &dyn RemoteControl,
        selector: &str,
        condition: &Condition,
        timeout: Option<Duration>,
    ) -> Result<Duration> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();
        let deadline = started + timeout;
        let mut polls = 0usize;

        loop {
            let state = remote.query(selector).await?;
            polls += 1;

            if condition.evaluate(state.as_ref(), &self.marker_class) {
                let elapsed = started.elapsed();
                debug!(selector, %condition, polls, ?elapsed, "condition met");
                return Ok(elapsed);
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(selector, %condition, polls, ?state, "condition not met before deadline");
                return Err(UiProofError::ConditionTimedOut {
                    target: selector.to_string(),
                    condition: condition.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Fixed pause for a CSS transition that leaves no DOM signal.
    ///
    /// This approximates "the animation has finished"; it is not a
    /// synchronisation point.
    pub async fn settle(&self, duration: Duration) {
        debug!(?duration, "settling for visual transition");
        tokio::time::sleep(duration).await;
    }
}
