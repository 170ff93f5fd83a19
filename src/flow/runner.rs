//! Step runner
//!
//! Drives one ordered step sequence against one owned session. The first
//! fatal failure stops the run; the session is released on every exit path.

use futures::FutureExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser::RemoteControl;
use crate::core::config::RunConfig;
use crate::core::{ErrorKind, Origin, Result, UiProofError};
use crate::flow::actuator::Actuator;
use crate::flow::assertion::{assert_equals, assert_member, AssertionResult};
use crate::flow::capture::{ArtifactCapture, ArtifactRecord};
use crate::flow::step::{Check, Expected, Step, StepKind};
use crate::flow::waiter::ConditionWaiter;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Mutable state of one run
#[derive(Debug)]
pub struct Run {
    status: RunStatus,
    current_index: usize,
    artifacts: Vec<ArtifactRecord>,
    assertions: Vec<AssertionResult>,
    recorded: BTreeMap<String, String>,
}

impl Default for Run {
    fn default() -> Self {
        Self::new()
    }
}

impl Run {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Pending,
            current_index: 0,
            artifacts: Vec::new(),
            assertions: Vec::new(),
            recorded: BTreeMap::new(),
        }
    }

    /// Pending -> Running
    pub fn start(&mut self) {
        if self.status == RunStatus::Pending {
            self.status = RunStatus::Running;
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn artifacts(&self) -> &[ArtifactRecord] {
        &self.artifacts
    }

    pub fn assertions(&self) -> &[AssertionResult] {
        &self.assertions
    }

    /// Value recorded by a read step
    pub fn recorded(&self, key: &str) -> Option<&str> {
        self.recorded.get(key).map(String::as_str)
    }

    pub fn last_artifact(&self) -> Option<&ArtifactRecord> {
        self.artifacts.last()
    }

    fn recorded_or_fail(&self, key: &str, message: &str) -> Result<String> {
        self.recorded
            .get(key)
            .cloned()
            .ok_or_else(|| UiProofError::AssertionFailed {
                message: message.to_string(),
                expected: format!("a value recorded under '{}'", key),
                actual: String::new(),
            })
    }

    fn finish(mut self, failure: Option<RunFailure>, steps_completed: usize) -> RunReport {
        if self.status == RunStatus::Running && failure.is_none() {
            self.status = RunStatus::Succeeded;
        }
        RunReport {
            status: self.status,
            steps_completed,
            artifacts: self.artifacts,
            assertions: self.assertions,
            recorded: self.recorded,
            failure,
        }
    }
}

/// Where and why a run stopped
#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub step_index: usize,
    pub label: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Most recent capture before the failure
    pub last_artifact: Option<ArtifactRecord>,
}

/// Final outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub steps_completed: usize,
    pub artifacts: Vec<ArtifactRecord>,
    pub assertions: Vec<AssertionResult>,
    pub recorded: BTreeMap<String, String>,
    pub failure: Option<RunFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Assertions that did not hold
    pub fn mismatches(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertions.iter().filter(|a| !a.passed)
    }
}

/// Exclusive owner of a remote session for the length of a run.
///
/// Dropping an unreleased session (a cancelled run future) spawns a
/// best-effort close on the current runtime.
pub struct Session<R: RemoteControl + 'static> {
    remote: Arc<R>,
    released: bool,
}

impl<R: RemoteControl + 'static> Session<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote: Arc::new(remote),
            released: false,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Close the session. Close errors are logged, never escalated.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.remote.close().await {
            warn!(transport = self.remote.name(), error = %e, "session close failed");
        }
    }
}

impl<R: RemoteControl + 'static> Drop for Session<R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(transport = self.remote.name(), "session dropped without release, closing");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let remote = Arc::clone(&self.remote);
                handle.spawn(async move {
                    if let Err(e) = remote.close().await {
                        warn!(transport = remote.name(), error = %e, "session close failed");
                    }
                });
            }
            Err(_) => warn!(transport = self.remote.name(), "no runtime left to close session"),
        }
    }
}

/// Executes step sequences against an origin
#[derive(Debug, Clone)]
pub struct StepRunner {
    origin: Origin,
    waiter: ConditionWaiter,
    capture: ArtifactCapture,
    settle: Duration,
}

impl StepRunner {
    pub fn new(origin: Origin, waiter: ConditionWaiter, capture: ArtifactCapture, settle: Duration) -> Self {
        Self {
            origin,
            waiter,
            capture,
            settle,
        }
    }

    pub fn from_config(origin: Origin, config: &RunConfig) -> Self {
        Self::new(
            origin,
            ConditionWaiter::from_config(config),
            ArtifactCapture::new(config.output_dir.clone()),
            Duration::from_millis(config.settle_ms),
        )
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Run every step against `remote`, which is closed afterwards no matter
    /// how the run ends. A panic inside a step is re-raised after the close.
    pub async fn run<R: RemoteControl + 'static>(&self, remote: R, steps: &[Step]) -> RunReport {
        self.run_until(remote, steps, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops early once `shutdown` completes.
    /// The interrupted step is reported as a `Cancelled` failure and the
    /// session is released as usual.
    pub async fn run_until<R, F>(&self, remote: R, steps: &[Step], shutdown: F) -> RunReport
    where
        R: RemoteControl + 'static,
        F: Future<Output = ()>,
    {
        let session = Session::new(remote);
        let mut run = Run::new();
        run.start();
        info!(origin = %self.origin, steps = steps.len(), transport = session.remote().name(), "run started");

        let outcome = {
            let drive = AssertUnwindSafe(self.drive(&mut run, session.remote(), steps)).catch_unwind();
            tokio::select! {
                outcome = drive => Some(outcome),
                _ = shutdown => None,
            }
        };

        session.release().await;

        let (failure, completed) = match outcome {
            Some(Ok(result)) => result,
            Some(Err(panic)) => std::panic::resume_unwind(panic),
            None => {
                let index = run.current_index;
                let failure = RunFailure {
                    step_index: index,
                    label: steps.get(index).map(Step::describe).unwrap_or_default(),
                    kind: ErrorKind::Cancelled,
                    message: UiProofError::Cancelled.to_string(),
                    last_artifact: run.last_artifact().cloned(),
                };
                warn!(step = index, label = %failure.label, "run cancelled");
                run.status = RunStatus::Failed;
                (Some(failure), index)
            }
        };

        let report = run.finish(failure, completed);
        info!(status = %report.status, artifacts = report.artifacts.len(), "run finished");
        report
    }

    async fn drive(
        &self,
        run: &mut Run,
        remote: &dyn RemoteControl,
        steps: &[Step],
    ) -> (Option<RunFailure>, usize) {
        for (index, step) in steps.iter().enumerate() {
            if let Err(err) = self.execute_step(run, remote, index, step).await {
                let failure = RunFailure {
                    step_index: index,
                    label: step.describe(),
                    kind: err.kind(),
                    message: err.to_string(),
                    last_artifact: run.last_artifact().cloned(),
                };
                error!(step = index, label = %failure.label, kind = %failure.kind, "{}", failure.message);
                return (Some(failure), index);
            }
        }
        (None, steps.len())
    }

    /// Execute one step. Any error moves the run to `Failed`.
    pub async fn execute_step(
        &self,
        run: &mut Run,
        remote: &dyn RemoteControl,
        index: usize,
        step: &Step,
    ) -> Result<()> {
        if run.status != RunStatus::Running {
            return Err(UiProofError::Other(format!(
                "step {} requested while run is {}",
                index, run.status
            )));
        }

        run.current_index = index;
        info!(step = index, label = %step.describe(), "step");

        let result = self.apply(run, remote, index, step).await;
        if result.is_err() {
            run.status = RunStatus::Failed;
        }
        result
    }

    async fn apply(
        &self,
        run: &mut Run,
        remote: &dyn RemoteControl,
        index: usize,
        step: &Step,
    ) -> Result<()> {
        let actuator = Actuator::new(remote);

        match &step.kind {
            StepKind::Navigate { location } => {
                let url = self
                    .origin
                    .resolve(location)
                    .map_err(|e| UiProofError::NavigationFailed {
                        url: location.clone(),
                        reason: e.to_string(),
                    })?;
                actuator.navigate(&url).await
            }
            StepKind::Click { selector } => actuator.click(selector).await,
            StepKind::SelectOption { selector, value } => {
                actuator.select_option(selector, value).await
            }
            StepKind::WaitFor {
                selector,
                condition,
                timeout_ms,
            } => {
                let timeout = timeout_ms.map(Duration::from_millis);
                self.waiter
                    .wait(remote, selector, condition, timeout)
                    .await
                    .map(|_| ())
            }
            StepKind::Capture { name } => {
                let ordinal = run.artifacts.len() + 1;
                let record = self.capture.capture(remote, name, ordinal, index).await?;
                run.artifacts.push(record);
                Ok(())
            }
            StepKind::ReadText { selector, key } => {
                let text = actuator.read_text(selector).await?;
                info!(key = %key, value = %text, "read text");
                run.recorded.insert(key.clone(), text);
                Ok(())
            }
            StepKind::ReadValue { selector, key } => {
                let value = actuator.read_value(selector).await?;
                info!(key = %key, value = %value, "read value");
                run.recorded.insert(key.clone(), value);
                Ok(())
            }
            StepKind::Assert { key, check, fatal } => {
                let message = step.describe();
                let actual = run.recorded_or_fail(key, &message)?;
                let result = match check {
                    Check::Equals(Expected::Literal(expected)) => {
                        assert_equals(expected, &actual, message)
                    }
                    Check::Equals(Expected::Recorded(other)) => {
                        let expected = run.recorded_or_fail(other, &message)?;
                        assert_equals(&expected, &actual, message)
                    }
                    Check::Member(allowed) => assert_member(&actual, allowed, message),
                };
                run.assertions.push(result.clone());

                if result.passed {
                    Ok(())
                } else if *fatal {
                    Err(result.into_error())
                } else {
                    warn!(
                        expected = %result.expected,
                        actual = %result.actual,
                        "{} (diagnostic only)",
                        result.message
                    );
                    Ok(())
                }
            }
            StepKind::Settle { ms } => {
                let duration = ms.map(Duration::from_millis).unwrap_or(self.settle);
                self.waiter.settle(duration).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{ElementState, MockPage, Mutation};
    use crate::flow::condition::Condition;

    fn runner(dir: &std::path::Path) -> StepRunner {
        StepRunner::new(
            Origin::Http(url::Url::parse("http://localhost:8000/").unwrap()),
            ConditionWaiter::new(Duration::from_millis(5), Duration::from_millis(200), "hidden"),
            ArtifactCapture::new(dir),
            Duration::from_millis(1),
        )
    }

    fn overlay_page() -> MockPage {
        MockPage::new()
            .with_element("#toggle", ElementState::shown())
            .with_element("#close", ElementState::shown())
            .with_element("#overlay", ElementState::shown().with_class("hidden"))
            .on_click_after("#toggle", 2, Mutation::remove_class("#overlay", "hidden"))
            .on_click_after("#close", 2, Mutation::add_class("#overlay", "hidden"))
    }

    #[tokio::test]
    async fn test_reveal_then_hide_keeps_run_running() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let page = overlay_page();
        let mut run = Run::new();
        run.start();

        let steps = [
            Step::click("#toggle"),
            Step::wait_for("#overlay", Condition::VisibleAndUnhidden),
            Step::click("#close"),
            Step::wait_for("#overlay", Condition::Hidden),
        ];
        for (i, step) in steps.iter().enumerate() {
            runner.execute_step(&mut run, &page, i, step).await.unwrap();
        }

        assert_eq!(run.status(), RunStatus::Running);
        assert_eq!(run.current_index(), 3);
        assert!(page.state("#overlay").unwrap().has_class("hidden"));
    }

    #[tokio::test]
    async fn test_step_refused_unless_running() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let page = overlay_page();
        let mut run = Run::new();

        assert!(runner
            .execute_step(&mut run, &page, 0, &Step::click("#toggle"))
            .await
            .is_err());
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_last_artifact_and_closes_session() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let page = overlay_page();

        let report = runner
            .run(
                page.clone(),
                &[
                    Step::capture("before"),
                    Step::click("#missing").labeled("press missing button"),
                    Step::capture("never"),
                ],
            )
            .await;

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.steps_completed, 1);
        assert_eq!(report.artifacts.len(), 1);
        let failure = report.failure.unwrap();
        assert_eq!(failure.step_index, 1);
        assert_eq!(failure.label, "press missing button");
        assert_eq!(failure.kind, ErrorKind::TargetNotFound);
        assert_eq!(failure.last_artifact.unwrap().name, "before");
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_recorded_values_compare() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let page = MockPage::new()
            .with_text("#result-content", "Sushi")
            .with_text("#history-first", "Sushi");

        let report = runner
            .run(
                page,
                &[
                    Step::read_text("#result-content", "result"),
                    Step::read_text("#history-first", "history"),
                    Step::assert_equals("history", Expected::Recorded("result".into()), true),
                ],
            )
            .await;

        assert!(report.succeeded());
        assert_eq!(report.recorded.get("result").map(String::as_str), Some("Sushi"));
        assert_eq!(report.assertions.len(), 1);
        assert!(report.assertions[0].passed);
    }

    #[tokio::test]
    async fn test_assert_on_unrecorded_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let report = runner(dir.path())
            .run(
                MockPage::new(),
                &[Step::assert_member("result", ["Pizza"], false)],
            )
            .await;
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.failure.unwrap().kind, ErrorKind::AssertionFailed);
    }

    #[tokio::test]
    async fn test_fatal_mismatch_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new().with_value("#first-lot", "Apple");
        let report = runner(dir.path())
            .run(
                page.clone(),
                &[
                    Step::read_value("#first-lot", "first"),
                    Step::assert_equals("first", Expected::Literal("Pizza".into()), true),
                    Step::settle(),
                ],
            )
            .await;
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.steps_completed, 1);
        assert_eq!(report.mismatches().count(), 1);
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_reports_cancelled_and_closes_session() {
        let dir = tempfile::tempdir().unwrap();
        let page = overlay_page();
        let steps = [
            Step::capture("before"),
            Step::wait_for_within("#overlay", Condition::VisibleAndUnhidden, 5000),
        ];

        let report = runner(dir.path())
            .run_until(page.clone(), &steps, tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.steps_completed, 1);
        let failure = report.failure.unwrap();
        assert_eq!(failure.step_index, 1);
        assert_eq!(failure.kind, ErrorKind::Cancelled);
        assert_eq!(failure.last_artifact.unwrap().name, "before");
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_run_still_closes_session() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let page = overlay_page();
        let steps = [Step::wait_for_within("#overlay", Condition::VisibleAndUnhidden, 5000)];

        let outcome = tokio::time::timeout(Duration::from_millis(50), runner.run(page.clone(), &steps)).await;
        assert!(outcome.is_err());

        for _ in 0..100 {
            if page.close_count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_location_fails_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new();
        let report = runner(dir.path())
            .run(page.clone(), &[Step::navigate("http://[oops")])
            .await;

        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::NavigationFailed);
        assert!(failure.message.contains("http://[oops"));
        assert!(page.navigations().is_empty());
    }
}
