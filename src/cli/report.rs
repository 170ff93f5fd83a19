//! Run summaries
//!
//! A human summary for the terminal and a `report.json` next to the
//! screenshots.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::Result;
use crate::flow::RunReport;

/// File name of the persisted report inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Format a report for display
pub fn render(scenario: &str, report: &RunReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Scenario {}: {} ({} steps completed)\n",
        scenario,
        report.status.to_string().to_uppercase(),
        report.steps_completed
    ));

    if let Some(failure) = &report.failure {
        output.push_str(&format!(
            "\nFailed at step {} \"{}\"\n  {}: {}\n",
            failure.step_index, failure.label, failure.kind, failure.message
        ));
        match &failure.last_artifact {
            Some(artifact) => output.push_str(&format!(
                "  Last good capture: {} ({})\n",
                artifact.name,
                artifact.path.display()
            )),
            None => output.push_str("  No capture taken before the failure\n"),
        }
    }

    if !report.artifacts.is_empty() {
        output.push_str("\nArtifacts:\n");
        for artifact in &report.artifacts {
            output.push_str(&format!(
                "  [{}] {} -> {}\n",
                artifact.step_index,
                artifact.name,
                artifact.path.display()
            ));
        }
    }

    let mismatches: Vec<_> = report.mismatches().collect();
    if !mismatches.is_empty() {
        output.push_str("\nAssertion mismatches:\n");
        for m in mismatches {
            output.push_str(&format!(
                "  {}: expected {}, got '{}'\n",
                m.message, m.expected, m.actual
            ));
        }
    }

    output
}

/// Write `report.json` into `dir` and return its path
pub fn write_json(report: &RunReport, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(REPORT_FILE);
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockPage;
    use crate::core::Origin;
    use crate::flow::{ArtifactCapture, ConditionWaiter, Step, StepRunner};
    use std::time::Duration;

    async fn failed_report(dir: &Path) -> RunReport {
        let runner = StepRunner::new(
            Origin::parse("http://localhost:8000").unwrap(),
            ConditionWaiter::new(Duration::from_millis(5), Duration::from_millis(20), "hidden"),
            ArtifactCapture::new(dir),
            Duration::from_millis(1),
        );
        runner
            .run(
                MockPage::new().with_text("#result-content", "Tofu"),
                &[
                    Step::capture("start"),
                    Step::read_text("#result-content", "result"),
                    Step::assert_member("result", ["Pizza", "Sushi"], false),
                    Step::click("#draw-btn"),
                ],
            )
            .await
    }

    #[tokio::test]
    async fn test_render_failure_summary() {
        let dir = tempfile::tempdir().unwrap();
        let report = failed_report(dir.path()).await;
        let text = render("smoke", &report);
        assert!(text.contains("FAILED"));
        assert!(text.contains("Failed at step 3"));
        assert!(text.contains("TargetNotFound"));
        assert!(text.contains("Last good capture: start"));
        assert!(text.contains("got 'Tofu'"));
    }

    #[tokio::test]
    async fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = failed_report(dir.path()).await;
        let path = write_json(&report, dir.path()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure"]["kind"], "target_not_found");
        assert_eq!(json["artifacts"][0]["name"], "start");
    }
}
