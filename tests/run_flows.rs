//! Full runs against a scripted page
//!
//! The mock page mirrors the omikuji front-end: the result overlay is toggled
//! by the `hidden` class, tabs by `active`, and the settings panel slides out
//! with a transform so it stays natively visible while closed.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::Duration;

use uiproof::browser::{ElementState, MockPage, Mutation, RemoteControl};
use uiproof::core::{ErrorKind, Origin};
use uiproof::flow::{
    assert_member, ArtifactCapture, Condition, ConditionWaiter, RunStatus, Scenario, Step,
    StepRunner,
};

fn runner(origin: &str, dir: &Path, poll_ms: u64) -> StepRunner {
    StepRunner::new(
        Origin::parse(origin).unwrap(),
        ConditionWaiter::new(
            Duration::from_millis(poll_ms),
            Duration::from_millis(500),
            "hidden",
        ),
        ArtifactCapture::new(dir),
        Duration::from_millis(1),
    )
}

fn omikuji_app() -> MockPage {
    let hidden_overlay = ElementState::shown().with_class("hidden");
    let closed_panel = ElementState::shown().offscreen().with_class("hidden");

    MockPage::new()
        .with_element(".nav-item[data-target='tab-omikuji']", ElementState::shown())
        .with_element(".nav-item[data-target='tab-dice']", ElementState::shown())
        .with_element(".nav-item[data-target='tab-cards']", ElementState::shown())
        .with_element("#tab-dice", ElementState::shown().display_none())
        .with_element("#tab-cards", ElementState::shown().display_none())
        .with_element("#roll-dice-btn", ElementState::shown())
        .with_element("#draw-card-btn", ElementState::shown())
        .with_element("#draw-btn", ElementState::shown())
        .with_element("#result-overlay", hidden_overlay)
        .with_element("#result-content", ElementState::shown())
        .with_element("#close-result", ElementState::shown())
        .with_element("#config-toggle", ElementState::shown())
        .with_element("#config-close", ElementState::shown())
        .with_element("#save-config", ElementState::shown())
        .with_element("#config-panel", closed_panel)
        .with_element(".theme-opt[data-theme='dark']", ElementState::shown())
        .with_element(
            ".theme-opt[data-theme='light']",
            ElementState::shown().with_class("active"),
        )
        .with_element("#history-toggle", ElementState::shown())
        .with_element("#preset-select", ElementState::shown())
        .with_options("#preset-select", &["default", "restaurant"])
        .with_element(".lot-input-wrapper input", ElementState::shown())
        .with_value(".lot-input-wrapper input", "大吉")
        // Tabs
        .on_click_after(
            ".nav-item[data-target='tab-dice']",
            2,
            Mutation::add_class("#tab-dice", "active"),
        )
        .on_click_after(
            ".nav-item[data-target='tab-cards']",
            2,
            Mutation::add_class("#tab-cards", "active"),
        )
        // Result overlay
        .on_click_after("#roll-dice-btn", 3, Mutation::set_text("#result-content", "5"))
        .on_click_after("#roll-dice-btn", 3, Mutation::remove_class("#result-overlay", "hidden"))
        .on_click_after("#draw-card-btn", 3, Mutation::remove_class("#result-overlay", "hidden"))
        .on_click_after("#draw-btn", 2, Mutation::set_text("#result-content", "Ramen"))
        .on_click_after("#draw-btn", 2, Mutation::remove_class("#result-overlay", "hidden"))
        .on_click_after("#close-result", 1, Mutation::add_class("#result-overlay", "hidden"))
        // Settings panel
        .on_click_after("#config-toggle", 2, Mutation::remove_class("#config-panel", "hidden"))
        .on_click_after("#config-close", 2, Mutation::add_class("#config-panel", "hidden"))
        .on_click("#save-config", Mutation::add_class("#config-panel", "hidden"))
        .on_click(
            ".theme-opt[data-theme='dark']",
            Mutation::add_class(".theme-opt[data-theme='dark']", "active"),
        )
        .on_click(
            ".theme-opt[data-theme='dark']",
            Mutation::remove_class(".theme-opt[data-theme='light']", "active"),
        )
        .on_click(
            ".theme-opt[data-theme='light']",
            Mutation::add_class(".theme-opt[data-theme='light']", "active"),
        )
        .on_click(
            ".theme-opt[data-theme='light']",
            Mutation::remove_class(".theme-opt[data-theme='dark']", "active"),
        )
        // History
        .on_click(
            "#history-toggle",
            Mutation::SetState {
                selector: "#history-list li".to_string(),
                state: ElementState::shown(),
            },
        )
        .on_click(
            "#history-toggle",
            Mutation::SetState {
                selector: "#history-list li .history-content".to_string(),
                state: ElementState::shown(),
            },
        )
        .on_click(
            "#history-toggle",
            Mutation::set_text("#history-list li .history-content", "Ramen"),
        )
}

fn with_restaurant_preset(page: MockPage, first_item: &str) -> MockPage {
    page.on_select(
        "#preset-select",
        "restaurant",
        Mutation::set_value(".lot-input-wrapper input", first_item),
    )
}

#[tokio::test]
async fn test_dice_result_capture_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let page = omikuji_app();

    let report = runner("/srv/omikuji", dir.path(), 5)
        .run(
            page.clone(),
            &[
                Step::navigate("app/index.html"),
                Step::wait_for("#result-overlay", Condition::Hidden),
                Step::click("#roll-dice-btn"),
                Step::wait_for_within("#result-overlay", Condition::VisibleAndUnhidden, 5000),
                Step::capture("dice_result"),
            ],
        )
        .await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].name, "dice_result");
    assert_eq!(report.artifacts[0].step_index, 4);
    assert!(report.artifacts[0].path.exists());
    assert!(page.navigations()[0].ends_with("app/index.html"));
    assert_eq!(page.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_overlay_never_appears_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new()
        .with_element("#draw-btn", ElementState::shown())
        .with_element("#result-overlay", ElementState::shown().with_class("hidden"))
        .with_text("#result-content", "");

    let report = runner("http://localhost:8000", dir.path(), 50)
        .run(
            page.clone(),
            &[
                Step::click("#draw-btn"),
                Step::wait_for_within("#result-overlay", Condition::VisibleAndUnhidden, 5000),
                Step::read_text("#result-content", "result"),
            ],
        )
        .await;

    assert_eq!(report.status, RunStatus::Failed);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.step_index, 1);
    assert_eq!(failure.kind, ErrorKind::ConditionTimedOut);
    assert!(failure.message.contains("#result-overlay"));
    assert!(failure.last_artifact.is_none());
    assert!(report.recorded.is_empty());
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_membership_mismatch_is_diagnostic_only() {
    assert!(assert_member("Pizza", &["Pizza", "Sushi", "Burger"], "pick").passed);
    assert!(!assert_member("Pizza", &["Sushi", "Burger"], "pick").passed);

    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new().with_text("#result-content", "Pizza");
    let report = runner("http://localhost:8000", dir.path(), 5)
        .run(
            page,
            &[
                Step::read_text("#result-content", "result"),
                Step::assert_member("result", ["Sushi", "Burger"], false),
            ],
        )
        .await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let mismatches: Vec<_> = report.mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].actual, "Pizza");
}

#[tokio::test]
async fn test_feature_tour_on_packaged_build() {
    let dir = tempfile::tempdir().unwrap();
    let page = omikuji_app();

    let report = runner("/srv/omikuji/index.html", dir.path(), 2)
        .run(page.clone(), Scenario::feature_tour().steps())
        .await;

    assert!(report.succeeded(), "{:?}", report.failure);
    assert_eq!(report.artifacts.len(), 10);
    let files: Vec<_> = report
        .artifacts
        .iter()
        .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files[0], "01_omikuji_default.png");
    assert_eq!(files[9], "10_light_mode_restored.png");
    assert_eq!(page.navigations(), vec!["file:///srv/omikuji/index.html".to_string()]);

    // The panel ended closed by marker class while staying natively visible.
    let panel = page.state("#config-panel").unwrap();
    assert!(panel.has_class("hidden"));
    assert!(panel.is_natively_visible());
    assert!(page
        .state(".theme-opt[data-theme='light']")
        .unwrap()
        .has_class("active"));
}

#[tokio::test]
async fn test_native_hidden_never_holds_for_slid_out_panel() {
    let dir = tempfile::tempdir().unwrap();
    let page = omikuji_app();

    let report = runner("http://localhost:8000", dir.path(), 5)
        .run(
            page,
            &[
                Step::wait_for("#config-panel", Condition::class_present("hidden")),
                Step::wait_for_within("#config-panel", Condition::NativeHidden, 50),
            ],
        )
        .await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failure.unwrap().step_index, 1);
}

#[tokio::test]
async fn test_preset_history_on_served_build() {
    let dir = tempfile::tempdir().unwrap();
    let page = with_restaurant_preset(omikuji_app(), "Pizza");

    let report = runner("http://localhost:8000", dir.path(), 2)
        .run(page.clone(), Scenario::preset_history().steps())
        .await;

    assert!(report.succeeded(), "{:?}", report.failure);
    assert_eq!(report.mismatches().count(), 0);
    assert_eq!(report.assertions.len(), 3);
    assert_eq!(report.recorded.get("result").map(String::as_str), Some("Ramen"));
    assert_eq!(
        report.recorded.get("history_first").map(String::as_str),
        Some("Ramen")
    );
    assert_eq!(page.navigations(), vec!["http://localhost:8000/".to_string()]);
}

#[tokio::test]
async fn test_wrong_preset_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let page = with_restaurant_preset(omikuji_app(), "Apple");

    let report = runner("http://localhost:8000", dir.path(), 2)
        .run(page, Scenario::preset_history().steps())
        .await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let mismatches: Vec<_> = report.mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].message, "restaurant preset loaded");
    assert_eq!(mismatches[0].actual, "Apple");
}

#[tokio::test]
async fn test_missing_option_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let report = runner("http://localhost:8000", dir.path(), 2)
        .run(
            omikuji_app(),
            &[Step::select_option("#preset-select", "bakery")],
        )
        .await;
    assert_eq!(report.failure.unwrap().kind, ErrorKind::OptionNotFound);
}

/// Page whose clicks blow up inside the transport
struct PanickingPage(MockPage);

#[async_trait]
impl RemoteControl for PanickingPage {
    async fn navigate(&self, url: &str) -> uiproof::Result<()> {
        self.0.navigate(url).await
    }

    async fn query(&self, selector: &str) -> uiproof::Result<Option<ElementState>> {
        self.0.query(selector).await
    }

    async fn option_values(&self, selector: &str) -> uiproof::Result<Option<Vec<String>>> {
        self.0.option_values(selector).await
    }

    async fn click(&self, _selector: &str) -> uiproof::Result<()> {
        panic!("transport crashed");
    }

    async fn select_option(&self, selector: &str, value: &str) -> uiproof::Result<()> {
        self.0.select_option(selector, value).await
    }

    async fn text_content(&self, selector: &str) -> uiproof::Result<String> {
        self.0.text_content(selector).await
    }

    async fn input_value(&self, selector: &str) -> uiproof::Result<String> {
        self.0.input_value(selector).await
    }

    async fn screenshot(&self, path: &Path) -> uiproof::Result<()> {
        self.0.screenshot(path).await
    }

    async fn close(&self) -> uiproof::Result<()> {
        self.0.close().await
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

#[tokio::test]
async fn test_session_released_when_step_panics() {
    let dir = tempfile::tempdir().unwrap();
    let page = MockPage::new().with_element("#draw-btn", ElementState::shown());
    let runner = runner("http://localhost:8000", dir.path(), 2);
    let steps = [Step::click("#draw-btn")];

    let outcome = AssertUnwindSafe(runner.run(PanickingPage(page.clone()), &steps))
        .catch_unwind()
        .await;

    assert!(outcome.is_err());
    assert_eq!(page.close_count(), 1);
}
