//! Named step sequences
//!
//! A fluent builder over [`Step`], the built-in acceptance flows for the
//! omikuji front-end, and loading of sequences from TOML files.

use serde::Deserialize;
use std::path::Path;

use crate::core::{Result, UiProofError};
use crate::flow::condition::Condition;
use crate::flow::step::{Expected, Step};

/// Bound used for result overlays, which animate before revealing
pub const OVERLAY_TIMEOUT_MS: u64 = 5_000;

/// Items the `restaurant` preset loads into the lot inputs
pub const RESTAURANT_ITEMS: [&str; 10] = [
    "Pizza", "Sushi", "Burger", "Pasta", "Salad", "Chinese", "Tacos", "Steak", "Ramen", "Curry",
];

/// An ordered, named sequence of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

#[derive(Deserialize)]
struct StepFile {
    #[serde(default)]
    name: Option<String>,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Parse `[[steps]]` tables; a top-level `name` overrides `fallback_name`
    pub fn from_toml(fallback_name: &str, content: &str) -> Result<Self> {
        let file: StepFile = toml::from_str(content)
            .map_err(|e| UiProofError::config(format!("Failed to parse steps: {}", e)))?;
        Ok(Self {
            name: file.name.unwrap_or_else(|| fallback_name.to_string()),
            steps: file.steps,
        })
    }

    /// Load a step file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UiProofError::config(format!("Failed to read steps {}: {}", path.display(), e))
        })?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Self::from_toml(&fallback, &content)
    }

    /// Look up a built-in sequence by name
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "feature-tour" | "tour" => Some(Self::feature_tour()),
            "preset-history" | "presets" => Some(Self::preset_history()),
            _ => None,
        }
    }

    /// Names accepted by [`Scenario::builtin`]
    pub fn builtin_names() -> &'static [&'static str] {
        &["feature-tour", "preset-history"]
    }

    // ===== Builder =====

    /// Append any step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Label the most recently added step
    pub fn labeled(mut self, label: &str) -> Self {
        if let Some(last) = self.steps.pop() {
            self.steps.push(last.labeled(label));
        }
        self
    }

    pub fn navigate(self, location: &str) -> Self {
        self.step(Step::navigate(location))
    }

    pub fn click(self, selector: &str) -> Self {
        self.step(Step::click(selector))
    }

    pub fn select(self, selector: &str, value: &str) -> Self {
        self.step(Step::select_option(selector, value))
    }

    pub fn wait_visible(self, selector: &str) -> Self {
        self.step(Step::wait_for(selector, Condition::VisibleAndUnhidden))
    }

    pub fn wait_visible_within(self, selector: &str, timeout_ms: u64) -> Self {
        self.step(Step::wait_for_within(
            selector,
            Condition::VisibleAndUnhidden,
            timeout_ms,
        ))
    }

    pub fn wait_hidden(self, selector: &str) -> Self {
        self.step(Step::wait_for(selector, Condition::Hidden))
    }

    pub fn wait_class(self, selector: &str, class: &str) -> Self {
        self.step(Step::wait_for(selector, Condition::class_present(class)))
    }

    pub fn wait_no_class(self, selector: &str, class: &str) -> Self {
        self.step(Step::wait_for(selector, Condition::class_absent(class)))
    }

    pub fn capture(self, name: &str) -> Self {
        self.step(Step::capture(name))
    }

    pub fn read_text(self, selector: &str, key: &str) -> Self {
        self.step(Step::read_text(selector, key))
    }

    pub fn read_value(self, selector: &str, key: &str) -> Self {
        self.step(Step::read_value(selector, key))
    }

    /// Diagnostic-only equality against a literal
    pub fn expect_equals(self, key: &str, expected: &str) -> Self {
        self.step(Step::assert_equals(
            key,
            Expected::Literal(expected.to_string()),
            false,
        ))
    }

    /// Diagnostic-only equality against an earlier recorded value
    pub fn expect_same_as(self, key: &str, other: &str) -> Self {
        self.step(Step::assert_equals(
            key,
            Expected::Recorded(other.to_string()),
            false,
        ))
    }

    /// Diagnostic-only membership check
    pub fn expect_member(self, key: &str, allowed: &[&str]) -> Self {
        self.step(Step::assert_member(key, allowed.iter().copied(), false))
    }

    pub fn settle(self) -> Self {
        self.step(Step::settle())
    }

    // ===== Built-in flows =====

    /// Tabs, overlays and theming on the packaged build.
    ///
    /// The result overlay is hidden by marker class and natively, so
    /// `Hidden` is reliable there. The settings panel slides out with a
    /// transform and stays natively visible, so it is tracked by the marker
    /// class alone.
    pub fn feature_tour() -> Self {
        Self::new("feature-tour")
            .navigate("")
            .wait_visible(".nav-item[data-target='tab-omikuji']")
            .capture("omikuji_default")
            // Dice
            .click(".nav-item[data-target='tab-dice']")
            .wait_class("#tab-dice", "active")
            .settle()
            .capture("dice_tab")
            .wait_hidden("#result-overlay")
            .click("#roll-dice-btn")
            .wait_visible_within("#result-overlay", OVERLAY_TIMEOUT_MS)
            .capture("dice_result")
            .click("#close-result")
            .wait_hidden("#result-overlay")
            .capture("overlay_closed")
            // Cards
            .click(".nav-item[data-target='tab-cards']")
            .wait_class("#tab-cards", "active")
            .settle()
            .capture("cards_tab")
            .click("#draw-card-btn")
            .wait_visible_within("#result-overlay", OVERLAY_TIMEOUT_MS)
            .capture("card_result")
            .click("#close-result")
            .wait_hidden("#result-overlay")
            // Theme
            .click("#config-toggle")
            .wait_no_class("#config-panel", "hidden")
            .capture("settings_open")
            .click(".theme-opt[data-theme='dark']")
            .wait_class(".theme-opt[data-theme='dark']", "active")
            .settle()
            .capture("dark_mode_settings")
            .click("#config-close")
            .wait_class("#config-panel", "hidden")
            .settle()
            .capture("dark_mode_main")
            .click("#config-toggle")
            .wait_no_class("#config-panel", "hidden")
            .click(".theme-opt[data-theme='light']")
            .wait_class(".theme-opt[data-theme='light']", "active")
            .click("#config-close")
            .wait_class("#config-panel", "hidden")
            .settle()
            .capture("light_mode_restored")
    }

    /// Preset loading, drawing, and history on the served build
    pub fn preset_history() -> Self {
        Self::new("preset-history")
            .navigate("")
            .click("#config-toggle")
            .wait_no_class("#config-panel", "hidden")
            .select("#preset-select", "restaurant")
            .read_value(".lot-input-wrapper input", "first_lot")
            .expect_equals("first_lot", "Pizza")
            .labeled("restaurant preset loaded")
            .click("#save-config")
            .wait_class("#config-panel", "hidden")
            .click("#draw-btn")
            .wait_visible_within("#result-overlay", OVERLAY_TIMEOUT_MS)
            .read_text("#result-content", "result")
            .expect_member("result", &RESTAURANT_ITEMS)
            .labeled("result is a restaurant item")
            .capture("restaurant_result")
            .click("#close-result")
            .wait_hidden("#result-overlay")
            .click("#history-toggle")
            .wait_visible("#history-list li")
            .read_text("#history-list li .history-content", "history_first")
            .expect_same_as("history_first", "result")
            .labeled("history matches result")
            .capture("history_restaurant")
    }
}
