//! Step definitions
//!
//! A step is one unit of work with a label for diagnostics. Steps run strictly
//! in declaration order.

use serde::{Deserialize, Serialize};

use crate::flow::condition::Condition;

/// Value an assertion compares against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    /// A fixed string
    Literal(String),
    /// A value read by an earlier step under this key
    Recorded(String),
}

/// Comparison applied to a recorded value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Equals(Expected),
    Member(Vec<String>),
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    /// Load a location, resolved against the run's origin
    Navigate { location: String },
    Click { selector: String },
    SelectOption { selector: String, value: String },
    WaitFor {
        selector: String,
        condition: Condition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    Capture { name: String },
    /// Read text content and record it under `key`
    ReadText { selector: String, key: String },
    /// Read a form value and record it under `key`
    ReadValue { selector: String, key: String },
    /// Compare the value recorded under `key`
    Assert {
        key: String,
        check: Check,
        #[serde(default)]
        fatal: bool,
    },
    /// Pause for a visual transition; `None` uses the configured delay
    Settle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ms: Option<u64>,
    },
}

/// One labelled unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            label: String::new(),
            kind,
        }
    }

    /// Replace the diagnostic label
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The label, or a description derived from the kind
    pub fn describe(&self) -> String {
        if !self.label.is_empty() {
            return self.label.clone();
        }
        match &self.kind {
            StepKind::Navigate { location } if location.is_empty() => "navigate to origin".to_string(),
            StepKind::Navigate { location } => format!("navigate to {}", location),
            StepKind::Click { selector } => format!("click {}", selector),
            StepKind::SelectOption { selector, value } => format!("select '{}' in {}", value, selector),
            StepKind::WaitFor {
                selector, condition, ..
            } => format!("wait for {} to be {}", selector, condition),
            StepKind::Capture { name } => format!("capture {}", name),
            StepKind::ReadText { selector, key } => format!("read text of {} as {}", selector, key),
            StepKind::ReadValue { selector, key } => format!("read value of {} as {}", selector, key),
            StepKind::Assert { key, check, .. } => match check {
                Check::Equals(_) => format!("assert {} equals expected", key),
                Check::Member(_) => format!("assert {} is an allowed value", key),
            },
            StepKind::Settle { .. } => "settle".to_string(),
        }
    }

    pub fn navigate(location: impl Into<String>) -> Self {
        Self::new(StepKind::Navigate {
            location: location.into(),
        })
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Self::new(StepKind::Click {
            selector: selector.into(),
        })
    }

    pub fn select_option(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(StepKind::SelectOption {
            selector: selector.into(),
            value: value.into(),
        })
    }

    pub fn wait_for(selector: impl Into<String>, condition: Condition) -> Self {
        Self::new(StepKind::WaitFor {
            selector: selector.into(),
            condition,
            timeout_ms: None,
        })
    }

    pub fn wait_for_within(selector: impl Into<String>, condition: Condition, timeout_ms: u64) -> Self {
        Self::new(StepKind::WaitFor {
            selector: selector.into(),
            condition,
            timeout_ms: Some(timeout_ms),
        })
    }

    pub fn capture(name: impl Into<String>) -> Self {
        Self::new(StepKind::Capture { name: name.into() })
    }

    pub fn read_text(selector: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(StepKind::ReadText {
            selector: selector.into(),
            key: key.into(),
        })
    }

    pub fn read_value(selector: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(StepKind::ReadValue {
            selector: selector.into(),
            key: key.into(),
        })
    }

    pub fn assert_equals(key: impl Into<String>, expected: Expected, fatal: bool) -> Self {
        Self::new(StepKind::Assert {
            key: key.into(),
            check: Check::Equals(expected),
            fatal,
        })
    }

    pub fn assert_member<S: Into<String>>(
        key: impl Into<String>,
        allowed: impl IntoIterator<Item = S>,
        fatal: bool,
    ) -> Self {
        Self::new(StepKind::Assert {
            key: key.into(),
            check: Check::Member(allowed.into_iter().map(Into::into).collect()),
            fatal,
        })
    }

    pub fn settle() -> Self {
        Self::new(StepKind::Settle { ms: None })
    }

    pub fn settle_for(ms: u64) -> Self {
        Self::new(StepKind::Settle { ms: Some(ms) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_falls_back_to_kind() {
        let step = Step::wait_for_within("#result-overlay", Condition::VisibleAndUnhidden, 5000);
        assert_eq!(
            step.describe(),
            "wait for #result-overlay to be visible and unhidden"
        );
        assert_eq!(step.clone().labeled("overlay shown").describe(), "overlay shown");
        assert_eq!(Step::navigate("").describe(), "navigate to origin");
    }

    #[test]
    fn test_steps_from_toml() {
        #[derive(Deserialize)]
        struct File {
            steps: Vec<Step>,
        }

        let file: File = toml::from_str(
            r##"
            [[steps]]
            kind = "click"
            selector = "#draw-btn"

            [[steps]]
            label = "overlay shown"
            kind = "wait_for"
            selector = "#result-overlay"
            condition = { state = "visible_and_unhidden" }
            timeout_ms = 5000

            [[steps]]
            kind = "assert"
            key = "result"
            check = { member = ["Pizza", "Sushi"] }
            "##,
        )
        .unwrap();

        assert_eq!(file.steps.len(), 3);
        assert_eq!(file.steps[0], Step::click("#draw-btn"));
        assert_eq!(
            file.steps[1],
            Step::wait_for_within("#result-overlay", Condition::VisibleAndUnhidden, 5000)
                .labeled("overlay shown")
        );
        assert_eq!(
            file.steps[2],
            Step::assert_member("result", ["Pizza", "Sushi"], false)
        );
    }
}
