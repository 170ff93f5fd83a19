//! State predicates over a single element
//!
//! Native visibility and the application's marker class are separate
//! signals. A panel slid off-screen with `transform` keeps its layout box, so
//! the automation layer still calls it visible; only the marker class says it
//! is closed. Each condition names which signal it trusts.

use serde::{Deserialize, Serialize};

use crate::browser::ElementState;

/// Predicate evaluated against live element state at poll time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "class", rename_all = "snake_case")]
pub enum Condition {
    /// Exists, natively visible, and lacks the marker class
    VisibleAndUnhidden,
    /// Absent, natively invisible, or carrying the marker class
    Hidden,
    /// Exists and natively visible, marker class ignored
    NativeVisible,
    /// Absent or natively invisible, marker class ignored
    NativeHidden,
    /// Exists and carries the class
    ClassPresent(String),
    /// Exists and does not carry the class
    ClassAbsent(String),
}

impl Condition {
    pub fn class_present(class: impl Into<String>) -> Self {
        Self::ClassPresent(class.into())
    }

    pub fn class_absent(class: impl Into<String>) -> Self {
        Self::ClassAbsent(class.into())
    }

    /// Evaluate against a probe result; `None` means no element matched
    pub fn evaluate(&self, state: Option<&ElementState>, marker_class: &str) -> bool {
        match (self, state) {
            (Self::VisibleAndUnhidden, Some(s)) => {
                s.is_natively_visible() && !s.has_class(marker_class)
            }
            (Self::VisibleAndUnhidden, None) => false,
            (Self::Hidden, Some(s)) => !s.is_natively_visible() || s.has_class(marker_class),
            (Self::Hidden, None) => true,
            (Self::NativeVisible, Some(s)) => s.is_natively_visible(),
            (Self::NativeVisible, None) => false,
            (Self::NativeHidden, Some(s)) => !s.is_natively_visible(),
            (Self::NativeHidden, None) => true,
            (Self::ClassPresent(class), Some(s)) => s.has_class(class),
            (Self::ClassAbsent(class), Some(s)) => !s.has_class(class),
            (Self::ClassPresent(_) | Self::ClassAbsent(_), None) => false,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::VisibleAndUnhidden => write!(f, "visible and unhidden"),
            Condition::Hidden => write!(f, "hidden"),
            Condition::NativeVisible => write!(f, "natively visible"),
            Condition::NativeHidden => write!(f, "natively hidden"),
            Condition::ClassPresent(class) => write!(f, "marked with class '{}'", class),
            Condition::ClassAbsent(class) => write!(f, "free of class '{}'", class),
        }
    }
}
