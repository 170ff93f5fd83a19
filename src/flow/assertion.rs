//! Equality and membership checks
//!
//! Comparisons never fail by themselves: they produce an [`AssertionResult`]
//! and the step runner decides whether a mismatch halts the run.

use serde::Serialize;

/// Outcome of one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionResult {
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    pub message: String,
}

impl AssertionResult {
    /// Render a failed result as an error
    pub fn into_error(self) -> crate::core::UiProofError {
        crate::core::UiProofError::AssertionFailed {
            message: self.message,
            expected: self.expected,
            actual: self.actual,
        }
    }
}

pub fn assert_equals(expected: &str, actual: &str, message: impl Into<String>) -> AssertionResult {
    AssertionResult {
        expected: format!("'{}'", expected),
        actual: actual.to_string(),
        passed: expected == actual,
        message: message.into(),
    }
}

pub fn assert_member<S: AsRef<str>>(
    value: &str,
    allowed: &[S],
    message: impl Into<String>,
) -> AssertionResult {
    let passed = allowed.iter().any(|a| a.as_ref() == value);
    let expected = allowed
        .iter()
        .map(|a| a.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    AssertionResult {
        expected: format!("one of [{}]", expected),
        actual: value.to_string(),
        passed,
        message: message.into(),
    }
}
