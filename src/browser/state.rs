//! Element state probing
//!
//! A single JavaScript probe reads the computed style, class list and box of
//! the first element matching a selector. The result is decoded into
//! [`ElementState`], which the condition waiter evaluates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Result, UiProofError};

/// Live layout/style state of one element at probe time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    /// Computed `display`
    #[serde(default)]
    pub display: String,
    /// Computed `visibility`
    #[serde(default)]
    pub visibility: String,
    /// Computed `opacity`
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    /// Class list in document order
    #[serde(default)]
    pub classes: Vec<String>,
    /// Bounding box width
    #[serde(default)]
    pub width: f64,
    /// Bounding box height
    #[serde(default)]
    pub height: f64,
    /// Whether the box intersects the viewport. Informational only: an
    /// element translated off-screen is still natively visible.
    #[serde(default)]
    pub in_viewport: bool,
}

fn full_opacity() -> f64 {
    1.0
}

impl Default for ElementState {
    fn default() -> Self {
        Self::shown()
    }
}

impl ElementState {
    /// A laid-out, opaque, on-screen element with no classes
    pub fn shown() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            classes: Vec::new(),
            width: 100.0,
            height: 40.0,
            in_viewport: true,
        }
    }

    /// Add a class
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Set `display: none` and collapse the box
    pub fn display_none(mut self) -> Self {
        self.display = "none".to_string();
        self.width = 0.0;
        self.height = 0.0;
        self.in_viewport = false;
        self
    }

    /// Translated outside the viewport, otherwise untouched
    pub fn offscreen(mut self) -> Self {
        self.in_viewport = false;
        self
    }

    /// Set the opacity
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Whether the element carries a class
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Remove a class if present
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Insert a class if absent
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    /// Visibility as the automation layer sees it: laid out, not
    /// `visibility: hidden`, not fully transparent, non-empty box.
    /// Geometry relative to the viewport is ignored.
    pub fn is_natively_visible(&self) -> bool {
        self.display != "none"
            && self.visibility != "hidden"
            && self.visibility != "collapse"
            && self.opacity > 0.0
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Script returning the JSON-encoded state of `selector`, or `null`
pub fn probe_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return JSON.stringify(null);
  const s = window.getComputedStyle(el);
  const r = el.getBoundingClientRect();
  return JSON.stringify({{
    display: s.display,
    visibility: s.visibility,
    opacity: parseFloat(s.opacity),
    classes: Array.from(el.classList),
    width: r.width,
    height: r.height,
    inViewport: r.right > 0 && r.bottom > 0 && r.left < window.innerWidth && r.top < window.innerHeight
  }});
}})()"#,
        sel = js_string(selector)
    )
}

/// Script returning the JSON-encoded option values of a select, or `null`
pub fn options_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el || !el.options) return JSON.stringify(null);
  return JSON.stringify(Array.from(el.options).map(o => o.value));
}})()"#,
        sel = js_string(selector)
    )
}

/// Script returning the JSON-encoded text content of `selector`, or `null`
pub fn text_script(selector: &str) -> String {
    read_script(selector, "el.textContent")
}

/// Script returning the JSON-encoded value of a form control, or `null`
pub fn value_script(selector: &str) -> String {
    read_script(selector, "el.value")
}

fn read_script(selector: &str, expr: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return JSON.stringify(null);
  return JSON.stringify(String({expr} ?? ""));
}})()"#,
        sel = js_string(selector),
        expr = expr
    )
}

fn js_string(s: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Unwrap agent-browser eval output.
///
/// Accepts the `{"success": .., "data": {"result": ..}}` envelope or a bare
/// value. A JSON-encoded string result is decoded once more.
pub fn decode_eval_output(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| UiProofError::browser(format!("unreadable eval output '{}': {}", trimmed, e)))?;

    let value = match value {
        Value::Object(mut map) if map.contains_key("success") => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let reason = map
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("eval failed")
                    .to_string();
                return Err(UiProofError::browser(reason));
            }
            match map.remove("data") {
                Some(Value::Object(mut data)) if data.contains_key("result") => {
                    data.remove("result").unwrap_or(Value::Null)
                }
                Some(other) => other,
                None => Value::Null,
            }
        }
        other => other,
    };

    match value {
        Value::String(inner) => Ok(serde_json::from_str(&inner).unwrap_or(Value::String(inner))),
        other => Ok(other),
    }
}

/// Decode a probe result into an element state; `None` when nothing matched
pub fn parse_probe(raw: &str) -> Result<Option<ElementState>> {
    match decode_eval_output(raw)? {
        Value::Null => Ok(None),
        value => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Decode an options result; `None` when the select does not exist
pub fn parse_options(raw: &str) -> Result<Option<Vec<String>>> {
    match decode_eval_output(raw)? {
        Value::Null => Ok(None),
        value => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Decode a text or value read; `None` when nothing matched
pub fn parse_read(raw: &str) -> Result<Option<String>> {
    match decode_eval_output(raw)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        // A single-encoded result such as "42" decodes to a scalar
        other @ (Value::Number(_) | Value::Bool(_)) => Ok(Some(other.to_string())),
        other => Err(UiProofError::browser(format!("unexpected read result: {}", other))),
    }
}
