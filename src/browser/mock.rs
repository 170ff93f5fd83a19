//! In-memory page used in tests
//!
//! Elements are keyed by the exact selector string a step uses. Clicks and
//! selections trigger scripted mutations, optionally delayed by a number of
//! probes so that waits observe an asynchronous transition.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::browser::remote::RemoteControl;
use crate::browser::state::ElementState;
use crate::core::{Result, UiProofError};

/// A scripted element
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub state: ElementState,
    pub text: String,
    pub value: String,
    pub options: Vec<String>,
}

/// A change applied to the page in response to an action
#[derive(Debug, Clone)]
pub enum Mutation {
    AddClass { selector: String, class: String },
    RemoveClass { selector: String, class: String },
    SetText { selector: String, text: String },
    SetValue { selector: String, value: String },
    SetState { selector: String, state: ElementState },
    Remove { selector: String },
}

impl Mutation {
    pub fn add_class(selector: &str, class: &str) -> Self {
        Self::AddClass {
            selector: selector.to_string(),
            class: class.to_string(),
        }
    }

    pub fn remove_class(selector: &str, class: &str) -> Self {
        Self::RemoveClass {
            selector: selector.to_string(),
            class: class.to_string(),
        }
    }

    pub fn set_text(selector: &str, text: &str) -> Self {
        Self::SetText {
            selector: selector.to_string(),
            text: text.to_string(),
        }
    }

    pub fn set_value(selector: &str, value: &str) -> Self {
        Self::SetValue {
            selector: selector.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Scheduled {
    delay: usize,
    mutation: Mutation,
}

#[derive(Debug, Default)]
struct Inner {
    elements: HashMap<String, MockElement>,
    on_click: HashMap<String, Vec<Scheduled>>,
    on_select: HashMap<(String, String), Vec<Scheduled>>,
    pending: Vec<Scheduled>,
    failing_urls: Vec<String>,
    screenshots_fail: bool,
    navigations: Vec<String>,
    clicks: Vec<String>,
    screenshots: Vec<PathBuf>,
    queries: usize,
    closes: usize,
}

impl Inner {
    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::AddClass { selector, class } => {
                if let Some(el) = self.elements.get_mut(&selector) {
                    el.state.add_class(&class);
                }
            }
            Mutation::RemoveClass { selector, class } => {
                if let Some(el) = self.elements.get_mut(&selector) {
                    el.state.remove_class(&class);
                }
            }
            Mutation::SetText { selector, text } => {
                if let Some(el) = self.elements.get_mut(&selector) {
                    el.text = text;
                }
            }
            Mutation::SetValue { selector, value } => {
                if let Some(el) = self.elements.get_mut(&selector) {
                    el.value = value;
                }
            }
            Mutation::SetState { selector, state } => {
                self.elements.entry(selector).or_default().state = state;
            }
            Mutation::Remove { selector } => {
                self.elements.remove(&selector);
            }
        }
    }

    fn schedule(&mut self, effects: Vec<Scheduled>) {
        for effect in effects {
            if effect.delay == 0 {
                self.apply(effect.mutation);
            } else {
                self.pending.push(effect);
            }
        }
    }

    /// Advance delayed mutations by one probe
    fn tick(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for mut effect in pending {
            effect.delay -= 1;
            if effect.delay == 0 {
                self.apply(effect.mutation);
            } else {
                self.pending.push(effect);
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closes > 0 {
            Err(UiProofError::browser("session closed"))
        } else {
            Ok(())
        }
    }

    fn element(&self, selector: &str) -> Result<&MockElement> {
        self.elements
            .get(selector)
            .ok_or_else(|| UiProofError::browser(format!("no element for {}", selector)))
    }
}

/// Shared-state fake page; clones observe the same page
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    inner: Arc<Mutex<Inner>>,
}

impl MockPage {
    /// Empty page
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element with the given state
    pub fn with_element(self, selector: &str, state: ElementState) -> Self {
        self.inner.lock().elements.insert(
            selector.to_string(),
            MockElement {
                state,
                ..MockElement::default()
            },
        );
        self
    }

    /// Add a visible element with text content
    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.inner
            .lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .text = text.to_string();
        self
    }

    /// Add a visible form control with a value
    pub fn with_value(self, selector: &str, value: &str) -> Self {
        self.inner
            .lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .value = value.to_string();
        self
    }

    /// Add a select element with the given option values
    pub fn with_options(self, selector: &str, options: &[&str]) -> Self {
        self.inner
            .lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    /// Apply `mutation` as soon as `selector` is clicked
    pub fn on_click(self, selector: &str, mutation: Mutation) -> Self {
        self.on_click_after(selector, 0, mutation)
    }

    /// Apply `mutation` after `probes` further element probes following a click
    pub fn on_click_after(self, selector: &str, probes: usize, mutation: Mutation) -> Self {
        self.inner
            .lock()
            .on_click
            .entry(selector.to_string())
            .or_default()
            .push(Scheduled {
                delay: probes,
                mutation,
            });
        self
    }

    /// Apply `mutation` when `value` is selected in `selector`
    pub fn on_select(self, selector: &str, value: &str, mutation: Mutation) -> Self {
        self.inner
            .lock()
            .on_select
            .entry((selector.to_string(), value.to_string()))
            .or_default()
            .push(Scheduled { delay: 0, mutation });
        self
    }

    /// Make navigation fail for URLs containing `fragment`
    pub fn fail_navigation_to(self, fragment: &str) -> Self {
        self.inner.lock().failing_urls.push(fragment.to_string());
        self
    }

    /// Make every screenshot fail
    pub fn fail_screenshots(self) -> Self {
        self.inner.lock().screenshots_fail = true;
        self
    }

    /// Current state of an element
    pub fn state(&self, selector: &str) -> Option<ElementState> {
        self.inner
            .lock()
            .elements
            .get(selector)
            .map(|el| el.state.clone())
    }

    /// URLs navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.inner.lock().navigations.clone()
    }

    /// Selectors clicked, in order
    pub fn clicks(&self) -> Vec<String> {
        self.inner.lock().clicks.clone()
    }

    /// Screenshot paths written, in order
    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.inner.lock().screenshots.clone()
    }

    /// Number of probes served
    pub fn query_count(&self) -> usize {
        self.inner.lock().queries
    }

    /// Number of times the session was closed
    pub fn close_count(&self) -> usize {
        self.inner.lock().closes
    }
}

#[async_trait]
impl RemoteControl for MockPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if inner.failing_urls.iter().any(|f| url.contains(f.as_str())) {
            return Err(UiProofError::browser(format!("net::ERR_FILE_NOT_FOUND at {}", url)));
        }
        inner.navigations.push(url.to_string());
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementState>> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.queries += 1;
        inner.tick();
        Ok(inner.elements.get(selector).map(|el| el.state.clone()))
    }

    async fn option_values(&self, selector: &str) -> Result<Option<Vec<String>>> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.elements.get(selector).map(|el| el.options.clone()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.element(selector)?;
        inner.clicks.push(selector.to_string());
        let effects = inner.on_click.get(selector).cloned().unwrap_or_default();
        inner.schedule(effects);
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if let Some(el) = inner.elements.get_mut(selector) {
            el.value = value.to_string();
        }
        let effects = inner
            .on_select
            .get(&(selector.to_string(), value.to_string()))
            .cloned()
            .unwrap_or_default();
        inner.schedule(effects);
        Ok(())
    }

    async fn text_content(&self, selector: &str) -> Result<String> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.element(selector)?.text.clone())
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.element(selector)?.value.clone())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if inner.screenshots_fail {
            return Err(UiProofError::browser("screenshot primitive unavailable"));
        }
        std::fs::write(path, b"\x89PNG\r\n\x1a\n")?;
        inner.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.inner.lock().closes += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delayed_click_effect() {
        let page = MockPage::new()
            .with_element("#btn", ElementState::shown())
            .with_element("#overlay", ElementState::shown().with_class("hidden"))
            .on_click_after("#btn", 2, Mutation::remove_class("#overlay", "hidden"));

        page.click("#btn").await.unwrap();
        assert!(page.query("#overlay").await.unwrap().unwrap().has_class("hidden"));
        assert!(!page.query("#overlay").await.unwrap().unwrap().has_class("hidden"));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let page = MockPage::new().with_element("#btn", ElementState::shown());
        page.close().await.unwrap();
        assert!(page.click("#btn").await.is_err());
        assert_eq!(page.close_count(), 1);
    }
}
