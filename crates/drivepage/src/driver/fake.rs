// FakeDriver - In-memory Driver for unit tests
//
// A FakeDriver delegates element lookups and actions to a FakeApp, a small
// model of the application's UI keyed by rendered selector strings. Every
// action is recorded so tests can assert ordering (e.g. hover before check).

use super::{DialogPolicy, Driver};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long Playwright's attribute reads wait for a missing element by default.
pub const READ_AUTO_WAIT: Duration = Duration::from_secs(30);

/// An action the harness performed, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Goto(String),
    Click(String),
    DoubleClick(String),
    Fill(String, String),
    Hover(String),
    Press(String, String),
    Select(String, String),
    SetChecked(String, bool),
    SetFiles(String, Vec<PathBuf>),
    Screenshot(PathBuf),
}

impl Action {
    pub(crate) fn selector(&self) -> Option<&str> {
        match self {
            Action::Click(s)
            | Action::DoubleClick(s)
            | Action::Fill(s, _)
            | Action::Hover(s)
            | Action::Press(s, _)
            | Action::Select(s, _)
            | Action::SetChecked(s, _)
            | Action::SetFiles(s, _) => Some(s),
            Action::Goto(_) | Action::Screenshot(_) => None,
        }
    }
}

/// Snapshot of one element (or group of identical elements) in the fake UI.
#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    pub visible: bool,
    pub enabled: bool,
    pub checked: bool,
    pub text: Option<String>,
    pub attributes: HashMap<String, String>,
    pub count: usize,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            checked: false,
            text: None,
            attributes: HashMap::new(),
            count: 1,
        }
    }
}

impl FakeElement {
    pub fn visible() -> Self {
        Self::default()
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Model of the application's UI.
pub(crate) trait FakeApp: Send + 'static {
    /// Current state of whatever `selector` matches, or None if nothing does.
    fn element(&self, selector: &str) -> Option<FakeElement>;

    /// Applies an action that already passed the fake's actionability checks.
    fn perform(&mut self, action: &Action) -> Result<()>;

    fn url(&self) -> String {
        "about:blank".to_string()
    }
}

/// A static map of elements with optional click reactions.
#[derive(Default)]
pub(crate) struct StaticApp {
    pub elements: HashMap<String, FakeElement>,
    #[allow(clippy::type_complexity)]
    pub on_click: HashMap<String, Box<dyn FnMut(&mut HashMap<String, FakeElement>) + Send>>,
    pub url: String,
}

impl StaticApp {
    pub fn new() -> Self {
        Self {
            url: "about:blank".to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    pub fn on_click(
        mut self,
        selector: &str,
        reaction: impl FnMut(&mut HashMap<String, FakeElement>) + Send + 'static,
    ) -> Self {
        self.on_click.insert(selector.to_string(), Box::new(reaction));
        self
    }
}

impl FakeApp for StaticApp {
    fn element(&self, selector: &str) -> Option<FakeElement> {
        self.elements.get(selector).cloned()
    }

    fn perform(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Goto(url) => self.url = url.clone(),
            Action::Click(selector) => {
                if let Some(reaction) = self.on_click.get_mut(selector) {
                    reaction(&mut self.elements);
                }
            }
            Action::Fill(selector, value) => {
                if let Some(element) = self.elements.get_mut(selector) {
                    element.attributes.insert("value".into(), value.clone());
                }
            }
            Action::SetChecked(selector, checked) => {
                if let Some(element) = self.elements.get_mut(selector) {
                    element.checked = *checked;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}

/// Driver over a [`FakeApp`].
pub(crate) struct FakeDriver<A> {
    app: Mutex<A>,
    log: Mutex<Vec<Action>>,
    dialog_policy: Mutex<Option<DialogPolicy>>,
}

impl<A: FakeApp> FakeDriver<A> {
    pub fn new(app: A) -> Self {
        Self {
            app: Mutex::new(app),
            log: Mutex::new(Vec::new()),
            dialog_policy: Mutex::new(None),
        }
    }

    /// Actions performed so far.
    pub fn actions(&self) -> Vec<Action> {
        self.log.lock().clone()
    }

    /// Position of the first recorded action equal to `action`.
    pub fn position(&self, action: &Action) -> Option<usize> {
        self.log.lock().iter().position(|a| a == action)
    }

    pub fn with_app<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.app.lock())
    }

    fn element(&self, selector: &str) -> Option<FakeElement> {
        self.app
            .lock()
            .element(selector)
            .filter(|element| element.count > 0)
    }

    /// Playwright's actionability check, collapsed to an instant decision:
    /// the target must be visible (and enabled for input actions).
    fn act(&self, action: Action, needs_enabled: bool, timeout: Duration) -> Result<()> {
        if let Some(selector) = action.selector() {
            let actionable = self
                .element(selector)
                .map(|e| e.visible && (!needs_enabled || e.enabled))
                .unwrap_or(false);
            let file_input = matches!(action, Action::SetFiles(..));
            if !actionable && !(file_input && self.element(selector).is_some()) {
                return Err(Error::timeout(format!("'{selector}' to be actionable"), timeout));
            }
        }
        self.log.lock().push(action.clone());
        self.app.lock().perform(&action)
    }
}

const INSTANT: Duration = Duration::ZERO;

#[async_trait]
impl<A: FakeApp> Driver for FakeDriver<A> {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.act(Action::Goto(url.to_string()), false, timeout)
    }

    fn current_url(&self) -> String {
        self.app.lock().url()
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.act(Action::Click(selector.to_string()), true, timeout)
    }

    async fn double_click(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.act(Action::DoubleClick(selector.to_string()), true, timeout)
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<()> {
        self.act(
            Action::Fill(selector.to_string(), value.to_string()),
            true,
            timeout,
        )
    }

    async fn hover(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.act(Action::Hover(selector.to_string()), false, timeout)
    }

    async fn press(&self, selector: &str, key: &str, timeout: Duration) -> Result<()> {
        self.act(
            Action::Press(selector.to_string(), key.to_string()),
            true,
            timeout,
        )
    }

    async fn select_option(
        &self,
        selector: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        self.act(
            Action::Select(selector.to_string(), value.to_string()),
            true,
            timeout,
        )?;
        Ok(vec![value.to_string()])
    }

    async fn set_checked(&self, selector: &str, checked: bool, timeout: Duration) -> Result<()> {
        self.act(
            Action::SetChecked(selector.to_string(), checked),
            true,
            timeout,
        )
    }

    async fn set_input_files(&self, selector: &str, files: &[PathBuf]) -> Result<()> {
        self.act(
            Action::SetFiles(selector.to_string(), files.to_vec()),
            false,
            INSTANT,
        )
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self.element(selector).is_some_and(|e| e.visible))
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool> {
        Ok(self.element(selector).is_some_and(|e| e.enabled))
    }

    async fn is_checked(&self, selector: &str) -> Result<bool> {
        self.element(selector)
            .map(|e| e.checked)
            .ok_or_else(|| Error::timeout(format!("'{selector}' to be attached"), INSTANT))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.element(selector).map(|e| e.count).unwrap_or(0))
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.element(selector).and_then(|e| e.text))
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        match self.element(selector) {
            Some(element) => Ok(element.attributes.get(name).cloned()),
            // Playwright waits for a missing element before reading from it.
            None => {
                tokio::time::sleep(READ_AUTO_WAIT).await;
                Err(Error::timeout(format!("'{selector}' to be attached"), READ_AUTO_WAIT))
            }
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.log.lock().push(Action::Screenshot(path.to_path_buf()));
        Ok(())
    }

    fn set_dialog_policy(&self, policy: DialogPolicy) -> Option<DialogPolicy> {
        self.dialog_policy.lock().replace(policy)
    }

    fn dialog_policy(&self) -> Option<DialogPolicy> {
        *self.dialog_policy.lock()
    }

    async fn download(
        &self,
        selector: &str,
        dest_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf> {
        self.click(selector, timeout).await?;
        Ok(dest_dir.join("download.bin"))
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(5)
    }
}
