// Interactions - The base interaction layer every page object is built on
//
// Contract: no action touches an element before an explicit wait has confirmed
// it reached the state the action needs (visible, enabled, attached). Timeouts
// are configured in one place (Timeouts) and every wait failure propagates as
// Error::Timeout. The only methods that swallow failures are the boolean
// checks (is_visible, is_visible_within), whose callers ask "does it exist?"
// rather than "do this".
//
// Assertions (expect_*) poll like Playwright's expect() and fail with
// Error::Assertion carrying an expected-vs-actual sentence.

use crate::artifacts;
use crate::config::Timeouts;
use crate::driver::{DialogPolicy, Driver, ElementState};
use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::wait::poll_until;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Handle to one page, shared by all page objects bound to it.
///
/// Cloning is cheap and yields a handle to the same page.
#[derive(Clone)]
pub struct Interactions {
    driver: Arc<dyn Driver>,
    base_url: Option<Url>,
    timeouts: Timeouts,
    screenshots_dir: PathBuf,
}

impl Interactions {
    pub fn new(driver: Arc<dyn Driver>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            base_url: None,
            timeouts,
            screenshots_dir: PathBuf::from("test-results/screenshots"),
        }
    }

    /// Relative paths passed to [`Interactions::goto`] resolve against `base_url`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_screenshots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshots_dir = dir.into();
        self
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    // Navigation

    /// Navigates to `path`, resolved against the base URL when one is set.
    pub async fn goto(&self, path: &str) -> Result<()> {
        let url = match &self.base_url {
            Some(base) => base
                .join(path)
                .map_err(|e| Error::Usage(format!("cannot resolve '{path}': {e}")))?
                .to_string(),
            None => path.to_string(),
        };
        self.driver.goto(&url, self.timeouts.navigation).await
    }

    pub fn current_url(&self) -> String {
        self.driver.current_url()
    }

    /// Waits until the page URL matches `pattern`.
    pub async fn wait_for_url(&self, pattern: &Regex, timeout: Duration) -> Result<()> {
        let what = format!("URL matching /{}/", pattern.as_str());
        let driver = &self.driver;
        poll_until(&what, timeout, driver.poll_interval(), move || async move {
            Ok(pattern.is_match(&driver.current_url()))
        })
        .await
    }

    /// Waits until the path of the page URL matches `pattern`.
    ///
    /// Host, query and fragment are ignored, so `https://drive.acme.io/login`
    /// or `/login?next=/drive` never satisfy a pattern meant for `/drive`.
    pub async fn wait_for_path(&self, pattern: &Regex, timeout: Duration) -> Result<()> {
        let what = format!("URL path matching /{}/", pattern.as_str());
        let driver = &self.driver;
        poll_until(&what, timeout, driver.poll_interval(), move || async move {
            Ok(url_path(&driver.current_url()).is_some_and(|path| pattern.is_match(&path)))
        })
        .await
    }

    // Explicit waits

    pub async fn wait_for(&self, locator: &Locator, state: ElementState) -> Result<()> {
        self.wait_for_within(locator, state, self.timeouts.action)
            .await
    }

    pub async fn wait_for_within(
        &self,
        locator: &Locator,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()> {
        self.driver
            .wait_for_state(&locator.selector(), state, timeout)
            .await
    }

    pub async fn wait_for_visible(&self, locator: &Locator) -> Result<()> {
        self.wait_for(locator, ElementState::Visible).await
    }

    pub async fn wait_for_hidden(&self, locator: &Locator) -> Result<()> {
        self.wait_for(locator, ElementState::Hidden).await
    }

    pub async fn wait_for_enabled(&self, locator: &Locator) -> Result<()> {
        self.wait_for(locator, ElementState::Enabled).await
    }

    /// Waits until exactly `expected` elements match.
    pub async fn wait_for_count(
        &self,
        locator: &Locator,
        expected: usize,
        timeout: Duration,
    ) -> Result<()> {
        let selector = locator.selector();
        let what = format!("{expected} elements matching '{selector}'");
        let (driver, selector) = (&self.driver, selector.as_str());
        poll_until(&what, timeout, driver.poll_interval(), move || async move {
            Ok(driver.count(selector).await? == expected)
        })
        .await
    }

    // Actions

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, "click");
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver.click(&selector, self.timeouts.action).await
    }

    pub async fn double_click(&self, locator: &Locator) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, "double click");
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver.double_click(&selector, self.timeouts.action).await
    }

    pub async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, "fill");
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver.fill(&selector, value, self.timeouts.action).await
    }

    pub async fn hover(&self, locator: &Locator) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, "hover");
        self.wait_for_visible(locator).await?;
        self.driver.hover(&selector, self.timeouts.action).await
    }

    pub async fn press(&self, locator: &Locator, key: &str) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, key, "press");
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver.press(&selector, key, self.timeouts.action).await
    }

    pub async fn select_option(&self, locator: &Locator, value: &str) -> Result<Vec<String>> {
        let selector = locator.selector();
        tracing::debug!(%selector, value, "select option");
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver
            .select_option(&selector, value, self.timeouts.action)
            .await
    }

    pub async fn check(&self, locator: &Locator) -> Result<()> {
        self.set_checked(locator, true).await
    }

    pub async fn uncheck(&self, locator: &Locator) -> Result<()> {
        self.set_checked(locator, false).await
    }

    async fn set_checked(&self, locator: &Locator, checked: bool) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, checked, "set checked");
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver
            .set_checked(&selector, checked, self.timeouts.action)
            .await
    }

    /// Attaches files to a file input. File inputs are usually hidden, so this
    /// waits for the input to be attached rather than visible.
    pub async fn attach_files(&self, locator: &Locator, files: &[PathBuf]) -> Result<()> {
        let selector = locator.selector();
        tracing::debug!(%selector, count = files.len(), "attach files");
        self.wait_for(locator, ElementState::Attached).await?;
        self.driver.set_input_files(&selector, files).await
    }

    /// Clicks `locator` and saves the resulting download into `dest_dir`.
    pub async fn download(&self, locator: &Locator, dest_dir: &Path) -> Result<PathBuf> {
        let selector = locator.selector();
        self.wait_for(locator, ElementState::Enabled).await?;
        self.driver
            .download(&selector, dest_dir, self.timeouts.action)
            .await
    }

    // Reads

    /// Visible text of the element, trimmed; empty when it has none.
    pub async fn get_text(&self, locator: &Locator) -> Result<String> {
        self.wait_for_visible(locator).await?;
        Ok(trimmed(self.driver.text_content(&locator.selector()).await?))
    }

    /// True if the element becomes visible within the expect timeout.
    ///
    /// Never fails: a timeout or driver error reads as `false`.
    pub async fn is_visible(&self, locator: &Locator) -> bool {
        self.is_visible_within(locator, self.timeouts.expect).await
    }

    /// True if the element becomes visible within `timeout`. Never fails.
    pub async fn is_visible_within(&self, locator: &Locator, timeout: Duration) -> bool {
        match self
            .wait_for_within(locator, ElementState::Visible, timeout)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::trace!(selector = %locator, error = %e, "treating as not visible");
                false
            }
        }
    }

    pub async fn is_enabled(&self, locator: &Locator) -> Result<bool> {
        self.wait_for_visible(locator).await?;
        self.driver.is_enabled(&locator.selector()).await
    }

    pub async fn is_checked(&self, locator: &Locator) -> Result<bool> {
        self.wait_for(locator, ElementState::Attached).await?;
        self.driver.is_checked(&locator.selector()).await
    }

    /// Number of elements matching right now. Does not wait.
    pub async fn count(&self, locator: &Locator) -> Result<usize> {
        self.driver.count(&locator.selector()).await
    }

    pub async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        self.wait_for(locator, ElementState::Attached).await?;
        self.driver.get_attribute(&locator.selector(), name).await
    }

    // Dialogs

    /// Accepts every browser dialog for the rest of this page's life.
    pub fn accept_dialogs(&self) {
        self.replace_dialog_policy(DialogPolicy::Accept);
    }

    /// Dismisses every browser dialog for the rest of this page's life.
    pub fn dismiss_dialogs(&self) {
        self.replace_dialog_policy(DialogPolicy::Dismiss);
    }

    fn replace_dialog_policy(&self, policy: DialogPolicy) {
        if let Some(previous) = self.driver.set_dialog_policy(policy)
            && previous != policy
        {
            tracing::warn!(
                ?previous,
                ?policy,
                "dialog policy replaced on a live page; only the last one applies"
            );
        }
    }

    /// Sets the dialog policy, refusing to replace a different one already
    /// active on this page.
    pub fn set_dialog_policy_strict(&self, policy: DialogPolicy) -> Result<()> {
        match self.driver.dialog_policy() {
            Some(current) if current != policy => Err(Error::Usage(format!(
                "page already answers dialogs with {current:?}; use one dialog policy per page"
            ))),
            _ => {
                self.driver.set_dialog_policy(policy);
                Ok(())
            }
        }
    }

    // Artifacts

    /// Saves a screenshot named `<test>_<timestamp>[_<step>].png`.
    pub async fn screenshot(&self, test: &str, step: Option<&str>) -> Result<PathBuf> {
        let path = artifacts::screenshot_path(&self.screenshots_dir, test, step);
        self.driver.screenshot(&path).await?;
        tracing::info!(path = %path.display(), "saved screenshot");
        Ok(path)
    }

    // Assertions

    pub async fn expect_visible(&self, locator: &Locator) -> Result<()> {
        self.expect_state(locator, ElementState::Visible, "to be visible")
            .await
    }

    pub async fn expect_hidden(&self, locator: &Locator) -> Result<()> {
        self.expect_state(locator, ElementState::Hidden, "to be hidden")
            .await
    }

    pub async fn expect_enabled(&self, locator: &Locator) -> Result<()> {
        self.expect_state(locator, ElementState::Enabled, "to be enabled")
            .await
    }

    pub async fn expect_disabled(&self, locator: &Locator) -> Result<()> {
        self.expect_state(locator, ElementState::Disabled, "to be disabled")
            .await
    }

    async fn expect_state(
        &self,
        locator: &Locator,
        state: ElementState,
        expectation: &str,
    ) -> Result<()> {
        self.wait_for_within(locator, state, self.timeouts.expect)
            .await
            .map_err(|e| match e {
                Error::Timeout { timeout, .. } => Error::Assertion(format!(
                    "Expected '{locator}' {expectation}, but it was not after {timeout:?}"
                )),
                other => other,
            })
    }

    pub async fn expect_checked(&self, locator: &Locator, checked: bool) -> Result<()> {
        let selector = locator.selector();
        let what = format!("'{selector}' checked={checked}");
        let (driver, sel) = (&self.driver, selector.as_str());
        let interval = driver.poll_interval();
        poll_until(&what, self.timeouts.expect, interval, move || async move {
            Ok(driver.is_checked(sel).await.ok() == Some(checked))
        })
        .await
        .map_err(|_| {
            let expected = if checked { "checked" } else { "unchecked" };
            Error::Assertion(format!(
                "Expected '{selector}' to be {expected} after {:?}",
                self.timeouts.expect
            ))
        })
    }

    /// Asserts the element's trimmed text equals `expected`.
    pub async fn expect_text(&self, locator: &Locator, expected: &str) -> Result<()> {
        let selector = locator.selector();
        let expected = expected.trim();
        let what = format!("'{selector}' to have text '{expected}'");
        let (driver, sel) = (&self.driver, selector.as_str());
        let interval = driver.poll_interval();
        let waited = poll_until(&what, self.timeouts.expect, interval, move || async move {
            Ok(trimmed(driver.text_content(sel).await?) == expected)
        })
        .await;
        match waited {
            Err(Error::Timeout { .. }) => {
                let actual = trimmed(self.driver.text_content(&selector).await?);
                Err(Error::Assertion(format!(
                    "Expected '{selector}' to have text '{expected}', but had '{actual}'"
                )))
            }
            other => other,
        }
    }

    pub async fn expect_count(&self, locator: &Locator, expected: usize) -> Result<()> {
        self.wait_for_count(locator, expected, self.timeouts.expect)
            .await
            .map_err(|_| Error::Assertion(format!(
                "Expected {expected} elements matching '{locator}', but the count never settled there within {:?}",
                self.timeouts.expect
            )))
    }
}

/// Path component of `raw`, or `None` if it is not an absolute URL.
pub(crate) fn url_path(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(|url| url.path().to_string())
}

fn trimmed(text: Option<String>) -> String {
    text.map(|t| t.trim().to_string()).unwrap_or_default()
}
