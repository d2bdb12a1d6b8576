// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Driver - The browser primitives the harness is built on
//
// The harness never talks to a browser directly. Everything above this module
// (interactions, page objects, session bootstrap) goes through the Driver
// trait, which exposes a small set of single-shot primitives on selector
// strings. Explicit waiting is layered on top in Interactions.
//
// Implementations:
// - PlaywrightDriver: a playwright-rs Page
// - FakeDriver (tests only): scripted in-memory UI model

mod playwright;

#[cfg(test)]
pub(crate) mod fake;

pub use playwright::PlaywrightDriver;

use crate::error::Result;
use crate::wait::{DEFAULT_POLL_INTERVAL, poll_until};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Element states an explicit wait can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// At least one matching element is rendered and visible
    Visible,
    /// No matching element is visible (absent elements count as hidden)
    Hidden,
    /// At least one matching element is in the DOM, visible or not
    Attached,
    /// No matching element is in the DOM
    Detached,
    /// The element is visible and accepts input
    Enabled,
    /// The element is visible but does not accept input
    Disabled,
}

impl ElementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
            ElementState::Attached => "attached",
            ElementState::Detached => "detached",
            ElementState::Enabled => "enabled",
            ElementState::Disabled => "disabled",
        }
    }
}

/// How browser dialogs (alert, confirm, prompt, beforeunload) are answered.
///
/// A page has at most one active policy. Setting a new policy replaces the old
/// one (last write wins); pages that need both answers over their lifetime
/// are a usage error, see `Interactions::set_dialog_policy_strict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPolicy {
    Accept,
    Dismiss,
}

/// Browser primitives for a single page.
///
/// All methods act immediately on whatever currently matches `selector`; the
/// only waiting a driver does on its own is bounded by the `timeout` passed to
/// action methods. Operations against one page are issued sequentially.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigates the page to an absolute URL.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// The page's current URL.
    fn current_url(&self) -> String;

    async fn click(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn double_click(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<()>;

    async fn hover(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn press(&self, selector: &str, key: &str, timeout: Duration) -> Result<()>;

    /// Selects an `<option>` by value or label, returning the selected values.
    async fn select_option(
        &self,
        selector: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<Vec<String>>;

    async fn set_checked(&self, selector: &str, checked: bool, timeout: Duration) -> Result<()>;

    /// Attaches local files to a file input.
    async fn set_input_files(&self, selector: &str, files: &[PathBuf]) -> Result<()>;

    /// Instantaneous visibility check.
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    async fn is_enabled(&self, selector: &str) -> Result<bool>;

    async fn is_checked(&self, selector: &str) -> Result<bool>;

    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;

    async fn text_content(&self, selector: &str) -> Result<Option<String>>;

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Writes a PNG screenshot of the page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Replaces the page's dialog policy, returning the previous one.
    fn set_dialog_policy(&self, policy: DialogPolicy) -> Option<DialogPolicy>;

    fn dialog_policy(&self) -> Option<DialogPolicy>;

    /// Clicks `selector` and saves the download it triggers into `dest_dir`.
    async fn download(&self, selector: &str, dest_dir: &Path, timeout: Duration)
    -> Result<PathBuf>;

    /// Interval used by the default [`Driver::wait_for_state`].
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Waits until `selector` reaches `state`, failing with
    /// [`crate::Error::Timeout`] after `timeout`.
    async fn wait_for_state(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()> {
        let what = format!("'{}' to be {}", selector, state.as_str());
        poll_until(&what, timeout, self.poll_interval(), move || async move {
            Ok(match state {
                ElementState::Visible => self.is_visible(selector).await?,
                ElementState::Hidden => !self.is_visible(selector).await?,
                ElementState::Attached => self.count(selector).await? > 0,
                ElementState::Detached => self.count(selector).await? == 0,
                ElementState::Enabled => {
                    self.is_visible(selector).await? && self.is_enabled(selector).await?
                }
                ElementState::Disabled => {
                    self.is_visible(selector).await? && !self.is_enabled(selector).await?
                }
            })
        })
        .await
    }
}
