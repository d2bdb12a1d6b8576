// Harness - Browser lifecycle and per-test contexts
//
// One Harness per test binary (or per test), one TestContext per test. Each
// TestContext is an isolated BrowserContext with exactly one page, so cookies,
// storage and open dialogs never leak between tests.

use crate::config::{BrowserKind, HarnessConfig};
use crate::driver::PlaywrightDriver;
use crate::error::{Error, Result};
use crate::interaction::Interactions;
use crate::pages::{AppShell, FilesPage, LoginPage};
use crate::session::SessionStore;
use crate::testdata::TestData;
use futures_util::FutureExt;
use playwright_rs::protocol::BrowserContextOptionsBuilder;
use playwright_rs::{
    Browser, BrowserContext, BrowserContextOptions, LaunchOptions, Page, Playwright, Viewport,
};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A running Playwright server and browser.
pub struct Harness {
    playwright: Playwright,
    browser: Browser,
    config: HarnessConfig,
}

impl Harness {
    /// Starts Playwright and launches the configured browser.
    pub async fn launch(config: &HarnessConfig) -> Result<Self> {
        let playwright = Playwright::launch().await?;
        let browser_type = match config.browser {
            BrowserKind::Chromium => playwright.chromium(),
            BrowserKind::Firefox => playwright.firefox(),
            BrowserKind::Webkit => playwright.webkit(),
        };
        let options = LaunchOptions::new()
            .headless(config.headless)
            .slow_mo(config.slow_mo.as_millis() as f64);
        let browser = browser_type.launch_with_options(options).await?;
        tracing::info!(
            browser = config.browser.as_str(),
            headless = config.headless,
            "browser launched"
        );
        Ok(Self {
            playwright,
            browser,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// New context that starts signed in, from the persisted snapshot.
    ///
    /// Fails with [`crate::Error::SessionMissing`] if setup has not run.
    pub async fn authenticated_context(&self) -> Result<TestContext> {
        let state = SessionStore::new(&self.config.paths.session_state)
            .load()
            .await?;
        let options = self.context_options().storage_state(state).build();
        self.open_context(options).await
    }

    /// New context with no session at all, for tests of the signed-out state.
    pub async fn anonymous_context(&self) -> Result<TestContext> {
        let options = self.context_options().build();
        self.open_context(options).await
    }

    fn context_options(&self) -> BrowserContextOptionsBuilder {
        let (width, height) = self.config.viewport;
        BrowserContextOptions::builder()
            .viewport(Viewport { width, height })
            .accept_downloads(true)
            .base_url(self.config.base_url.to_string())
    }

    async fn open_context(&self, options: BrowserContextOptions) -> Result<TestContext> {
        let context = self.browser.new_context_with_options(options).await?;
        let page = context.new_page().await?;
        let driver = PlaywrightDriver::new(page.clone()).await?;
        let interactions = Interactions::new(Arc::new(driver), self.config.timeouts)
            .with_base_url(self.config.base_url.clone())
            .with_screenshots_dir(self.config.paths.screenshots.clone());
        Ok(TestContext {
            context,
            page,
            interactions,
            downloads: self.config.paths.downloads.clone(),
            test_timeout: self.config.timeouts.test,
        })
    }

    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        self.playwright.shutdown().await?;
        Ok(())
    }
}

/// One test's isolated browser context and page.
pub struct TestContext {
    context: BrowserContext,
    page: Page,
    interactions: Interactions,
    downloads: PathBuf,
    test_timeout: Duration,
}

impl TestContext {
    pub fn interactions(&self) -> &Interactions {
        &self.interactions
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn browser_context(&self) -> &BrowserContext {
        &self.context
    }

    /// Where downloads triggered in this context should be saved.
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads
    }

    pub fn files(&self, data: &TestData) -> FilesPage {
        FilesPage::new(self.interactions.clone(), data)
    }

    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(self.interactions.clone())
    }

    pub fn shell(&self) -> AppShell {
        AppShell::new(self.interactions.clone())
    }

    /// Saves a `<test>_<timestamp>.png` screenshot after a failure.
    ///
    /// Errors are logged, not returned, so they never mask the test's own.
    pub async fn capture_failure(&self, test: &str) -> Option<PathBuf> {
        match self.interactions.screenshot(test, None).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(test, error = %e, "could not capture failure screenshot");
                None
            }
        }
    }

    /// Runs a test body bounded by the configured test timeout.
    ///
    /// If the body fails, panics or runs out of time, a failure screenshot
    /// named after `test` is saved first. Panics from assertions are then
    /// resumed, so the test still fails with its own message.
    pub async fn run<T, Fut>(&self, test: &str, body: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let guarded = AssertUnwindSafe(tokio::time::timeout(self.test_timeout, body)).catch_unwind();
        let outcome = match guarded.await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::timeout(format!("test '{test}'"), self.test_timeout)),
            Err(panic) => {
                tracing::error!(test, "test panicked");
                self.capture_failure(test).await;
                std::panic::resume_unwind(panic);
            }
        };
        if let Err(e) = &outcome {
            tracing::error!(test, error = %e, "test failed");
            self.capture_failure(test).await;
        }
        outcome
    }

    pub async fn close(self) -> Result<()> {
        self.context.close().await?;
        Ok(())
    }
}
