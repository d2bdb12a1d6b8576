// PlaywrightDriver - Driver implementation over a playwright-rs Page
//
// Each method resolves a fresh playwright-rs Locator from the selector string,
// so nothing is cached between calls.
//
// Dialogs and downloads are page events. One handler of each kind is
// registered when the driver is created:
// - the dialog handler reads a single shared policy slot (last write wins)
// - the download handler forwards every Download into a channel that
//   download() drains

use super::{DialogPolicy, Driver};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use playwright_rs::protocol::Download;
use playwright_rs::{
    CheckOptions, ClickOptions, FillOptions, GotoOptions, HoverOptions, Locator, Page,
    PressOptions, SelectOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Driver backed by a live Playwright page.
pub struct PlaywrightDriver {
    page: Page,
    dialog_policy: Arc<Mutex<Option<DialogPolicy>>>,
    downloads: tokio::sync::Mutex<mpsc::UnboundedReceiver<Download>>,
}

impl PlaywrightDriver {
    /// Wraps `page` and registers its dialog and download handlers.
    pub async fn new(page: Page) -> Result<Self> {
        let dialog_policy: Arc<Mutex<Option<DialogPolicy>>> = Arc::new(Mutex::new(None));
        let policy = dialog_policy.clone();
        page.on_dialog(move |dialog| {
            let policy = *policy.lock();
            async move {
                tracing::debug!(
                    kind = dialog.type_(),
                    message = dialog.message(),
                    ?policy,
                    "answering dialog"
                );
                match policy {
                    Some(DialogPolicy::Accept) => dialog.accept(None).await,
                    // An unanswered dialog freezes the page, so no policy means dismiss.
                    Some(DialogPolicy::Dismiss) | None => dialog.dismiss().await,
                }
            }
        })
        .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        page.on_download(move |download| {
            let tx = tx.clone();
            async move {
                if tx.send(download).is_err() {
                    tracing::warn!("download arrived after the driver was dropped");
                }
                Ok(())
            }
        })
        .await?;

        Ok(Self {
            page,
            dialog_policy,
            downloads: tokio::sync::Mutex::new(rx),
        })
    }

    /// The underlying playwright-rs page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn locator(&self, selector: &str) -> Locator {
        self.page.locator(selector).await
    }
}

fn millis(timeout: Duration) -> f64 {
    timeout.as_millis() as f64
}

/// Attaches the selector to driver errors so timeouts say what they were
/// waiting for.
fn with_selector(selector: &str) -> impl Fn(playwright_rs::Error) -> Error + '_ {
    move |e| Error::from(e).context(format!("selector '{selector}'"))
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        tracing::debug!(url, "goto");
        self.page
            .goto(url, Some(GotoOptions::new().timeout(timeout)))
            .await
            .map_err(|e| Error::from(e).context(format!("navigating to '{url}'")))?;
        Ok(())
    }

    fn current_url(&self) -> String {
        self.page.url()
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<()> {
        let options = ClickOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .click(Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn double_click(&self, selector: &str, timeout: Duration) -> Result<()> {
        let options = ClickOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .dblclick(Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<()> {
        let options = FillOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .fill(value, Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn hover(&self, selector: &str, timeout: Duration) -> Result<()> {
        let options = HoverOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .hover(Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn press(&self, selector: &str, key: &str, timeout: Duration) -> Result<()> {
        let options = PressOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .press(key, Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn select_option(
        &self,
        selector: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        let options = SelectOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .select_option(value, Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn set_checked(&self, selector: &str, checked: bool, timeout: Duration) -> Result<()> {
        let options = CheckOptions::builder().timeout(millis(timeout)).build();
        self.locator(selector)
            .await
            .set_checked(checked, Some(options))
            .await
            .map_err(with_selector(selector))
    }

    async fn set_input_files(&self, selector: &str, files: &[PathBuf]) -> Result<()> {
        let refs: Vec<&PathBuf> = files.iter().collect();
        self.locator(selector)
            .await
            .set_input_files_multiple(&refs, None)
            .await
            .map_err(with_selector(selector))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self.locator(selector).await.is_visible().await?)
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool> {
        Ok(self.locator(selector).await.is_enabled().await?)
    }

    async fn is_checked(&self, selector: &str) -> Result<bool> {
        self.locator(selector)
            .await
            .is_checked()
            .await
            .map_err(with_selector(selector))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.locator(selector).await.count().await?)
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        self.locator(selector)
            .await
            .text_content()
            .await
            .map_err(with_selector(selector))
    }

    async fn get_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        self.locator(selector)
            .await
            .get_attribute(name)
            .await
            .map_err(with_selector(selector))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.page.screenshot_to_file(path, None).await?;
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
        let mut downloads = self.downloads.lock().await;
        // Anything already queued belongs to an earlier click.
        while let Ok(stale) = downloads.try_recv() {
            tracing::debug!(file = stale.suggested_filename(), "discarding stale download");
        }

        self.click(selector, timeout).await?;

        let download = tokio::time::timeout(timeout, downloads.recv())
            .await
            .map_err(|_| Error::timeout(format!("download triggered by '{selector}'"), timeout))?
            .ok_or_else(|| Error::Usage("download channel closed".to_string()))?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let target = dest_dir.join(download.suggested_filename());
        download.save_as(&target).await?;
        tracing::info!(path = %target.display(), "saved download");
        Ok(target)
    }
}
