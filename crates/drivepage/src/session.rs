// Session - One-time login and the persisted snapshot every test reuses
//
// Lifecycle of the snapshot file:
// - written once, by bootstrap, before any test context exists
// - read by every authenticated context for the rest of the run
// - discarded only between suite invocations (xtask test)
//
// Writes go to a sibling temp file and are renamed into place, so a reader
// never observes a half-written snapshot.

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::harness::Harness;
use crate::interaction::url_path;
use crate::pages::PageObject;
use playwright_rs::StorageState;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// URL path the application lands on after a successful sign-in.
///
/// Matched against the path only, never the host or query string.
pub const LANDING_PATH_PATTERN: &str = "^/(dashboard|drive|home)(/|$)";

pub fn landing_pattern() -> Result<Regex> {
    Ok(Regex::new(LANDING_PATH_PATTERN)?)
}

/// True if `url` is a post-sign-in page.
pub fn is_landing_url(url: &str) -> bool {
    match (landing_pattern(), url_path(url)) {
        (Ok(pattern), Some(path)) => pattern.is_match(&path),
        _ => false,
    }
}

/// Persisted cookies and per-origin storage at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes the snapshot atomically, creating parent directories.
    pub async fn save(&self, state: &StorageState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::info!(
            path = %self.path.display(),
            cookies = state.cookies.len(),
            origins = state.origins.len(),
            "saved session snapshot"
        );
        Ok(())
    }

    pub async fn load(&self) -> Result<StorageState> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SessionMissing(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| {
            Error::from(e).context(format!("parsing session snapshot '{}'", self.path.display()))
        })
    }

    /// Removes the snapshot. Succeeds if there is none.
    pub async fn discard(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "discarded session snapshot");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

/// Signs in through the login form and persists the resulting session.
///
/// Runs against a fresh, unauthenticated context. Returns the snapshot path.
pub async fn bootstrap(config: &HarnessConfig) -> Result<PathBuf> {
    tracing::info!(base_url = %config.base_url, "bootstrapping session");
    let harness = Harness::launch(config).await?;
    let outcome = sign_in_and_save(&harness, config).await;
    let closed = harness.close().await;
    let path = outcome?;
    closed?;
    Ok(path)
}

async fn sign_in_and_save(harness: &Harness, config: &HarnessConfig) -> Result<PathBuf> {
    let context = harness.anonymous_context().await?;
    let login = context.login_page();
    login.open().await?;
    login
        .login_and_wait(&config.user_email, &config.user_password, &landing_pattern()?)
        .await?;

    let state = context.browser_context().storage_state().await?;
    let store = SessionStore::new(&config.paths.session_state);
    store.save(&state).await?;
    context.close().await?;
    Ok(store.path().to_path_buf())
}

static SESSION: OnceCell<PathBuf> = OnceCell::const_new();

/// Makes sure a snapshot exists, bootstrapping at most once per process.
///
/// An existing snapshot is reused as is.
pub async fn ensure_session(config: &HarnessConfig) -> Result<PathBuf> {
    let path = SESSION
        .get_or_try_init(|| async {
            let store = SessionStore::new(&config.paths.session_state);
            if store.exists() {
                tracing::debug!(path = %store.path().display(), "reusing session snapshot");
                return Ok(store.path().to_path_buf());
            }
            bootstrap(config).await
        })
        .await?;
    Ok(path.clone())
}
