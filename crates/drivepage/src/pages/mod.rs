// Page objects - One struct per screen of the drive application
//
// Every page object owns an Interactions handle bound to exactly one browser
// page, declares its locators up front in new(), and exposes two layers:
// - atomic actions: a single user gesture (open a menu, type a name)
// - business flows: a user goal composed of atomics (create a folder)
//
// Page objects hold no state shared across instances. Two page objects built
// over the same Interactions observe the same page.

pub mod files;
pub mod login;
pub mod shell;

pub use files::{FilesLocators, FilesPage, FolderDialogState};
pub use login::LoginPage;
pub use shell::AppShell;

use crate::error::Result;
use crate::interaction::Interactions;
use async_trait::async_trait;
use std::fmt;

/// Common surface of every page object.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Path of the page relative to the application's base URL
    fn path(&self) -> &str;

    fn interactions(&self) -> &Interactions;

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Navigates to [`PageObject::path`] and waits until the page is displayed.
    async fn open(&self) -> Result<()> {
        tracing::info!(page = self.page_name(), path = self.path(), "opening page");
        self.interactions().goto(self.path()).await?;
        if self.is_displayed().await {
            Ok(())
        } else {
            Err(crate::Error::Assertion(format!(
                "{} did not render after navigating to '{}'",
                self.page_name(),
                self.path()
            )))
        }
    }

    /// True if the page's landmark element is visible. Never fails.
    async fn is_displayed(&self) -> bool;
}

/// Layout of the content listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Grid,
    List,
    Card,
    /// None of the view controls reports itself active
    Unknown,
}

impl ViewMode {
    /// The selectable modes, in toolbar order.
    pub const ALL: [ViewMode; 3] = [ViewMode::Grid, ViewMode::List, ViewMode::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
            ViewMode::Card => "card",
            ViewMode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sidebar sections of the drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    MyDrive,
    Recent,
    Shared,
    Trash,
}

impl Section {
    /// Accessible name of the sidebar link.
    pub fn label(&self) -> &'static str {
        match self {
            Section::MyDrive => "My Drive",
            Section::Recent => "Recent",
            Section::Shared => "Shared with me",
            Section::Trash => "Trash",
        }
    }
}
