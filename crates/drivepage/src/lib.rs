//! drivepage: Page objects and wait contracts for testing a cloud-drive web app
//!
//! This crate drives the application through a real browser (via
//! [`playwright_rs`]) and turns raw UI elements into reliable business
//! operations: sign in, create folders, upload files, select items, switch
//! view modes.
//!
//! # Layers
//!
//! - [`Driver`]: browser primitives on selector strings
//! - [`Interactions`]: explicit-wait discipline over a driver. Nothing is
//!   clicked, filled or read before it has been waited for.
//! - [`pages`]: one page object per screen, built from [`Locator`]s
//! - [`wait`]: deadline polling and exponential backoff for UI state that has
//!   no direct completion signal
//! - [`session`]: one-time login whose snapshot every test context reuses
//!
//! # Example
//!
//! ```ignore
//! use drivepage::{Harness, HarnessConfig, TestData};
//!
//! #[tokio::main]
//! async fn main() -> drivepage::Result<()> {
//!     let config = HarnessConfig::from_env()?;
//!     let data = TestData::load(&config.paths.test_data)?;
//!     drivepage::session::ensure_session(&config).await?;
//!
//!     let harness = Harness::launch(&config).await?;
//!     let ctx = harness.authenticated_context().await?;
//!     let files = ctx.files(&data);
//!
//!     files.create_folder("Quarterly reports").await?;
//!     assert!(files.item_exists("Quarterly reports").await);
//!
//!     ctx.close().await?;
//!     harness.close().await
//! }
//! ```

pub mod artifacts;
pub mod config;
pub mod driver;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod interaction;
pub mod locator;
pub mod logging;
pub mod pages;
pub mod session;
pub mod testdata;
pub mod wait;

pub use config::{BrowserKind, HarnessConfig, Paths, Timeouts};
pub use driver::{DialogPolicy, Driver, ElementState, PlaywrightDriver};
pub use error::{Error, Result};
pub use harness::{Harness, TestContext};
pub use interaction::Interactions;
pub use locator::Locator;
pub use pages::{AppShell, FilesPage, LoginPage, PageObject, Section, ViewMode};
pub use testdata::TestData;
pub use wait::{Backoff, poll_until, wait_with_backoff};
