// Error types for drivepage
//
// One taxonomy for the whole harness: configuration problems are fatal before
// any test runs, timeouts and assertion failures fail exactly one test, and
// authentication failures abort the suite.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for drivepage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum Error {
    /// Required environment variables are absent
    ///
    /// All missing names are collected before failing so a single run reports
    /// every variable that needs to be set.
    #[error(
        "Missing required environment variables: {}. Set them in the environment before running the suite.",
        names.join(", ")
    )]
    MissingConfig { names: Vec<String> },

    /// An environment variable is present but cannot be parsed
    #[error("Invalid value for {name}: {message}")]
    InvalidConfig { name: String, message: String },

    /// The test data file failed to load or did not match the schema
    #[error("Invalid test data in '{path}': {message}")]
    TestData { path: String, message: String },

    /// An expected element or state did not appear in time
    ///
    /// Includes what was being waited for (usually a selector) and the window.
    #[error("Timeout after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    /// Backoff polling gave up after the configured number of attempts
    #[error("Condition '{what}' still false after {attempts} attempts")]
    RetryExhausted { what: String, attempts: u32 },

    /// Login did not reach the expected landing state
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// An expected UI state did not match
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// The harness API was used in a way its contract forbids
    #[error("Usage error: {0}")]
    Usage(String),

    /// No persisted session snapshot exists where one was expected
    #[error("Session snapshot not found at '{0}'. Run `cargo xtask setup` to create it.")]
    SessionMissing(String),

    /// Error reported by the underlying browser driver
    #[error("Driver error: {0}")]
    Driver(#[from] playwright_rs::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// Shorthand for a [`Error::Timeout`]
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Error::Timeout {
            what: what.into(),
            timeout,
        }
    }

    /// Returns true if this error (or the error it wraps) is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Driver(playwright_rs::Error::Timeout(_))
            | Error::Driver(playwright_rs::Error::NavigationTimeout { .. }) => true,
            Error::Context(_, inner) => inner.is_timeout(),
            _ => false,
        }
    }
}
