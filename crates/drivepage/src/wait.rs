// Wait helpers - Deadline polling and exponential backoff
//
// Two primitives for UI state that offers no direct "done" signal:
// - poll_until: fixed-interval polling bounded by a deadline (the loop shape
//   Playwright's expect() assertions use)
// - Backoff / wait_with_backoff: bounded attempts with exponentially growing
//   delays, for slow server-side work such as upload processing
//
// Conditions may be evaluated many times. They must be side-effect free when
// they return false.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default polling interval for deadline waits (100ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls `condition` every `interval` until it returns `true` or `timeout`
/// elapses.
///
/// The condition is always evaluated at least once, and once more right at the
/// deadline, so a zero timeout still performs a single check. Errors returned
/// by the condition are propagated immediately.
pub async fn poll_until<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut condition: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();

    loop {
        if condition().await? {
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!(what, ?timeout, "wait timed out");
            return Err(Error::timeout(what, timeout));
        }

        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}

/// Exponential backoff policy.
///
/// The delay before attempt `i` (0-based) is `base_delay * 2^i`, optionally
/// capped by `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Option<Duration>,
    description: String,
}

impl Backoff {
    /// Creates a policy with the given attempt budget and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: None,
            description: "condition".to_string(),
        }
    }

    /// Caps every individual delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Names the awaited state in logs and in [`Error::RetryExhausted`].
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay slept before the given 0-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Evaluates `condition` until it returns `true`, sleeping before every
    /// attempt.
    ///
    /// Returns the number of attempts used. After `max_attempts` false results
    /// no further attempt is made and [`Error::RetryExhausted`] is returned.
    pub async fn retry<F, Fut>(&self, mut condition: F) -> Result<u32>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        if self.max_attempts == 0 {
            return Err(Error::Usage(format!(
                "backoff for '{}' needs at least one attempt",
                self.description
            )));
        }

        for attempt in 0..self.max_attempts {
            let delay = self.delay_for(attempt);
            tokio::time::sleep(delay).await;

            if condition().await? {
                tracing::debug!(
                    what = %self.description,
                    attempts = attempt + 1,
                    "backoff condition met"
                );
                return Ok(attempt + 1);
            }

            tracing::debug!(
                what = %self.description,
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                ?delay,
                "backoff condition not met yet"
            );
        }

        Err(Error::RetryExhausted {
            what: self.description.clone(),
            attempts: self.max_attempts,
        })
    }
}

/// Repeatedly evaluates `condition` with exponential backoff.
///
/// Shorthand for `Backoff::new(max_attempts, base_delay).retry(condition)`.
pub async fn wait_with_backoff<F, Fut>(
    condition: F,
    max_attempts: u32,
    base_delay: Duration,
) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    Backoff::new(max_attempts, base_delay).retry(condition).await
}
