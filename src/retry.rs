// src/retry.rs
//! Generic retry combinator shared by the config resolver and the remote
//! ranking/summarization call sites.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// Delay grows with the attempt number: `base * attempt`.
    Linear(Duration),
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Crate-wide default: 3 attempts with 1s linear backoff.
    pub fn linear_default() -> Self {
        Self::new(3, Backoff::Linear(Duration::from_secs(1)))
    }

    pub fn no_retry() -> Self {
        Self::new(1, Backoff::None)
    }

    /// Delay to sleep after `attempt` (1-based) has failed, or `None` once
    /// the budget is exhausted.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Linear(base) => base * attempt,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear_default()
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping between attempts.
/// The last error is returned once the budget is exhausted.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match policy.delay_after(attempt) {
                Some(delay) => {
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                None => return Err(e),
            },
        }
    }
}
