//! Bounded exponential backoff for intent execution.
//!
//! Persist, push-channel, and reschedule intents are idempotent, so a failed
//! attempt can be re-issued as-is after a delay.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::constants::{INTENT_MAX_RETRIES, INTENT_MAX_RETRY_DELAY_SECS, INTENT_RETRY_DELAY_MS};

/// Retry tuning for intent execution. Deserializable so hosts can override
/// it from their config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Cap on the backoff delay, in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    INTENT_MAX_RETRIES
}

fn default_initial_delay_ms() -> u64 {
    INTENT_RETRY_DELAY_MS
}

fn default_max_delay_secs() -> u64 {
    INTENT_MAX_RETRY_DELAY_SECS
}

impl RetryPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

/// Run `operation` until it succeeds or the retry budget is exhausted,
/// doubling the delay between attempts up to the policy cap.
///
/// Returns the result of the first successful attempt, or the last error
/// when every attempt fails.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    let mut delay = policy.initial_delay();

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempts += 1;
                if attempts > policy.max_retries {
                    return Err(e);
                }

                tracing::warn!(
                    "intent attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempts,
                    policy.max_retries + 1,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay());
            }
        }
    }
}
