//! Retry Policy
//!
//! Retries transient provider failures (rate limits, timeouts, connection
//! errors, 5xx) with exponential backoff and jitter. Permanent failures
//! (authentication, exhausted quota, malformed requests) are returned on the
//! first attempt.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::provider::LlmProvider;
use crate::types::{LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message};

/// Backoff configuration for LLM calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound for any single wait, including `retry_after` hints.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Randomization factor applied to every interval (0.0 disables jitter).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.5
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }

    fn intervals(&self) -> backoff::ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_delay_ms))
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.jitter.clamp(0.0, 1.0))
            .with_max_interval(self.max_delay())
            .with_max_elapsed_time(None)
            .build()
    }

    /// Wait before the next attempt: the backoff interval, raised to the
    /// provider's `retry_after` hint, capped at `max_delay`.
    fn delay_for(&self, err: &LlmError, interval: Duration) -> Duration {
        let hinted = err
            .retry_after_secs()
            .map(|secs| Duration::from_secs(u64::from(secs)))
            .unwrap_or_default();
        interval.max(hinted).min(self.max_delay())
    }
}

/// Run `op` until it succeeds, fails permanently, or the attempt cap is hit.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, op: F) -> LlmResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = LlmResult<T>>,
{
    with_retry_until(policy, label, None, op).await
}

/// Like [`with_retry`], but returns the last error instead of sleeping past
/// `deadline`.
pub async fn with_retry_until<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    deadline: Option<Instant>,
    mut op: F,
) -> LlmResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = LlmResult<T>>,
{
    let mut intervals = policy.intervals();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_attempts {
                    return Err(err);
                }

                let interval = intervals.next_backoff().unwrap_or_else(|| policy.max_delay());
                let wait = policy.delay_for(&err, interval);

                if deadline.is_some_and(|d| Instant::now() + wait >= d) {
                    tracing::warn!(
                        call = label,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "with_retry: next wait passes the deadline, giving up"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    call = label,
                    attempt,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "with_retry: transient error, backing off"
                );

                tokio::time::sleep(wait).await;
            }
        }
    }
}

/// Send one system + user prompt pair and return the response text, retrying
/// transient failures per `policy`.
pub async fn complete_text(
    provider: &dyn LlmProvider,
    system: &str,
    user: &str,
    options: LlmRequestOptions,
    policy: &RetryPolicy,
) -> LlmResult<String> {
    complete_text_until(provider, system, user, options, policy, None).await
}

/// [`complete_text`] that stops retrying once the next wait would pass `deadline`.
pub async fn complete_text_until(
    provider: &dyn LlmProvider,
    system: &str,
    user: &str,
    options: LlmRequestOptions,
    policy: &RetryPolicy,
    deadline: Option<Instant>,
) -> LlmResult<String> {
    let response: LlmResponse = with_retry_until(policy, provider.name(), deadline, || {
        provider.send_message(
            vec![Message::user(user)],
            Some(system.to_string()),
            options.clone(),
        )
    })
    .await?;

    response.text().map(str::to_string)
}
