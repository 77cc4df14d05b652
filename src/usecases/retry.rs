//! Retry Policy - Rate-limited Retry Execution for Ledger Calls
//!
//! Every outbound ledger call goes through [`RetryPolicy::execute`]:
//! one token is acquired from the shared rate budget (suspending when
//! exhausted, never erroring), the call runs under the configured
//! timeout, and transient failures are retried with a fixed delay.
//!
//! Non-transient failures (user rejection, insufficient funds) fail
//! immediately. Exhausting retries surfaces the last classification,
//! never a generic error.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::{RateLimitConfig, RetryConfig};
use crate::domain::error::{ErrorClassification, ProviderFailure};

/// Centralized retry and rate-limit policy.
///
/// Shared (via `Arc`) by the transaction coordinator and the price
/// feed synchronizer so the per-second/per-minute ceilings bound the
/// aggregate call rate regardless of how many tasks are active.
pub struct RetryPolicy {
  /// Per-second call budget.
  per_second: DefaultDirectRateLimiter,
  /// Per-minute call budget.
  per_minute: DefaultDirectRateLimiter,
  /// Maximum attempts for a single logical call.
  max_attempts: u32,
  /// Fixed delay between attempts.
  retry_delay: Duration,
  /// Per-call timeout.
  call_timeout: Duration,
}

impl RetryPolicy {
  /// Build a policy from the retry and rate-limit configuration.
  pub fn new(retry: &RetryConfig, rate: &RateLimitConfig) -> Self {
    let per_second = nonzero(rate.max_calls_per_second);
    let per_minute = nonzero(rate.max_calls_per_minute);
    Self {
      per_second: RateLimiter::direct(Quota::per_second(per_second)),
      per_minute: RateLimiter::direct(Quota::per_minute(per_minute)),
      max_attempts: retry.max_attempts.max(1),
      retry_delay: Duration::from_millis(retry.retry_delay_ms),
      call_timeout: Duration::from_millis(retry.call_timeout_ms),
    }
  }

  /// Execute one logical ledger call under the policy.
  ///
  /// The operation closure is re-invoked on each attempt. Timeouts
  /// classify as `Timeout` and take the transient-retry path; any
  /// other failure is classified first and retried only when the
  /// kind is transient.
  pub async fn execute<T, F, Fut>(
    &self,
    label: &str,
    mut op: F,
  ) -> Result<T, ErrorClassification>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderFailure>>,
  {
    let mut last: Option<ErrorClassification> = None;

    for attempt in 1..=self.max_attempts {
      if attempt > 1 {
        debug!(label, attempt, delay_ms = self.retry_delay.as_millis() as u64, "Retrying call");
        sleep(self.retry_delay).await;
      }

      self.acquire().await;

      match timeout(self.call_timeout, op()).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(failure)) => {
          let classified = ErrorClassification::classify(&failure);
          if !classified.kind.is_transient() {
            warn!(label, kind = ?classified.kind, "Call failed, not retryable");
            return Err(classified);
          }
          warn!(label, attempt, kind = ?classified.kind, error = %failure, "Transient call failure");
          last = Some(classified);
        }
        Err(_elapsed) => {
          warn!(label, attempt, timeout_ms = self.call_timeout.as_millis() as u64, "Call timed out");
          last = Some(ErrorClassification::timeout(format!(
            "{label} timed out after {}ms",
            self.call_timeout.as_millis()
          )));
        }
      }
    }

    Err(last.unwrap_or_else(|| {
      ErrorClassification::unknown(format!("{label} exhausted retries without a failure"))
    }))
  }

  /// Acquire one token from each shared budget, suspending until both
  /// ceilings admit the call. Tokens never go negative; callers wait.
  async fn acquire(&self) {
    self.per_second.until_ready().await;
    self.per_minute.until_ready().await;
  }

  /// Configured attempt cap (for diagnostics and tests).
  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }
}

fn nonzero(value: u32) -> NonZeroU32 {
  NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}
