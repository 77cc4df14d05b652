//! Price Feed Synchronizer - Bounded Historical Price Reconstruction
//!
//! Samples the remote aggregator through the chain client to rebuild a
//! bounded, time-ordered price series: one read per historical
//! reference position, stepped back from the current height by a fixed
//! stride. Each read is retried independently; a point that exhausts
//! its retries is simply omitted (a gap), never fabricated, and never
//! aborts the whole refresh.
//!
//! The assembled series replaces the previous one atomically and is
//! published on the notification bus.

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, instrument, warn};

use crate::config::PriceFeedConfig;
use crate::domain::error::ErrorClassification;
use crate::domain::events::CoreEvent;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::chain_client::ChainClient;
use crate::usecases::notifications::NotificationBus;
use crate::usecases::retry::RetryPolicy;

/// Aggregator method returning the current round's answer.
const METHOD_LATEST_ROUND: &str = "latestRoundData";
/// Aggregator method declaring the answer's fixed-point precision.
const METHOD_DECIMALS: &str = "decimals";

/// Reconstructs and owns the session's price series.
pub struct PriceFeedSynchronizer<C: ChainClient> {
  /// Ledger access port.
  chain: Arc<C>,
  /// Shared retry/rate policy.
  retry: Arc<RetryPolicy>,
  /// Observer surface for series replacements.
  bus: NotificationBus,
  /// Sampling parameters.
  config: PriceFeedConfig,
  /// Aggregator precision, queried once and cached for the session.
  precision: OnceCell<u32>,
  /// Current series, replaced atomically on each refresh.
  series: RwLock<PriceSeries>,
}

impl<C: ChainClient> PriceFeedSynchronizer<C> {
  /// Create a synchronizer over a chain client and shared policy.
  pub fn new(
    chain: Arc<C>,
    retry: Arc<RetryPolicy>,
    bus: NotificationBus,
    config: PriceFeedConfig,
  ) -> Self {
    let window = config.window_size;
    Self {
      chain,
      retry,
      bus,
      config,
      precision: OnceCell::new(),
      series: RwLock::new(PriceSeries::new(window)),
    }
  }

  /// Current price at the latest reference position.
  pub async fn latest(&self) -> Result<PricePoint, ErrorClassification> {
    let precision = self.precision().await?;
    let position = self
      .retry
      .execute("current_height", || self.chain.current_height())
      .await?;
    let raw = self
      .retry
      .execute(METHOD_LATEST_ROUND, || {
        self.chain.call_read(METHOD_LATEST_ROUND, Value::Null)
      })
      .await?;
    let value = normalize(&raw, precision)?;
    Ok(PricePoint {
      position,
      timestamp: Utc::now(),
      value,
    })
  }

  /// Refresh the series using the configured window and stride.
  pub async fn refresh(&self) -> Result<PriceSeries, ErrorClassification> {
    self
      .history(self.config.window_size, self.config.stride)
      .await
  }

  /// Rebuild the series from `window` positions stepped back from the
  /// current height by `stride`, replace the stored series atomically,
  /// and publish it.
  #[instrument(skip(self))]
  pub async fn history(
    &self,
    window: usize,
    stride: u64,
  ) -> Result<PriceSeries, ErrorClassification> {
    let precision = self.precision().await?;
    let head = self
      .retry
      .execute("current_height", || self.chain.current_height())
      .await?;

    // Positions saturate at genesis; duplicates collapse in assembly.
    let positions: Vec<u64> = (0..window as u64)
      .map(|i| head.saturating_sub(i * stride))
      .collect();

    let samples: Vec<(u64, Result<Value, ErrorClassification>)> = stream::iter(positions)
      .map(|position| {
        let chain = Arc::clone(&self.chain);
        let retry = Arc::clone(&self.retry);
        async move {
          let outcome = retry
            .execute("read_at", || {
              chain.read_at(METHOD_LATEST_ROUND, Value::Null, position)
            })
            .await;
          (position, outcome)
        }
      })
      .buffer_unordered(self.config.max_concurrent_reads)
      .collect()
      .await;

    let mut points = Vec::with_capacity(window);
    for (position, outcome) in samples {
      match outcome {
        Ok(raw) => match normalize(&raw, precision) {
          Ok(value) => points.push(PricePoint {
            position,
            timestamp: Utc::now(),
            value,
          }),
          Err(classified) => {
            warn!(position, reason = %classified.reason(), "Unusable sample, leaving a gap");
          }
        },
        Err(classified) => {
          warn!(position, kind = ?classified.kind, "Historical read failed, leaving a gap");
        }
      }
    }

    let series = PriceSeries::from_points(window, points);
    {
      *self.series.write().await = series.clone();
    }
    self.bus.publish(CoreEvent::Price {
      series: series.clone(),
    });
    info!(points = series.len(), window, stride, "Price series refreshed");
    Ok(series)
  }

  /// Snapshot of the current series.
  pub async fn current_series(&self) -> PriceSeries {
    self.series.read().await.clone()
  }

  /// Aggregator precision, fetched once per session.
  ///
  /// The aggregator's declared precision is not expected to change,
  /// so concurrent first callers race to a single cached init.
  async fn precision(&self) -> Result<u32, ErrorClassification> {
    self
      .precision
      .get_or_try_init(|| async {
        let raw = self
          .retry
          .execute(METHOD_DECIMALS, || {
            self.chain.call_read(METHOD_DECIMALS, Value::Null)
          })
          .await?;
        decode_uint(&raw)
          .map(|v| v as u32)
          .ok_or_else(|| {
            ErrorClassification::unknown(format!("malformed aggregator precision: {raw}"))
          })
      })
      .await
      .copied()
  }
}

/// Decode an aggregator answer and scale it by the declared precision.
fn normalize(raw: &Value, precision: u32) -> Result<Decimal, ErrorClassification> {
  let answer = decode_answer(raw)
    .ok_or_else(|| ErrorClassification::unknown(format!("malformed aggregator answer: {raw}")))?;
  Decimal::try_from_i128_with_scale(answer, precision)
    .map_err(|e| ErrorClassification::unknown(format!("answer {answer} out of range: {e}")))
}

/// Accept an unsigned value as a JSON number or a decimal/hex string.
fn decode_uint(value: &Value) -> Option<u64> {
  match value {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => {
      let s = s.trim();
      match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
      }
    }
    _ => None,
  }
}

/// Accept a signed answer as a JSON number or a decimal/hex string.
fn decode_answer(value: &Value) -> Option<i128> {
  match value {
    Value::Number(n) => n.as_i64().map(i128::from),
    Value::String(s) => {
      let s = s.trim();
      match s.strip_prefix("0x") {
        Some(hex) => i128::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
      }
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use rust_decimal_macros::dec;
  use serde_json::json;

  use super::*;
  use crate::config::{RateLimitConfig, RetryConfig};
  use crate::domain::error::ProviderFailure;
  use crate::ports::chain_client::{Account, SettlementStatus};

  /// Aggregator stub: 8-decimal feed at height 1000, every answer
  /// `1.01` except position 600, which always reverts.
  struct StubAggregator;

  #[async_trait]
  impl ChainClient for StubAggregator {
    async fn connect(&self) -> Result<Account, ProviderFailure> {
      Ok(Account {
        address: "0xabc".into(),
        chain_id: 137,
      })
    }

    async fn call_read(&self, method: &str, _args: Value) -> Result<Value, ProviderFailure> {
      match method {
        METHOD_DECIMALS => Ok(json!(8)),
        _ => Ok(json!("101000000")),
      }
    }

    async fn call_write(&self, _method: &str, _args: Value) -> Result<String, ProviderFailure> {
      Err(ProviderFailure::message("read-only stub"))
    }

    async fn await_settlement(
      &self,
      _correlation_id: &str,
    ) -> Result<SettlementStatus, ProviderFailure> {
      Err(ProviderFailure::message("read-only stub"))
    }

    async fn current_height(&self) -> Result<u64, ProviderFailure> {
      Ok(1_000)
    }

    async fn read_at(
      &self,
      _method: &str,
      _args: Value,
      position: u64,
    ) -> Result<Value, ProviderFailure> {
      if position == 600 {
        Err(ProviderFailure::message("execution reverted"))
      } else {
        Ok(json!("101000000"))
      }
    }
  }

  fn synchronizer(window: usize) -> PriceFeedSynchronizer<StubAggregator> {
    let retry = Arc::new(RetryPolicy::new(
      &RetryConfig {
        max_attempts: 2,
        retry_delay_ms: 1,
        call_timeout_ms: 1_000,
      },
      &RateLimitConfig {
        max_calls_per_second: 1_000,
        max_calls_per_minute: 10_000,
      },
    ));
    PriceFeedSynchronizer::new(
      Arc::new(StubAggregator),
      retry,
      NotificationBus::new(16),
      PriceFeedConfig {
        window_size: window,
        stride: 100,
        refresh_interval_seconds: 60,
        max_concurrent_reads: 4,
      },
    )
  }

  #[tokio::test]
  async fn test_latest_normalizes_by_precision() {
    let sync = synchronizer(5);
    let point = sync.latest().await.unwrap();
    assert_eq!(point.position, 1_000);
    assert_eq!(point.value, dec!(1.01));
  }

  #[tokio::test]
  async fn test_history_omits_failed_position() {
    let sync = synchronizer(5);
    // Positions 1000, 900, 800, 700, 600 — 600 always fails.
    let series = sync.history(5, 100).await.unwrap();
    assert_eq!(series.len(), 4);
    let positions: Vec<u64> = series.points().iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![700, 800, 900, 1_000]);
  }

  #[tokio::test]
  async fn test_refresh_replaces_stored_series() {
    let sync = synchronizer(3);
    assert!(sync.current_series().await.is_empty());
    sync.refresh().await.unwrap();
    let series = sync.current_series().await;
    assert_eq!(series.len(), 3);
  }

  #[test]
  fn test_decode_answer_accepts_number_and_strings() {
    assert_eq!(decode_answer(&json!(42)), Some(42));
    assert_eq!(decode_answer(&json!("101000000")), Some(101_000_000));
    assert_eq!(decode_answer(&json!("0x64")), Some(100));
    assert_eq!(decode_answer(&json!(null)), None);
    assert_eq!(decode_answer(&json!("not a number")), None);
  }

  #[test]
  fn test_decode_uint() {
    assert_eq!(decode_uint(&json!(8)), Some(8));
    assert_eq!(decode_uint(&json!("18")), Some(18));
    assert_eq!(decode_uint(&json!("0x12")), Some(18));
    assert_eq!(decode_uint(&json!(-1)), None);
  }

  #[test]
  fn test_normalize_scales_answer() {
    assert_eq!(normalize(&json!("250000000"), 8).unwrap(), dec!(2.5));
  }
}
