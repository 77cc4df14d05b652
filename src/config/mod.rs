//! Configuration Module - TOML-based Session Configuration
//!
//! Loads and validates configuration from `config.toml`. All contract
//! addresses, rate ceilings, and sampling parameters are externalized
//! here - nothing is hardcoded in the domain layer.

pub mod loader;

use serde::Deserialize;

/// Top-level session configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the core begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Session identity and logging.
  pub session: SessionConfig,
  /// Ledger endpoint and contract addresses.
  pub chain: ChainConfig,
  /// Shared call-rate ceilings.
  pub rate_limits: RateLimitConfig,
  /// Retry policy parameters.
  pub retry: RetryConfig,
  /// Historical price sampling parameters.
  pub price_feed: PriceFeedConfig,
}

/// Session identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
  /// Human-readable session name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Notification bus channel capacity.
  #[serde(default = "default_bus_capacity")]
  pub bus_capacity: usize,
}

/// Ledger endpoint configuration.
///
/// Contract addresses are ALWAYS in config - never hardcoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint URL.
  pub rpc_url: String,
  /// Chain ids the session may connect to.
  #[serde(default = "default_supported_chains")]
  pub supported_chain_ids: Vec<u64>,
  /// Synthetic-token controller contract address.
  pub master_control: String,
  /// Price aggregator contract address.
  pub aggregator: String,
  /// Token decimals for amount encoding.
  #[serde(default = "default_token_decimals")]
  pub token_decimals: u32,
  /// Settlement receipt poll interval (milliseconds).
  #[serde(default = "default_settlement_poll")]
  pub settlement_poll_ms: u64,
}

/// Shared call-rate ceilings, enforced across all outbound ledger calls.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
  /// Maximum outbound calls per second.
  #[serde(default = "default_calls_per_second")]
  pub max_calls_per_second: u32,
  /// Maximum outbound calls per minute.
  #[serde(default = "default_calls_per_minute")]
  pub max_calls_per_minute: u32,
}

/// Retry policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
  /// Maximum attempts for a single logical call.
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Fixed delay between attempts (milliseconds).
  #[serde(default = "default_retry_delay")]
  pub retry_delay_ms: u64,
  /// Per-call timeout (milliseconds).
  #[serde(default = "default_call_timeout")]
  pub call_timeout_ms: u64,
}

/// Historical price sampling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeedConfig {
  /// Number of historical points per refresh.
  #[serde(default = "default_window_size")]
  pub window_size: usize,
  /// Backward step between reference positions (blocks).
  #[serde(default = "default_stride")]
  pub stride: u64,
  /// Interval between automatic refreshes (seconds).
  #[serde(default = "default_refresh_interval")]
  pub refresh_interval_seconds: u64,
  /// Maximum historical reads in flight at once.
  #[serde(default = "default_max_concurrent_reads")]
  pub max_concurrent_reads: usize,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bus_capacity() -> usize {
  256
}

fn default_supported_chains() -> Vec<u64> {
  vec![137]
}

fn default_token_decimals() -> u32 {
  18
}

fn default_settlement_poll() -> u64 {
  2_000
}

fn default_calls_per_second() -> u32 {
  5
}

fn default_calls_per_minute() -> u32 {
  250
}

fn default_max_attempts() -> u32 {
  3
}

fn default_retry_delay() -> u64 {
  1_000
}

fn default_call_timeout() -> u64 {
  30_000
}

fn default_window_size() -> usize {
  24
}

fn default_stride() -> u64 {
  100
}

fn default_refresh_interval() -> u64 {
  60
}

fn default_max_concurrent_reads() -> usize {
  4
}
