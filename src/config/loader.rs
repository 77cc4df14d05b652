//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    session = %config.session.name,
    chains = ?config.chain.supported_chain_ids,
    window = config.price_feed.window_size,
    stride = config.price_feed.stride,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty endpoint and contract addresses
/// - Positive rate ceilings and retry counts
/// - Sensible sampling window and stride
fn validate_config(config: &AppConfig) -> Result<()> {
  // Chain validation
  anyhow::ensure!(
    !config.chain.rpc_url.is_empty(),
    "RPC endpoint URL must not be empty"
  );
  anyhow::ensure!(
    !config.chain.master_control.is_empty(),
    "master_control contract address must not be empty"
  );
  anyhow::ensure!(
    !config.chain.aggregator.is_empty(),
    "aggregator contract address must not be empty"
  );
  anyhow::ensure!(
    !config.chain.supported_chain_ids.is_empty(),
    "At least one supported chain id must be configured"
  );
  anyhow::ensure!(
    config.chain.token_decimals <= 27,
    "token_decimals must be at most 27, got {}",
    config.chain.token_decimals
  );
  anyhow::ensure!(
    config.chain.settlement_poll_ms > 0,
    "settlement_poll_ms must be positive"
  );

  // Rate limit validation
  anyhow::ensure!(
    config.rate_limits.max_calls_per_second > 0,
    "max_calls_per_second must be positive"
  );
  anyhow::ensure!(
    config.rate_limits.max_calls_per_minute >= config.rate_limits.max_calls_per_second,
    "max_calls_per_minute ({}) must be at least max_calls_per_second ({})",
    config.rate_limits.max_calls_per_minute,
    config.rate_limits.max_calls_per_second
  );

  // Retry validation
  anyhow::ensure!(
    config.retry.max_attempts > 0,
    "retry max_attempts must be positive"
  );
  anyhow::ensure!(
    config.retry.call_timeout_ms > 0,
    "call_timeout_ms must be positive"
  );

  // Price feed validation
  anyhow::ensure!(
    config.price_feed.window_size > 0,
    "price_feed window_size must be positive"
  );
  anyhow::ensure!(
    config.price_feed.stride > 0,
    "price_feed stride must be positive"
  );
  anyhow::ensure!(
    config.price_feed.max_concurrent_reads > 0,
    "price_feed max_concurrent_reads must be positive"
  );

  // Session validation
  anyhow::ensure!(
    config.session.bus_capacity > 0,
    "bus_capacity must be positive"
  );

  Ok(())
}
