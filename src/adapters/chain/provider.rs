//! Ledger RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the JSON-RPC connection to the remote ledger via alloy-rs.
//! Validates connectivity and chain id at startup and exposes a shared
//! provider instance for all on-chain operations.
//!
//! In alloy 0.9, `ProviderBuilder::new().on_http()` returns a complex
//! filler type. We store it as a type-erased `dyn Provider` to keep
//! the API clean across the adapter layer.

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ChainConfig;

/// Shared ledger RPC provider backed by alloy-rs 0.9.
///
/// All chain adapters share a single provider instance to avoid
/// redundant connections and enable connection pooling.
pub struct EvmProvider {
  /// The alloy HTTP provider connected to the ledger RPC (type-erased).
  provider: Arc<dyn Provider + Send + Sync>,
  /// Chain id reported by the node at startup.
  chain_id: u64,
}

impl EvmProvider {
  /// Connect to the ledger RPC and validate the chain id.
  ///
  /// Reads the RPC URL from config (never hardcoded) and refuses to
  /// start against a chain outside the configured supported set.
  #[instrument(skip_all)]
  pub async fn connect(config: &ChainConfig) -> Result<Self> {
    // alloy 0.9: on_http() is synchronous, returns impl Provider
    let provider = ProviderBuilder::new()
      .on_http(config.rpc_url.parse().context("Invalid RPC URL")?)
      .boxed();

    // Wrap in Arc<dyn Provider> for type erasure
    let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

    let chain_id = provider
      .get_chain_id()
      .await
      .context("Failed to query chain ID")?;

    if !config.supported_chain_ids.contains(&chain_id) {
      anyhow::bail!(
        "Chain {chain_id} is not supported (expected one of {:?})",
        config.supported_chain_ids
      );
    }

    info!(chain_id, "Connected to ledger RPC");

    Ok(Self { provider, chain_id })
  }

  /// Get a shared reference to the alloy provider (type-erased).
  pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
    Arc::clone(&self.provider)
  }

  /// Chain id validated at startup.
  pub fn chain_id(&self) -> u64 {
    self.chain_id
  }

  /// Check if the RPC connection is healthy via a lightweight call.
  pub async fn is_healthy(&self) -> bool {
    self.provider.get_block_number().await.is_ok()
  }
}
