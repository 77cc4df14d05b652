//! Chain Client Port - Remote Ledger Interface
//!
//! Defines the trait through which the core reaches the remote ledger:
//! read calls, state-changing calls, block-height queries, historical
//! reads, and network identification. Backed by alloy-rs in production.
//!
//! Every method is asynchronous and may fail with a raw, provider-specific
//! [`ProviderFailure`]. Callers never interpret those ad hoc — failures
//! go through the classifier in `domain::error`.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::error::ProviderFailure;

/// Identity of the calling party for a session.
///
/// Immutable once set; replaced wholesale on reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
  /// Account address on the ledger.
  pub address: String,
  /// Numeric chain identifier.
  pub chain_id: u64,
}

/// Final outcome of a submitted operation on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementStatus {
  /// The operation settled successfully.
  Confirmed,
  /// The ledger finalized the operation as failed; the revert reason
  /// is preserved verbatim when the node surfaced one.
  Reverted(String),
}

/// Trait for remote ledger access.
///
/// `call_write` returns as soon as the remote node accepts the call,
/// before settlement; `await_settlement` suspends until the ledger
/// finalizes the operation. A write accepted by the node cannot be
/// cancelled from this side.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// Establish the session identity, validating the connected chain.
  async fn connect(&self) -> Result<Account, ProviderFailure>;

  /// Read-only contract call at the current state.
  async fn call_read(&self, method: &str, args: Value) -> Result<Value, ProviderFailure>;

  /// State-changing contract call. Returns the ledger-assigned
  /// correlation id once the call is accepted.
  async fn call_write(&self, method: &str, args: Value) -> Result<String, ProviderFailure>;

  /// Suspend until the ledger finalizes the identified operation.
  async fn await_settlement(
    &self,
    correlation_id: &str,
  ) -> Result<SettlementStatus, ProviderFailure>;

  /// Current reference position (block height).
  async fn current_height(&self) -> Result<u64, ProviderFailure>;

  /// Read-only contract call against a historical reference position.
  async fn read_at(
    &self,
    method: &str,
    args: Value,
    position: u64,
  ) -> Result<Value, ProviderFailure>;
}
