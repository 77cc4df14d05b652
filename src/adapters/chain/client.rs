//! EVM Chain Client - `ChainClient` Port over alloy-rs 0.9
//!
//! Implements the ledger port against an EVM JSON-RPC node:
//! - reads hit the price aggregator contract (current or historical block)
//! - writes hit the synthetic-token controller, signed by the node's
//!   unlocked account (the wallet, in dashboard deployments)
//! - settlement is observed by polling the transaction receipt
//!
//! Calldata is built by hand (4-byte keccak selector + padded words);
//! the two contracts expose a small, fixed surface, so a full ABI
//! layer would be overkill. All failures cross the boundary as raw
//! [`ProviderFailure`]s with the JSON-RPC error code preserved.

use std::sync::Arc;
use std::time::Duration;

use alloy::eips::BlockId;
use alloy::primitives::{keccak256, Address, Bytes, B256, I256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::config::ChainConfig;
use crate::domain::error::ProviderFailure;
use crate::ports::chain_client::{Account, ChainClient, SettlementStatus};

use super::provider::EvmProvider;

/// `ChainClient` implementation over a shared alloy provider.
pub struct EvmChainClient {
  /// Shared RPC provider.
  provider: Arc<EvmProvider>,
  /// Chain configuration (decimals, poll interval, supported chains).
  config: ChainConfig,
  /// Synthetic-token controller contract.
  master_control: Address,
  /// Price aggregator contract.
  aggregator: Address,
  /// Session account, set by `connect`.
  account: RwLock<Option<Account>>,
}

impl EvmChainClient {
  /// Build a client, parsing the configured contract addresses.
  pub fn new(provider: Arc<EvmProvider>, config: ChainConfig) -> Result<Self> {
    let master_control: Address = config
      .master_control
      .parse()
      .context("Invalid master_control address")?;
    let aggregator: Address = config
      .aggregator
      .parse()
      .context("Invalid aggregator address")?;

    Ok(Self {
      provider,
      config,
      master_control,
      aggregator,
      account: RwLock::new(None),
    })
  }

  /// Read-only aggregator call, optionally pinned to a past block.
  async fn read_call(
    &self,
    method: &str,
    position: Option<u64>,
  ) -> Result<Value, ProviderFailure> {
    let calldata = encode_no_args(method);
    let request = TransactionRequest::default()
      .to(self.aggregator)
      .input(calldata.into());

    let inner = self.provider.inner();
    let call = inner.call(&request);
    let result = match position {
      Some(position) => call.block(BlockId::number(position)).await,
      None => call.await,
    }
    .map_err(to_failure)?;

    decode_read(method, &result)
  }
}

#[async_trait]
impl ChainClient for EvmChainClient {
  #[instrument(skip(self))]
  async fn connect(&self) -> Result<Account, ProviderFailure> {
    let inner = self.provider.inner();

    let chain_id = inner.get_chain_id().await.map_err(to_failure)?;
    if !self.config.supported_chain_ids.contains(&chain_id) {
      return Err(ProviderFailure::message(format!(
        "chain {chain_id} is not supported"
      )));
    }

    let accounts = inner.get_accounts().await.map_err(to_failure)?;
    let address = accounts
      .first()
      .ok_or_else(|| ProviderFailure::message("no unlocked account available"))?;

    let account = Account {
      address: address.to_string(),
      chain_id,
    };
    // Replaced wholesale on reconnect.
    *self.account.write().await = Some(account.clone());
    info!(address = %account.address, chain_id, "Session connected");
    Ok(account)
  }

  async fn call_read(&self, method: &str, _args: Value) -> Result<Value, ProviderFailure> {
    self.read_call(method, None).await
  }

  #[instrument(skip(self, args))]
  async fn call_write(&self, method: &str, args: Value) -> Result<String, ProviderFailure> {
    let account = self.account.read().await.clone().ok_or_else(|| {
      ProviderFailure::message("session not connected; call connect first")
    })?;
    let from: Address = account
      .address
      .parse()
      .map_err(|_| ProviderFailure::message("stored session address is invalid"))?;

    let amount = decode_amount(&args, self.config.token_decimals)?;
    let calldata = encode_uint_arg(method, amount);

    let request = TransactionRequest::default()
      .from(from)
      .to(self.master_control)
      .input(calldata.into());

    // No local signer is configured: alloy falls through to
    // eth_sendTransaction, so the node (wallet) signs and may reject.
    let pending = self
      .provider
      .inner()
      .send_transaction(request)
      .await
      .map_err(to_failure)?;

    let correlation_id = pending.tx_hash().to_string();
    debug!(correlation_id = %correlation_id, "Write call accepted");
    Ok(correlation_id)
  }

  async fn await_settlement(
    &self,
    correlation_id: &str,
  ) -> Result<SettlementStatus, ProviderFailure> {
    let hash: B256 = correlation_id
      .parse()
      .map_err(|_| ProviderFailure::message(format!("invalid correlation id {correlation_id:?}")))?;
    let poll = Duration::from_millis(self.config.settlement_poll_ms);
    let inner = self.provider.inner();

    // The overall deadline is the retry policy's call timeout; this
    // loop only needs to poll until the ledger finalizes.
    loop {
      match inner.get_transaction_receipt(hash).await.map_err(to_failure)? {
        Some(receipt) => {
          return if receipt.status() {
            Ok(SettlementStatus::Confirmed)
          } else {
            Ok(SettlementStatus::Reverted(format!(
              "operation {correlation_id} reverted on ledger"
            )))
          };
        }
        None => sleep(poll).await,
      }
    }
  }

  async fn current_height(&self) -> Result<u64, ProviderFailure> {
    self
      .provider
      .inner()
      .get_block_number()
      .await
      .map_err(to_failure)
  }

  async fn read_at(
    &self,
    method: &str,
    _args: Value,
    position: u64,
  ) -> Result<Value, ProviderFailure> {
    self.read_call(method, Some(position)).await
  }
}

/// Map an alloy transport error to the port's raw failure shape,
/// preserving the JSON-RPC error code when the node sent one.
fn to_failure(error: TransportError) -> ProviderFailure {
  match error.as_error_resp() {
    Some(payload) => ProviderFailure::new(Some(payload.code), payload.message.to_string()),
    None => ProviderFailure::message(format!("network transport error: {error}")),
  }
}

/// Calldata for a no-argument call: 4-byte keccak selector.
fn encode_no_args(method: &str) -> Bytes {
  let signature = format!("{method}()");
  Bytes::copy_from_slice(&keccak256(signature.as_bytes())[..4])
}

/// Calldata for a single-uint256 call: selector + padded word.
fn encode_uint_arg(method: &str, value: U256) -> Bytes {
  let signature = format!("{method}(uint256)");
  let mut calldata = Vec::with_capacity(36);
  calldata.extend_from_slice(&keccak256(signature.as_bytes())[..4]);
  calldata.extend_from_slice(&value.to_be_bytes::<32>());
  Bytes::from(calldata)
}

/// Parse the `amount` argument and scale it into atomic token units.
fn decode_amount(args: &Value, token_decimals: u32) -> Result<U256, ProviderFailure> {
  let amount = args
    .get("amount")
    .and_then(Value::as_str)
    .ok_or_else(|| ProviderFailure::message("write args missing amount"))?;
  let amount: Decimal = amount
    .parse()
    .map_err(|_| ProviderFailure::message(format!("amount {amount:?} is not numeric")))?;

  // 10^27 is the largest power of ten Decimal can scale by without
  // truncating the mantissa; beyond that the write amount would be
  // silently wrong, so refuse instead.
  if token_decimals > 27 {
    return Err(ProviderFailure::message(format!(
      "token_decimals {token_decimals} exceeds the supported precision of 27"
    )));
  }
  let scale = Decimal::from_i128_with_scale(10i128.pow(token_decimals), 0);
  let atomic = amount
    .checked_mul(scale)
    .ok_or_else(|| ProviderFailure::message(format!("amount {amount} overflows token scale")))?
    .trunc();
  U256::from_str_radix(&atomic.to_string(), 10)
    .map_err(|_| ProviderFailure::message(format!("amount {amount} does not fit in uint256")))
}

/// Decode a raw eth_call result into the port's JSON value shape.
///
/// The aggregator surface is fixed: `decimals()` returns one unsigned
/// word, `latestRoundData()` returns five with the `int256` answer in
/// the second. Anything else passes through as a hex string. Words
/// outside the representable range are provider failures, never panics:
/// the answer is remote data and may carry any bit pattern.
fn decode_read(method: &str, data: &[u8]) -> Result<Value, ProviderFailure> {
  match method {
    "decimals" => {
      let word = read_word(data, 0, method)?;
      let value = u64::try_from(U256::from_be_slice(word)).map_err(|_| {
        ProviderFailure::message(format!("{method} value does not fit in u64"))
      })?;
      Ok(json!(value))
    }
    "latestRoundData" => {
      let word = read_word(data, 1, method)?;
      // Two's complement: a negative answer is valid provider data.
      let raw = I256::try_from_be_slice(word).ok_or_else(|| {
        ProviderFailure::message(format!("malformed {method} answer word"))
      })?;
      let answer = i128::try_from(raw).map_err(|_| {
        ProviderFailure::message(format!("{method} answer {raw} out of range"))
      })?;
      Ok(json!(answer.to_string()))
    }
    _ => Ok(json!(format!("0x{}", alloy::hex::encode(data)))),
  }
}

fn read_word<'a>(data: &'a [u8], index: usize, method: &str) -> Result<&'a [u8], ProviderFailure> {
  let start = index * 32;
  data.get(start..start + 32).ok_or_else(|| {
    ProviderFailure::message(format!(
      "malformed {method} response: {} bytes, need word {index}",
      data.len()
    ))
  })
}
