//! Transaction Coordinator - Submission and Confirmation Lifecycle
//!
//! Owns every submitted state-changing operation from submission to
//! terminal confirmation or failure:
//! - validates amounts synchronously (no record for validation failures)
//! - issues the write call through the retry policy
//! - tracks Submitted -> Pending -> Confirmed | Failed per record
//! - publishes every transition on the notification bus
//! - keeps an append-only session history
//!
//! Concurrent submits are independent: each gets its own record and
//! lifecycle, ordered only per record.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::error::{ErrorClassification, ProviderFailure};
use crate::domain::events::CoreEvent;
use crate::domain::transaction::{OperationKind, TransactionRecord, TxStatus};
use crate::ports::chain_client::{ChainClient, SettlementStatus};
use crate::usecases::notifications::NotificationBus;
use crate::usecases::retry::RetryPolicy;

/// Parse a user-supplied amount string.
///
/// Non-numeric input is a synchronous validation failure, resolved
/// before any ledger call.
pub fn parse_amount(input: &str) -> Result<Decimal, ErrorClassification> {
  Decimal::from_str(input.trim())
    .map_err(|_| ErrorClassification::validation(format!("amount {input:?} is not numeric")))
}

/// Coordinates the lifecycle of submitted ledger operations.
pub struct TransactionCoordinator<C: ChainClient> {
  /// Ledger access port.
  chain: Arc<C>,
  /// Shared retry/rate policy.
  retry: Arc<RetryPolicy>,
  /// Observer surface for status transitions.
  bus: NotificationBus,
  /// Append-only session history, insertion order.
  records: RwLock<Vec<TransactionRecord>>,
}

impl<C: ChainClient> TransactionCoordinator<C> {
  /// Create a coordinator over a chain client and shared policy.
  pub fn new(chain: Arc<C>, retry: Arc<RetryPolicy>, bus: NotificationBus) -> Self {
    Self {
      chain,
      retry,
      bus,
      records: RwLock::new(Vec::new()),
    }
  }

  /// Submit a state-changing operation and drive it to a terminal state.
  ///
  /// Amounts `<= 0` are rejected synchronously with a validation
  /// failure and no record is created. Every submission that passes
  /// validation yields a record, even when the ledger rejects it
  /// immediately; the terminal snapshot is returned.
  #[instrument(skip(self, description), fields(kind = %kind, amount = %amount))]
  pub async fn submit(
    &self,
    kind: OperationKind,
    amount: Decimal,
    description: &str,
  ) -> Result<TransactionRecord, ErrorClassification> {
    if amount <= Decimal::ZERO {
      return Err(ErrorClassification::validation(format!(
        "amount must be positive, got {amount}"
      )));
    }

    let mut record = TransactionRecord::new(kind, amount, description);
    {
      self.records.write().await.push(record.clone());
    }
    self.publish(&record);
    info!(id = %record.id, "Operation submitted");

    // Write call, retried per policy.
    let method = kind.method();
    let args = json!({ "amount": amount.to_string() });
    let correlation_id = match self
      .retry
      .execute("call_write", || self.chain.call_write(method, args.clone()))
      .await
    {
      Ok(correlation_id) => correlation_id,
      Err(classified) => return Ok(self.fail(record, classified).await),
    };

    record.correlation_id = Some(correlation_id.clone());
    record.transition(TxStatus::Pending);
    self.sync(&record).await;
    info!(id = %record.id, correlation_id = %correlation_id, "Operation pending settlement");

    // Settlement await, retried per policy. A write accepted by the
    // node cannot be cancelled; a settlement timeout marks the record
    // Failed even though the remote operation may still settle.
    match self
      .retry
      .execute("await_settlement", || {
        self.chain.await_settlement(correlation_id.as_str())
      })
      .await
    {
      Ok(SettlementStatus::Confirmed) => {
        record.transition(TxStatus::Confirmed);
        self.sync(&record).await;
        info!(id = %record.id, "Operation confirmed");
        Ok(record)
      }
      Ok(SettlementStatus::Reverted(reason)) => {
        let classified = ErrorClassification::classify(&ProviderFailure::message(reason));
        Ok(self.fail(record, classified).await)
      }
      Err(classified) => Ok(self.fail(record, classified).await),
    }
  }

  /// Session history: insertion-ordered snapshot of every record.
  pub async fn history(&self) -> Vec<TransactionRecord> {
    self.records.read().await.clone()
  }

  /// Snapshot of a single record by id.
  pub async fn record(&self, id: Uuid) -> Option<TransactionRecord> {
    self.records.read().await.iter().find(|r| r.id == id).cloned()
  }

  /// Mark a record failed, attach the classification, and publish.
  async fn fail(
    &self,
    mut record: TransactionRecord,
    classified: ErrorClassification,
  ) -> TransactionRecord {
    warn!(id = %record.id, kind = ?classified.kind, reason = %classified.reason(), "Operation failed");
    record.failure = Some(classified);
    record.transition(TxStatus::Failed);
    self.sync(&record).await;
    record
  }

  /// Write the working copy back into the stored history and publish
  /// the transition. Identity is preserved: the stored record keeps
  /// its id, so subscribers observe the same record updated.
  async fn sync(&self, record: &TransactionRecord) {
    {
      let mut records = self.records.write().await;
      if let Some(slot) = records.iter_mut().find(|r| r.id == record.id) {
        *slot = record.clone();
      }
    }
    self.publish(record);
  }

  fn publish(&self, record: &TransactionRecord) {
    self.bus.publish(CoreEvent::Transaction {
      id: record.id,
      status: record.status,
      failure: record.failure.clone(),
    });
  }
}
