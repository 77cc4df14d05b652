//! Transaction lifecycle types.
//!
//! A [`TransactionRecord`] is created at submission and owned by the
//! coordinator for the rest of the session. History is append-only:
//! records are never deleted, only their status and timestamp move,
//! and identity is preserved through the record id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ErrorClassification;

/// Correlation id assigned by the ledger once a write call is accepted.
pub type CorrelationId = String;

/// Kind of state-changing operation submitted to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Mint synthetic tokens against collateral.
    Mint,
    /// Burn synthetic tokens, releasing collateral.
    Burn,
    /// Any other contract call routed through the coordinator.
    Other,
}

impl OperationKind {
    /// Contract method name this kind maps to.
    pub fn method(self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Other => "execute",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mint => write!(f, "MINT"),
            Self::Burn => write!(f, "BURN"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Lifecycle status of a submitted operation.
///
/// Per-record ordering is strict: `Submitted` before `Pending` before a
/// terminal state. `Confirmed` and `Failed` are terminal — a record
/// never transitions again once it reaches one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Accepted by the coordinator, correlation id not yet known.
    Submitted,
    /// Accepted by the remote node, awaiting settlement.
    Pending,
    /// Settled successfully on the ledger.
    Confirmed,
    /// Rejected, reverted, or abandoned after retry exhaustion.
    Failed,
}

impl TxStatus {
    /// Whether this status ends the record's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

/// A single submitted operation, tracked from submission to settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Stable record identity, assigned at submission.
    pub id: Uuid,
    /// Ledger-assigned hash, known once the write call is accepted.
    pub correlation_id: Option<CorrelationId>,
    /// Operation kind.
    pub kind: OperationKind,
    /// Operation amount in token units.
    pub amount: Decimal,
    /// Human description for the history view.
    pub description: String,
    /// Current lifecycle status.
    pub status: TxStatus,
    /// Classification attached when the record failed.
    pub failure: Option<ErrorClassification>,
    /// When the record was created.
    pub submitted_at: DateTime<Utc>,
    /// When the status last moved.
    pub last_updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a fresh record in the `Submitted` state.
    pub fn new(kind: OperationKind, amount: Decimal, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            correlation_id: None,
            kind,
            amount,
            description: description.into(),
            status: TxStatus::Submitted,
            failure: None,
            submitted_at: now,
            last_updated_at: now,
        }
    }

    /// Move the record to a new status, refusing to leave a terminal state.
    ///
    /// Returns `false` when the transition was rejected.
    pub fn transition(&mut self, status: TxStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        self.last_updated_at = Utc::now();
        true
    }

    /// Human-readable reason for a failed record, if any.
    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(ErrorClassification::reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{ErrorKind, ProviderFailure};
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_record_starts_submitted() {
        let record = TransactionRecord::new(OperationKind::Mint, dec!(10), "mint 10");
        assert_eq!(record.status, TxStatus::Submitted);
        assert!(record.correlation_id.is_none());
        assert!(record.failure.is_none());
        assert_eq!(record.submitted_at, record.last_updated_at);
    }

    #[test]
    fn test_transition_follows_lifecycle() {
        let mut record = TransactionRecord::new(OperationKind::Burn, dec!(5), "burn 5");
        assert!(record.transition(TxStatus::Pending));
        assert!(record.transition(TxStatus::Confirmed));
        assert_eq!(record.status, TxStatus::Confirmed);
    }

    #[test]
    fn test_terminal_status_never_moves_again() {
        let mut record = TransactionRecord::new(OperationKind::Mint, dec!(1), "mint 1");
        assert!(record.transition(TxStatus::Failed));
        assert!(!record.transition(TxStatus::Confirmed));
        assert!(!record.transition(TxStatus::Pending));
        assert_eq!(record.status, TxStatus::Failed);
    }

    #[test]
    fn test_failure_reason_comes_from_classification() {
        let mut record = TransactionRecord::new(OperationKind::Mint, dec!(2), "mint 2");
        record.transition(TxStatus::Failed);
        record.failure = Some(ErrorClassification::classify(&ProviderFailure::new(
            Some(4001),
            "denied in wallet",
        )));
        assert_eq!(
            record.failure_reason().as_deref(),
            Some("Transaction rejected by user")
        );
        assert_eq!(record.failure.as_ref().map(|f| f.kind), Some(ErrorKind::UserRejected));
    }

    #[test]
    fn test_operation_kind_method_names() {
        assert_eq!(OperationKind::Mint.method(), "mint");
        assert_eq!(OperationKind::Burn.method(), "burn");
        assert_eq!(OperationKind::Other.method(), "execute");
    }
}
