//! Typed notification events.
//!
//! Everything the coordinator and synchronizer publish on the bus is a
//! [`CoreEvent`]; subscribers render or log without polling the core.

use serde::Serialize;
use uuid::Uuid;

use super::error::ErrorClassification;
use super::price::PriceSeries;
use super::transaction::TxStatus;

/// State-change event published on the notification bus.
///
/// Serializes with an `entity` tag so log sinks and UI consumers can
/// route on `"transaction"` vs `"price"`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum CoreEvent {
    /// A transaction record changed status.
    Transaction {
        /// Record identity.
        id: Uuid,
        /// New status.
        status: TxStatus,
        /// Classification, present when the record failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<ErrorClassification>,
    },
    /// The price series was replaced by a refresh.
    Price {
        /// The freshly assembled series.
        series: PriceSeries,
    },
}
