//! Domain layer - Core business types and pure logic.
//!
//! This module contains the pure domain logic for the stablemint core:
//! transaction lifecycle, price series, the canonical error taxonomy,
//! and bus events. No external dependencies allowed here (hexagonal
//! architecture inner ring). All types are serializable and testable
//! in isolation.

pub mod error;
pub mod events;
pub mod price;
pub mod transaction;

// Re-export core types for convenience
pub use error::{ErrorClassification, ErrorKind, ProviderFailure};
pub use events::CoreEvent;
pub use price::{PricePoint, PriceSeries};
pub use transaction::{OperationKind, TransactionRecord, TxStatus};
