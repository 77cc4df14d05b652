//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the core's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `TransactionCoordinator`: submission and confirmation lifecycle
//! - `PriceFeedSynchronizer`: bounded historical price reconstruction
//! - `RetryPolicy`: rate-limited retry execution for all ledger calls
//! - `NotificationBus`: observer surface for state changes

pub mod coordinator;
pub mod notifications;
pub mod price_feed;
pub mod retry;

pub use coordinator::TransactionCoordinator;
pub use notifications::NotificationBus;
pub use price_feed::PriceFeedSynchronizer;
pub use retry::RetryPolicy;
