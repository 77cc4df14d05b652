//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainClient`: remote ledger access (reads, writes, settlement,
//!   block heights) with raw provider failures at the boundary

pub mod chain_client;

pub use chain_client::{Account, ChainClient, SettlementStatus};
