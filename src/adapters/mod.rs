//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies.
//!
//! Adapter categories:
//! - `chain`: remote ledger interaction via alloy-rs (JSON-RPC)

pub mod chain;
