//! Chain Adapters - Remote Ledger Access Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - RPC provider management with startup chain validation
//! - the `ChainClient` port (reads, writes, settlement polling)
//!
//! Contract addresses come from `config.toml` - never hardcoded.

pub mod client;
pub mod provider;

pub use client::EvmChainClient;
pub use provider::EvmProvider;
