//! External collaborators of the execution core.
//!
//! This crate holds everything the core talks to but does not own:
//! - Chain node access (simulation, gas/nonce resolution, receipts, logs)
//! - The custody service REST API
//! - ERC-20 bindings
//! - Protocol capability traits and reference adapters
//! - A load-once cache and a block-range event reader

/// Prelude module for convenient imports.
pub mod prelude;

/// Aave V3 lending adapter.
pub mod aave_v3;
/// Load-once keyed cache.
pub mod cache;
/// Protocol capability traits.
pub mod capabilities;
/// Chain node client.
pub mod chain;
/// Custody service client.
pub mod custody;
/// ERC-20 bindings.
pub mod erc20;
/// Block-range event reader.
pub mod events;
/// In-memory collaborators for tests.
#[cfg(any(test, feature = "testing"))]
pub mod mock;
/// Staking rewards adapter.
pub mod staking_rewards;
/// Uniswap V2 style router adapter.
pub mod uniswap_v2;
