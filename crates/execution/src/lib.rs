//! Custody-gated transaction execution.
//!
//! This crate turns unsigned contract calls into confirmed on-chain results
//! through a third-party custody service:
//! - Raw transaction building with nonce and gas resolution
//! - Destination whitelisting
//! - Custody submission and status reconciliation against the chain
//! - Submission tracking
//! - Allowance management and trade orchestration

/// Prelude module for convenient imports.
pub mod prelude;

/// Custody submission and reconciliation.
pub mod custody;
/// Error taxonomy.
pub mod error;
/// Bounded retry combinator.
pub mod retry;
/// Trade orchestration.
pub mod trade;
/// Submission tracking.
pub mod tracking;
/// Raw transaction building.
pub mod transaction;
