//! Chain node access.
//!
//! The execution core only needs a narrow slice of JSON-RPC: read-only calls,
//! transaction preparation, receipt lookup and log queries. [`ChainClient`]
//! captures that slice; [`RpcProvider`] implements it over HTTP.

mod rpc;

pub use rpc::{RpcConfig, RpcProvider};

use alloy::primitives::{Bytes, TxHash};
use alloy::rpc::types::{Filter, Log};
use async_trait::async_trait;
use custody_domain::{CallDescriptor, RawTransaction};
use thiserror::Error;

/// JSON-RPC error code providers return for oversized log queries.
pub const LIMIT_EXCEEDED_CODE: i64 = -32005;

/// Errors returned by the chain node.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Network or HTTP failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered with a JSON-RPC error.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },
    /// The call reverted during execution or estimation.
    #[error("execution reverted: {0}")]
    Reverted(String),
    /// A log query spanned more blocks than the node accepts.
    #[error("log query range too large: {0}")]
    RangeTooLarge(String),
    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The configured endpoint is not a valid URL.
    #[error("invalid rpc url: {0}")]
    InvalidUrl(String),
}

impl ChainError {
    /// Classifies a JSON-RPC error payload.
    #[must_use]
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == LIMIT_EXCEEDED_CODE {
            Self::RangeTooLarge(message)
        } else if code == 3 || message.to_lowercase().contains("revert") {
            Self::Reverted(message)
        } else {
            Self::Rpc { code, message }
        }
    }

    /// Whether repeating the same request may succeed.
    ///
    /// Reverts are deterministic for the same state, and decode or URL
    /// errors will not change on their own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rpc { .. })
    }
}

/// Receipt fields the core reconciles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptInfo {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// EIP-658 status bit; `None` for receipts that only carry a state root.
    pub status: Option<bool>,
}

/// Read access to a chain node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Executes a call read-only against the latest state.
    async fn call(&self, call: &CallDescriptor) -> Result<Bytes, ChainError>;

    /// Resolves nonce, gas limit and fees for a call.
    async fn prepare_transaction(&self, call: &CallDescriptor)
    -> Result<RawTransaction, ChainError>;

    /// Looks up a receipt; `Ok(None)` while the transaction is pending or unknown.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Logs matching a filter. The filter carries its own block range.
    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_classification() {
        assert!(matches!(
            ChainError::from_rpc(-32005, "query returned more than 10000 results"),
            ChainError::RangeTooLarge(_)
        ));
        assert!(matches!(
            ChainError::from_rpc(3, "execution reverted: STF"),
            ChainError::Reverted(_)
        ));
        assert!(matches!(
            ChainError::from_rpc(-32000, "nonce too low"),
            ChainError::Rpc { code: -32000, .. }
        ));
    }

    #[test]
    fn test_only_node_and_transport_errors_are_transient() {
        assert!(ChainError::Transport("connection reset".into()).is_transient());
        assert!(ChainError::from_rpc(-32000, "header not found").is_transient());
        assert!(!ChainError::from_rpc(3, "execution reverted: STF").is_transient());
        assert!(!ChainError::Decode("bad abi".into()).is_transient());
        assert!(!ChainError::InvalidUrl("x".into()).is_transient());
    }
}
