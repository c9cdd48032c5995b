//! Custody service client.
//!
//! The custody service signs and broadcasts on behalf of a vault account. The
//! core needs a handful of operations from it: create a contract-call
//! transaction, read a transaction's status by id or by the caller's
//! external id, cancel a transaction, and list whitelisted external wallets.

mod http;
mod types;

pub use http::{CustodyApi, CustodyApiConfig};
pub use types::*;

use async_trait::async_trait;
use custody_domain::{StatusReport, SubmissionId};
use thiserror::Error;

/// Errors returned by the custody service client.
#[derive(Debug, Error)]
pub enum CustodyApiError {
    /// Network or HTTP failure.
    #[error("custody transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("custody api returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// The service accepted the request but declined the action.
    #[error("custody api rejected request: {0}")]
    Rejected(String),
    /// The response could not be decoded.
    #[error("custody response decode error: {0}")]
    Decode(String),
    /// Request signing failed.
    #[error("custody request signing failed: {0}")]
    Auth(#[from] jsonwebtoken::errors::Error),
}

impl CustodyApiError {
    /// Whether repeating the same request may succeed: transport failures,
    /// server errors and rate limiting.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Rejected(_) | Self::Decode(_) | Self::Auth(_) => false,
        }
    }
}

/// Operations the execution core needs from the custody service.
#[async_trait]
pub trait CustodyClient: Send + Sync {
    /// Creates a transaction. Every call creates a new custody transaction
    /// unless the request carries an `external_tx_id` the service has seen.
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, CustodyApiError>;

    /// Reads the current status of a transaction.
    async fn get_transaction(&self, id: &SubmissionId) -> Result<StatusReport, CustodyApiError>;

    /// Looks up the transaction created with `external_tx_id`.
    ///
    /// Returns `None` when the service holds no such transaction.
    async fn find_by_external_id(
        &self,
        external_tx_id: &str,
    ) -> Result<Option<StatusReport>, CustodyApiError>;

    /// Requests cancellation of a transaction.
    async fn cancel_transaction(&self, id: &SubmissionId) -> Result<(), CustodyApiError>;

    /// Lists whitelisted external wallets.
    async fn external_wallets(&self) -> Result<Vec<ExternalWallet>, CustodyApiError>;
}
