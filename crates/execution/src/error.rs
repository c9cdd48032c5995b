//! Error taxonomy of the execution core.

use crate::retry::RetryExhausted;
use alloy::primitives::{Address, TxHash, U256};
use custody_domain::{DomainError, SubmissionId};
use custody_protocols::chain::ChainError;
use custody_protocols::custody::CustodyApiError;
use std::fmt;
use thiserror::Error;

/// Building a raw transaction failed on every attempt.
#[derive(Debug, Error)]
#[error("failed to build transaction after {attempts} attempts: {last}")]
pub struct BuildError {
    /// Attempts made.
    pub attempts: u32,
    /// Cause of the final attempt's failure.
    #[source]
    pub last: ChainError,
}

impl From<RetryExhausted<ChainError>> for BuildError {
    fn from(err: RetryExhausted<ChainError>) -> Self {
        Self {
            attempts: err.attempts,
            last: err.last,
        }
    }
}

/// Creating the custody transaction failed and no transaction exists.
#[derive(Debug, Error)]
#[error("failed to submit to custody after {attempts} attempts: {last}")]
pub struct SubmissionError {
    /// Attempts made.
    pub attempts: u32,
    /// Cause of the final attempt's failure.
    #[source]
    pub last: CustodyApiError,
}

impl From<RetryExhausted<CustodyApiError>> for SubmissionError {
    fn from(err: RetryExhausted<CustodyApiError>) -> Self {
        Self {
            attempts: err.attempts,
            last: err.last,
        }
    }
}

/// A create request may have reached custody, but whether a transaction
/// exists could not be established. Verify externally before sending again.
#[derive(Debug, Error)]
#[error(
    "custody submission state unknown after {attempts} attempts (external id {}), verify externally: {last}",
    .external_tx_id.as_deref().unwrap_or("none")
)]
pub struct UnresolvedSubmission {
    /// Dedup key the requests carried, if any.
    pub external_tx_id: Option<String>,
    /// Create attempts made.
    pub attempts: u32,
    /// Cause of the final create attempt's failure.
    #[source]
    pub last: CustodyApiError,
}

/// The custody status of a submission could not be read.
#[derive(Debug, Error)]
#[error("failed to read status of {id} after {attempts} attempts: {last}")]
pub struct PollError {
    /// Submission being polled.
    pub id: SubmissionId,
    /// Status reads attempted.
    pub attempts: u32,
    /// Cause of the final read's failure.
    #[source]
    pub last: CustodyApiError,
}

/// Destination resolution failures. Never retried.
#[derive(Debug, Error)]
pub enum WhitelistError {
    /// No whitelisted wallet lists the address.
    #[error("address {address} is not whitelisted")]
    NotWhitelisted {
        /// Address that was looked up.
        address: Address,
    },
    /// The address is listed, but only under other assets.
    #[error("address {address} is whitelisted, but not for asset {asset}")]
    WrongAsset {
        /// Address that was looked up.
        address: Address,
        /// Asset the bridge is bound to.
        asset: String,
    },
    /// The whitelist could not be fetched.
    #[error("failed to fetch whitelist: {0}")]
    Listing(#[source] CustodyApiError),
}

/// Submitting a raw transaction to custody failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The destination was rejected; nothing was sent.
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),
    /// No custody transaction was created.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// A custody transaction may exist.
    #[error(transparent)]
    Unresolved(#[from] UnresolvedSubmission),
}

/// Custody reported completion but the chain receipt shows a revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyWarning {
    /// Custody transaction id.
    pub id: SubmissionId,
    /// Hash of the reverted chain transaction.
    pub tx_hash: TxHash,
}

impl fmt::Display for AnomalyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "custody reported {} completed but transaction {} failed on chain",
            self.id, self.tx_hash
        )
    }
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The dry run reverted or could not be executed.
    #[error("simulation failed: {0}")]
    Simulation(#[source] ChainError),
    /// A chain read failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// The raw transaction could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The destination was rejected.
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),
    /// Custody did not create the transaction.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// Custody may hold a transaction whose creation was not confirmed.
    #[error(transparent)]
    Unresolved(#[from] UnresolvedSubmission),
    /// The custody status could not be read.
    #[error(transparent)]
    Poll(#[from] PollError),
    /// Allowance is too low and sending is disabled.
    #[error("allowance {allowance} of {token} for {spender} is below {required}")]
    InsufficientAllowance {
        /// Token being approved.
        token: Address,
        /// Contract that pulls the token.
        spender: Address,
        /// Current allowance.
        allowance: U256,
        /// Amount the operation needs.
        required: U256,
    },
    /// The sender holds less than the operation needs.
    #[error("balance {balance} of {token} is below {required}")]
    InsufficientBalance {
        /// Token being spent.
        token: Address,
        /// Current balance.
        balance: U256,
        /// Amount the operation needs.
        required: U256,
    },
    /// A transaction did not reach success.
    #[error("transaction {outcome}")]
    Unsuccessful {
        /// Terminal outcome reached.
        outcome: custody_domain::Outcome,
    },
    /// Caller-supplied parameters are unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<SubmitError> for ExecutionError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Whitelist(e) => Self::Whitelist(e),
            SubmitError::Submission(e) => Self::Submission(e),
            SubmitError::Unresolved(e) => Self::Unresolved(e),
        }
    }
}

impl ExecutionError {
    /// Whether retrying the whole operation later may succeed.
    ///
    /// Configuration and input errors, reverts and unwhitelisted destinations
    /// are permanent. Unresolved submissions and unsuccessful outcomes are
    /// never retryable: the transaction may still land.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Simulation(err) | Self::Chain(err) => err.is_transient(),
            Self::Build(err) => err.last.is_transient(),
            Self::Submission(err) => err.last.is_transient(),
            Self::Poll(_) => true,
            Self::Whitelist(err) => matches!(err, WhitelistError::Listing(_)),
            Self::Unresolved(_)
            | Self::Unsuccessful { .. }
            | Self::InsufficientAllowance { .. }
            | Self::InsufficientBalance { .. }
            | Self::InvalidInput(_)
            | Self::Domain(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_domain::Outcome;

    #[test]
    fn test_retryable_classification() {
        let transient = ExecutionError::Build(BuildError {
            attempts: 4,
            last: ChainError::Transport("timeout".into()),
        });
        assert!(transient.is_retryable());

        let reverted = ExecutionError::Simulation(ChainError::Reverted("STF".into()));
        assert!(!reverted.is_retryable());

        let unlisted = ExecutionError::Whitelist(WhitelistError::NotWhitelisted {
            address: Address::ZERO,
        });
        assert!(!unlisted.is_retryable());

        let listing = ExecutionError::Whitelist(WhitelistError::Listing(
            CustodyApiError::Api {
                status: 503,
                body: String::new(),
            },
        ));
        assert!(listing.is_retryable());

        // Unresolved transactions must be verified before anything is resent.
        let timed_out = ExecutionError::Unsuccessful {
            outcome: Outcome::TimedOut { tx_hash: None },
        };
        assert!(!timed_out.is_retryable());

        assert!(!ExecutionError::Domain(DomainError::UnknownNetwork("x".into())).is_retryable());
    }

    #[test]
    fn test_submission_retryability_follows_cause() {
        let unavailable = ExecutionError::Submission(SubmissionError {
            attempts: 4,
            last: CustodyApiError::Api {
                status: 503,
                body: String::new(),
            },
        });
        assert!(unavailable.is_retryable());

        let invalid = ExecutionError::Submission(SubmissionError {
            attempts: 1,
            last: CustodyApiError::Api {
                status: 400,
                body: "invalid destination".into(),
            },
        });
        assert!(!invalid.is_retryable());

        let unresolved = ExecutionError::from(SubmitError::Unresolved(UnresolvedSubmission {
            external_tx_id: Some("k-1".into()),
            attempts: 4,
            last: CustodyApiError::Api {
                status: 504,
                body: String::new(),
            },
        }));
        assert!(matches!(unresolved, ExecutionError::Unresolved(_)));
        assert!(!unresolved.is_retryable());
        assert!(unresolved.to_string().contains("verify externally"));
    }

    #[test]
    fn test_exhaustion_keeps_cause() {
        let err: SubmissionError = RetryExhausted {
            attempts: 4,
            last: CustodyApiError::Rejected("duplicate".into()),
        }
        .into();
        assert_eq!(err.attempts, 4);
        assert!(err.to_string().contains("duplicate"));
    }
}
