//! Custody-side transaction status.

use crate::submission::SubmissionId;
use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status of a custody transaction.
///
/// The custody service reports a wider vocabulary; [`TransactionStatus::from_custody`]
/// folds it into these seven states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Accepted by custody, not yet broadcast (includes queued and pending-approval states).
    Submitted,
    /// Signed and being broadcast.
    Broadcasting,
    /// Broadcast, waiting for confirmations.
    Confirming,
    /// Custody considers the transaction done.
    Completed,
    /// Custody gave up on the transaction.
    Failed,
    /// Blocked by a custody policy.
    Blocked,
    /// Cancelled before broadcast.
    Cancelled,
}

impl TransactionStatus {
    /// Maps a raw custody status string to the canonical status.
    #[must_use]
    pub fn from_custody(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "BROADCASTING" => Self::Broadcasting,
            "CONFIRMING" => Self::Confirming,
            "COMPLETED" | "PARTIALLY_COMPLETED" => Self::Completed,
            "FAILED" | "REJECTED" | "TIMEOUT" => Self::Failed,
            "BLOCKED" => Self::Blocked,
            "CANCELLED" => Self::Cancelled,
            // SUBMITTED, QUEUED, PENDING_*, CANCELLING and anything new.
            _ => Self::Submitted,
        }
    }

    /// Whether no further transition is expected.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Blocked | Self::Cancelled
        )
    }

    /// Terminal states that mean the transaction was never broadcast.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Blocked | Self::Cancelled)
    }

    /// Custody wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Broadcasting => "BROADCASTING",
            Self::Confirming => "CONFIRMING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Blocked => "BLOCKED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status observation for a custody submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Custody transaction id.
    pub id: SubmissionId,
    /// Canonical status.
    pub status: TransactionStatus,
    /// Custody sub-status, free text.
    pub sub_status: Option<String>,
    /// Chain transaction hash, once custody exposes one.
    pub tx_hash: Option<TxHash>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custody_vocabulary_folds_into_canonical_states() {
        assert_eq!(
            TransactionStatus::from_custody("PENDING_SIGNATURE"),
            TransactionStatus::Submitted
        );
        assert_eq!(
            TransactionStatus::from_custody("queued"),
            TransactionStatus::Submitted
        );
        assert_eq!(
            TransactionStatus::from_custody("CANCELLING"),
            TransactionStatus::Submitted
        );
        assert_eq!(
            TransactionStatus::from_custody("REJECTED"),
            TransactionStatus::Failed
        );
        assert_eq!(
            TransactionStatus::from_custody("CONFIRMING"),
            TransactionStatus::Confirming
        );
        assert_eq!(
            TransactionStatus::from_custody("COMPLETED"),
            TransactionStatus::Completed
        );
    }

    #[test]
    fn test_terminal_and_failure_sets() {
        for status in [
            TransactionStatus::Failed,
            TransactionStatus::Blocked,
            TransactionStatus::Cancelled,
        ] {
            assert!(status.is_terminal());
            assert!(status.is_failure());
        }

        assert!(TransactionStatus::Completed.is_terminal());
        assert!(!TransactionStatus::Completed.is_failure());

        for status in [
            TransactionStatus::Submitted,
            TransactionStatus::Broadcasting,
            TransactionStatus::Confirming,
        ] {
            assert!(!status.is_terminal());
        }
    }
}
