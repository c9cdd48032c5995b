//! Terminal outcomes and receipt verdicts.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal result of a custody submission.
///
/// `TimedOut` means unresolved: the transaction may still land on chain and
/// must be verified externally before anything is resent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The chain receipt reports success.
    Succeeded {
        /// Confirmed transaction hash.
        tx_hash: TxHash,
    },
    /// Custody rejected the transaction or the chain reverted it.
    Failed {
        /// Hash, when the transaction reached the chain.
        tx_hash: Option<TxHash>,
    },
    /// No verdict within the polling deadline.
    TimedOut {
        /// Last hash custody exposed, if any.
        tx_hash: Option<TxHash>,
    },
}

impl Outcome {
    /// Whether the transaction is confirmed successful on chain.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Chain hash, if known.
    #[must_use]
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Succeeded { tx_hash } => Some(*tx_hash),
            Self::Failed { tx_hash } | Self::TimedOut { tx_hash } => *tx_hash,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::TimedOut { .. } => "timed out",
        };
        match self.tx_hash() {
            Some(hash) => write!(f, "{label} ({hash})"),
            None => f.write_str(label),
        }
    }
}

/// Verdict of a chain receipt lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Receipt status bit is 1.
    Success,
    /// Receipt status bit is 0.
    Failure,
    /// No receipt yet, or a receipt without a status field. Never terminal.
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_hash_accessor() {
        let hash = TxHash::repeat_byte(0xab);

        assert!(Outcome::Succeeded { tx_hash: hash }.is_success());
        assert_eq!(Outcome::Succeeded { tx_hash: hash }.tx_hash(), Some(hash));
        assert_eq!(Outcome::Failed { tx_hash: None }.tx_hash(), None);
        assert!(!Outcome::TimedOut { tx_hash: Some(hash) }.is_success());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Failed { tx_hash: None }.to_string(), "failed");
        assert_eq!(Outcome::TimedOut { tx_hash: None }.to_string(), "timed out");
    }
}
