use crate::destination::DestinationDescriptor;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Custody-assigned transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A contract call accepted by the custody service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodySubmission {
    /// Custody transaction id.
    pub id: SubmissionId,
    /// Source vault account id.
    pub source_account_id: String,
    /// Custody asset id of the network.
    pub asset_id: String,
    /// Resolved destination.
    pub destination: DestinationDescriptor,
    /// Native amount in base units.
    pub amount: U256,
    /// Free-text note attached to the request.
    pub note: String,
}
