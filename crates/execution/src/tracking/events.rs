//! Submission events.

use alloy::primitives::TxHash;
use custody_domain::{DestinationDescriptor, Outcome, SubmissionId, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Type of submission event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionEventType {
    /// Custody accepted the transaction.
    Submitted,
    /// Custody reported a new status.
    StatusChanged,
    /// Custody and chain disagree about the result.
    Anomaly,
    /// A cancellation was requested.
    CancellationRequested,
    /// The cancellation request failed.
    CancellationFailed,
    /// A terminal outcome was recorded.
    Resolved,
}

/// A recorded event for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: SubmissionEventType,
    /// Submission the event belongs to.
    pub submission: SubmissionId,
    /// When the event was recorded.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl SubmissionEvent {
    /// Creates a new event stamped now.
    pub fn new(event_type: SubmissionEventType, submission: SubmissionId, data: EventData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            submission,
            timestamp: chrono::Utc::now(),
            data,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventData {
    /// Custody accepted the transaction.
    Submitted {
        /// Custody asset.
        asset_id: String,
        /// Resolved destination.
        destination: DestinationDescriptor,
        /// Note attached to the request.
        note: String,
    },
    /// Custody reported a new status.
    StatusChanged {
        /// Canonical status.
        status: TransactionStatus,
        /// Custody sub-status.
        sub_status: Option<String>,
        /// Chain hash, if exposed.
        tx_hash: Option<TxHash>,
    },
    /// Custody completed but the chain receipt reverted.
    Anomaly {
        /// Reverted transaction.
        tx_hash: TxHash,
        /// Human-readable description.
        message: String,
    },
    /// A cancellation was requested.
    CancellationRequested,
    /// The cancellation request failed.
    CancellationFailed {
        /// Error reported by custody.
        error: String,
    },
    /// A terminal outcome was recorded.
    Resolved(Outcome),
}
