//! Submission tracker.

use super::{EventData, SubmissionEvent, SubmissionEventType};
use crate::error::AnomalyWarning;
use alloy::primitives::TxHash;
use custody_domain::{
    CustodySubmission, DestinationDescriptor, Outcome, StatusReport, SubmissionId,
    TransactionStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Current view of one submission.
#[derive(Debug, Clone)]
pub struct SubmissionSummary {
    /// Custody transaction id.
    pub id: SubmissionId,
    /// Custody asset, when submitted through this tracker.
    pub asset_id: Option<String>,
    /// Resolved destination, when submitted through this tracker.
    pub destination: Option<DestinationDescriptor>,
    /// When the tracker first heard of the submission.
    pub first_seen: chrono::DateTime<chrono::Utc>,
    /// Last custody status observed.
    pub last_status: Option<TransactionStatus>,
    /// Last chain hash observed.
    pub tx_hash: Option<TxHash>,
    /// Whether a cancellation was issued.
    pub cancel_requested: bool,
    /// Custody-completed but chain-reverted report, if any.
    pub anomaly: Option<AnomalyWarning>,
    /// Terminal outcome; never replaced once set.
    pub outcome: Option<Outcome>,
    /// When the outcome was recorded.
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl SubmissionSummary {
    fn new(id: SubmissionId) -> Self {
        Self {
            id,
            asset_id: None,
            destination: None,
            first_seen: chrono::Utc::now(),
            last_status: None,
            tx_hash: None,
            cancel_requested: false,
            anomaly: None,
            outcome: None,
            resolved_at: None,
        }
    }
}

/// Tracks events and outcomes for all submissions.
pub struct SubmissionTracker {
    /// Events by submission.
    events: Arc<RwLock<HashMap<SubmissionId, Vec<SubmissionEvent>>>>,
    /// Submission summaries.
    summaries: Arc<RwLock<HashMap<SubmissionId, SubmissionSummary>>>,
}

impl SubmissionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            summaries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records a transaction accepted by custody.
    pub async fn record_submitted(&self, submission: &CustodySubmission) {
        let event = SubmissionEvent::new(
            SubmissionEventType::Submitted,
            submission.id.clone(),
            EventData::Submitted {
                asset_id: submission.asset_id.clone(),
                destination: submission.destination.clone(),
                note: submission.note.clone(),
            },
        );
        self.add_event(event).await;

        let mut summaries = self.summaries.write().await;
        let summary = summaries
            .entry(submission.id.clone())
            .or_insert_with(|| SubmissionSummary::new(submission.id.clone()));
        summary.asset_id = Some(submission.asset_id.clone());
        summary.destination = Some(submission.destination.clone());
        summary.last_status = Some(TransactionStatus::Submitted);
    }

    /// Records a status report. Returns whether the status changed.
    pub async fn record_status(&self, report: &StatusReport) -> bool {
        let changed = {
            let mut summaries = self.summaries.write().await;
            let summary = summaries
                .entry(report.id.clone())
                .or_insert_with(|| SubmissionSummary::new(report.id.clone()));
            if report.tx_hash.is_some() {
                summary.tx_hash = report.tx_hash;
            }
            let changed = summary.last_status != Some(report.status);
            summary.last_status = Some(report.status);
            changed
        };

        if changed {
            self.add_event(SubmissionEvent::new(
                SubmissionEventType::StatusChanged,
                report.id.clone(),
                EventData::StatusChanged {
                    status: report.status,
                    sub_status: report.sub_status.clone(),
                    tx_hash: report.tx_hash,
                },
            ))
            .await;
        }
        changed
    }

    /// Records a custody/chain disagreement.
    pub async fn record_anomaly(&self, anomaly: AnomalyWarning) {
        warn!(
            submission = %anomaly.id,
            tx_hash = %anomaly.tx_hash,
            "Custody completed but chain reports failure"
        );

        self.add_event(SubmissionEvent::new(
            SubmissionEventType::Anomaly,
            anomaly.id.clone(),
            EventData::Anomaly {
                tx_hash: anomaly.tx_hash,
                message: anomaly.to_string(),
            },
        ))
        .await;

        let id = anomaly.id.clone();
        let mut summaries = self.summaries.write().await;
        summaries
            .entry(id.clone())
            .or_insert_with(|| SubmissionSummary::new(id))
            .anomaly = Some(anomaly);
    }

    /// Marks a cancellation as requested.
    ///
    /// Returns `false` if one was already requested, in which case the caller
    /// must not issue another.
    pub async fn mark_cancel_requested(&self, id: &SubmissionId) -> bool {
        {
            let mut summaries = self.summaries.write().await;
            let summary = summaries
                .entry(id.clone())
                .or_insert_with(|| SubmissionSummary::new(id.clone()));
            if summary.cancel_requested {
                return false;
            }
            summary.cancel_requested = true;
        }

        self.add_event(SubmissionEvent::new(
            SubmissionEventType::CancellationRequested,
            id.clone(),
            EventData::CancellationRequested,
        ))
        .await;
        true
    }

    /// Records a failed cancellation request.
    pub async fn record_cancel_failed(&self, id: &SubmissionId, error: String) {
        self.add_event(SubmissionEvent::new(
            SubmissionEventType::CancellationFailed,
            id.clone(),
            EventData::CancellationFailed { error },
        ))
        .await;
    }

    /// Records a terminal outcome and returns the one in effect.
    ///
    /// The first outcome recorded for a submission wins; later calls return it
    /// unchanged.
    pub async fn resolve(&self, id: &SubmissionId, outcome: Outcome) -> Outcome {
        {
            let mut summaries = self.summaries.write().await;
            let summary = summaries
                .entry(id.clone())
                .or_insert_with(|| SubmissionSummary::new(id.clone()));
            if let Some(existing) = summary.outcome {
                debug!(submission = %id, outcome = %existing, "Submission already resolved");
                return existing;
            }
            summary.outcome = Some(outcome);
            summary.resolved_at = Some(chrono::Utc::now());
        }

        self.add_event(SubmissionEvent::new(
            SubmissionEventType::Resolved,
            id.clone(),
            EventData::Resolved(outcome),
        ))
        .await;

        info!(submission = %id, outcome = %outcome, "Submission resolved");
        outcome
    }

    /// Recorded terminal outcome, if any.
    pub async fn outcome(&self, id: &SubmissionId) -> Option<Outcome> {
        self.summaries
            .read()
            .await
            .get(id)
            .and_then(|s| s.outcome)
    }

    async fn add_event(&self, event: SubmissionEvent) {
        let mut events = self.events.write().await;
        events.entry(event.submission.clone()).or_default().push(event);
    }

    /// Gets all events for a submission, oldest first.
    pub async fn get_events(&self, id: &SubmissionId) -> Vec<SubmissionEvent> {
        self.events
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn get_summary(&self, id: &SubmissionId) -> Option<SubmissionSummary> {
        self.summaries.read().await.get(id).cloned()
    }

    pub async fn get_all_summaries(&self) -> Vec<SubmissionSummary> {
        self.summaries.read().await.values().cloned().collect()
    }

    /// Submissions without a definitive result: unresolved or timed out.
    pub async fn get_unresolved(&self) -> Vec<SubmissionSummary> {
        self.summaries
            .read()
            .await
            .values()
            .filter(|s| matches!(s.outcome, None | Some(Outcome::TimedOut { .. })))
            .cloned()
            .collect()
    }

    /// Counts across all tracked submissions.
    pub async fn get_stats(&self) -> TrackerStats {
        let summaries = self.summaries.read().await;
        let mut stats = TrackerStats::default();

        for summary in summaries.values() {
            stats.total += 1;
            match summary.outcome {
                Some(Outcome::Succeeded { .. }) => stats.succeeded += 1,
                Some(Outcome::Failed { .. }) => stats.failed += 1,
                Some(Outcome::TimedOut { .. }) => stats.timed_out += 1,
                None => stats.pending += 1,
            }
            if summary.anomaly.is_some() {
                stats.anomalies += 1;
            }
        }

        stats
    }
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate counts across submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Submissions tracked.
    pub total: u32,
    /// Resolved as succeeded.
    pub succeeded: u32,
    /// Resolved as failed.
    pub failed: u32,
    /// Resolved as timed out.
    pub timed_out: u32,
    /// Not yet resolved.
    pub pending: u32,
    /// Submissions with a recorded anomaly.
    pub anomalies: u32,
}
