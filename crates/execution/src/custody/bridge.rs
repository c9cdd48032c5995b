//! Custody bridge: submission and status reconciliation.
//!
//! The bridge owns the source account, asset and network binding. A raw
//! transaction is submitted as a contract call; its custody status is then
//! polled and cross-checked against chain receipts until a terminal
//! [`Outcome`] is reached or the polling budget runs out.

use super::WhitelistResolver;
use crate::error::{
    AnomalyWarning, PollError, SubmissionError, SubmitError, UnresolvedSubmission,
};
use crate::retry::{RetryExhausted, RetryPolicy, retry, retry_if};
use crate::tracking::SubmissionTracker;
use alloy::primitives::{Address, TxHash};
use custody_domain::{
    CustodySubmission, DestinationDescriptor, Network, Outcome, RawTransaction, ReceiptStatus,
    StatusReport, SubmissionId, TransactionStatus,
};
use custody_protocols::chain::ChainClient;
use custody_protocols::custody::{
    CreateTransactionRequest, CustodyApiError, CustodyClient, ExtraParameters,
    TransactionOperation, TransferPeerPath,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Polling budget for [`CustodyBridge::poll_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Ticks to wait before giving up.
    pub timeout_ticks: u32,
    /// Length of one tick.
    pub tick: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ticks: 180,
            tick: Duration::from_secs(5),
        }
    }
}

impl PollConfig {
    /// Total time budget.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.tick.saturating_mul(self.timeout_ticks)
    }
}

/// Receipt confirmation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptConfig {
    /// How long to wait for a receipt to appear.
    pub timeout: Duration,
    /// Delay between receipt lookups.
    pub interval: Duration,
    /// Pause after a successful receipt before reporting success, so that
    /// follow-up reads see the new state.
    pub settle_delay: Duration,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(240),
            interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(10),
        }
    }
}

/// Configuration for [`CustodyBridge`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Custody asset id of the network's native coin.
    pub asset_id: String,
    /// Vault account that signs.
    pub source_account_id: String,
    /// Send to one-time addresses instead of whitelisted wallets.
    pub test_mode: bool,
    /// Retry policy for create requests; only transient failures retry.
    pub submit_retry: RetryPolicy,
    /// Retry policy for status reads.
    pub status_retry: RetryPolicy,
    /// Polling budget used by [`CustodyBridge::poll`].
    pub poll: PollConfig,
    /// Receipt confirmation timing.
    pub receipt: ReceiptConfig,
    /// Attach one `externalTxId` per submission so that retried create
    /// requests cannot produce duplicate transactions.
    pub dedup_key: bool,
}

impl BridgeConfig {
    /// Default timings for a network and vault account.
    pub fn new(network: Network, source_account_id: impl Into<String>) -> Self {
        Self {
            asset_id: network.asset_id().to_string(),
            source_account_id: source_account_id.into(),
            test_mode: false,
            submit_retry: RetryPolicy::default(),
            status_retry: RetryPolicy::status_reads(),
            poll: PollConfig::default(),
            receipt: ReceiptConfig::default(),
            dedup_key: true,
        }
    }

    #[must_use]
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }
}

/// Submits raw transactions to custody and reconciles their status.
pub struct CustodyBridge {
    custody: Arc<dyn CustodyClient>,
    chain: Arc<dyn ChainClient>,
    whitelist: WhitelistResolver,
    tracker: Arc<SubmissionTracker>,
    config: BridgeConfig,
}

impl CustodyBridge {
    pub fn new(
        custody: Arc<dyn CustodyClient>,
        chain: Arc<dyn ChainClient>,
        tracker: Arc<SubmissionTracker>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            whitelist: WhitelistResolver::new(Arc::clone(&custody)),
            custody,
            chain,
            tracker,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<SubmissionTracker> {
        &self.tracker
    }

    /// Picks the destination for a transaction.
    ///
    /// Test mode always sends to the transaction's own `to` as a one-time
    /// address. Otherwise `destination_override`, or `to`, must be whitelisted
    /// under the configured asset.
    ///
    /// # Errors
    /// Any [`WhitelistError`](crate::error::WhitelistError) from resolution.
    pub async fn resolve_destination(
        &self,
        raw: &RawTransaction,
        destination_override: Option<Address>,
    ) -> Result<DestinationDescriptor, SubmitError> {
        if self.config.test_mode {
            return Ok(DestinationDescriptor::OneTimeAddress(raw.to));
        }
        let target = destination_override.unwrap_or(raw.to);
        Ok(self
            .whitelist
            .resolve(target, &self.config.asset_id)
            .await?)
    }

    /// Submits `raw` to custody as a contract call.
    ///
    /// The destination is resolved once, before the first attempt, and reused
    /// by every retry. Only transient failures are retried. With a dedup key,
    /// each retry first looks for a transaction created by an earlier attempt
    /// whose response was lost, and adopts it instead of sending again.
    ///
    /// # Errors
    /// [`SubmitError::Whitelist`] if the destination is rejected,
    /// [`SubmitError::Submission`] if no custody transaction was created,
    /// [`SubmitError::Unresolved`] if one may have been created but could not
    /// be found.
    pub async fn submit(
        &self,
        raw: &RawTransaction,
        destination_override: Option<Address>,
        note: &str,
    ) -> Result<CustodySubmission, SubmitError> {
        let destination = self.resolve_destination(raw, destination_override).await?;
        let external_tx_id = self
            .config
            .dedup_key
            .then(|| Uuid::new_v4().to_string());

        debug!(
            to = %raw.to,
            destination = %destination,
            external_tx_id = ?external_tx_id,
            "Submitting to custody"
        );

        let result = retry_if(
            "custody_submit",
            self.config.submit_retry,
            CustodyApiError::is_transient,
            |attempt| {
                let request = self.create_request(raw, &destination, note, external_tx_id.clone());
                async move { self.create_once(&request, attempt).await }
            },
        )
        .await;

        let (id, status) = match result {
            Ok(accepted) => accepted,
            Err(exhausted) => {
                self.recover_submission(external_tx_id.as_deref(), exhausted)
                    .await?
            }
        };

        let submission = CustodySubmission {
            id,
            source_account_id: self.config.source_account_id.clone(),
            asset_id: self.config.asset_id.clone(),
            destination,
            amount: raw.value,
            note: note.to_string(),
        };
        self.tracker.record_submitted(&submission).await;

        info!(
            submission = %submission.id,
            destination = %submission.destination,
            status = %status,
            "Submitted to custody"
        );
        Ok(submission)
    }

    /// One create attempt. Retries look up the dedup key first, so a
    /// transaction whose create response was lost is not sent twice.
    async fn create_once(
        &self,
        request: &CreateTransactionRequest,
        attempt: u32,
    ) -> Result<(SubmissionId, String), CustodyApiError> {
        if attempt > 1 {
            if let Some(key) = request.external_tx_id.as_deref() {
                if let Some(report) = self.custody.find_by_external_id(key).await? {
                    info!(
                        submission = %report.id,
                        external_tx_id = key,
                        attempt,
                        "Earlier create attempt reached custody"
                    );
                    return Ok((report.id, report.status.to_string()));
                }
            }
        }

        let response = self.custody.create_transaction(request).await?;
        Ok((SubmissionId(response.id), response.status))
    }

    /// Settles a submit whose create attempts all failed.
    ///
    /// A single attempt rejected outright created nothing. Otherwise an
    /// earlier attempt may have landed: the dedup key is looked up once more,
    /// and if that is impossible the submission is reported as unresolved.
    async fn recover_submission(
        &self,
        external_tx_id: Option<&str>,
        exhausted: RetryExhausted<CustodyApiError>,
    ) -> Result<(SubmissionId, String), SubmitError> {
        let maybe_created = exhausted.attempts > 1 || exhausted.last.is_transient();
        if !maybe_created {
            return Err(SubmissionError::from(exhausted).into());
        }

        let Some(key) = external_tx_id else {
            warn!(
                attempts = exhausted.attempts,
                error = %exhausted.last,
                "Custody submission state unknown without a dedup key, verify externally"
            );
            return Err(unresolved(None, exhausted));
        };

        match self.custody.find_by_external_id(key).await {
            Ok(Some(report)) => {
                warn!(
                    submission = %report.id,
                    external_tx_id = key,
                    attempts = exhausted.attempts,
                    "Recovered custody transaction after failed create responses"
                );
                Ok((report.id, report.status.to_string()))
            }
            Ok(None) => Err(SubmissionError::from(exhausted).into()),
            Err(e) => {
                warn!(
                    external_tx_id = key,
                    attempts = exhausted.attempts,
                    error = %e,
                    "Custody submission state unknown, verify externally"
                );
                Err(unresolved(Some(key), exhausted))
            }
        }
    }

    fn create_request(
        &self,
        raw: &RawTransaction,
        destination: &DestinationDescriptor,
        note: &str,
        external_tx_id: Option<String>,
    ) -> CreateTransactionRequest {
        CreateTransactionRequest {
            operation: TransactionOperation::ContractCall,
            asset_id: self.config.asset_id.clone(),
            source: TransferPeerPath::vault(self.config.source_account_id.clone()),
            destination: TransferPeerPath::from(destination),
            amount: raw.value.to_string(),
            note: note.to_string(),
            extra_parameters: ExtraParameters {
                contract_call_data: raw.data_hex(),
            },
            external_tx_id,
        }
    }

    /// Reads the current custody status with the status retry policy.
    ///
    /// # Errors
    /// Returns [`PollError`] once every attempt failed.
    pub async fn status(&self, id: &SubmissionId) -> Result<StatusReport, PollError> {
        retry("custody_status", self.config.status_retry, |_| {
            self.custody.get_transaction(id)
        })
        .await
        .map_err(|e| PollError {
            id: id.clone(),
            attempts: e.attempts,
            last: e.last,
        })
    }

    /// Polls `id` to a terminal outcome with the configured budget.
    ///
    /// # Errors
    /// See [`CustodyBridge::poll_with`].
    pub async fn poll(&self, id: &SubmissionId) -> Result<Outcome, PollError> {
        self.poll_with(id, self.config.poll).await
    }

    /// Polls `id` to a terminal outcome.
    ///
    /// Failure statuses resolve to `Failed` without touching the chain.
    /// Completion is confirmed against the chain receipt; a reverted receipt
    /// is recorded as an anomaly and resolves to `Failed`. A pending status
    /// whose hash already has a successful receipt resolves to `Succeeded`.
    /// When the budget runs out, a pending transaction is cancelled once and
    /// the result is `TimedOut`.
    ///
    /// A submission that already has an outcome returns it without any
    /// custody or chain traffic.
    ///
    /// # Errors
    /// Returns [`PollError`] if the custody status cannot be read.
    pub async fn poll_with(&self, id: &SubmissionId, poll: PollConfig) -> Result<Outcome, PollError> {
        if let Some(outcome) = self.tracker.outcome(id).await {
            debug!(submission = %id, outcome = %outcome, "Returning recorded outcome");
            return Ok(outcome);
        }

        let deadline = Instant::now() + poll.budget();
        let mut tx_hash: Option<TxHash> = None;

        loop {
            let report = self.status(id).await?;
            if report.tx_hash.is_some() {
                tx_hash = report.tx_hash;
            }
            if self.tracker.record_status(&report).await {
                info!(
                    submission = %id,
                    status = %report.status,
                    sub_status = ?report.sub_status,
                    tx_hash = ?report.tx_hash,
                    "Custody status changed"
                );
            }

            match report.status {
                status if status.is_failure() => {
                    warn!(
                        submission = %id,
                        status = %status,
                        sub_status = ?report.sub_status,
                        "Custody reports failure"
                    );
                    return Ok(self.tracker.resolve(id, Outcome::Failed { tx_hash }).await);
                }
                TransactionStatus::Completed => match tx_hash {
                    Some(hash) => match self.check_chain_receipt(hash).await {
                        ReceiptStatus::Success => {
                            return Ok(self
                                .tracker
                                .resolve(id, Outcome::Succeeded { tx_hash: hash })
                                .await);
                        }
                        ReceiptStatus::Failure => {
                            self.tracker
                                .record_anomaly(AnomalyWarning {
                                    id: id.clone(),
                                    tx_hash: hash,
                                })
                                .await;
                            return Ok(self
                                .tracker
                                .resolve(id, Outcome::Failed { tx_hash: Some(hash) })
                                .await);
                        }
                        ReceiptStatus::Unknown => {
                            debug!(submission = %id, tx_hash = %hash, "Receipt inconclusive, polling on");
                        }
                    },
                    None => {
                        warn!(submission = %id, "Custody reports completion without a hash");
                    }
                },
                _ => {
                    if let Some(hash) = tx_hash {
                        if self.receipt_succeeded(hash).await {
                            return Ok(self
                                .tracker
                                .resolve(id, Outcome::Succeeded { tx_hash: hash })
                                .await);
                        }
                    }
                }
            }

            if Instant::now() >= deadline {
                return Ok(self.time_out(id, report.status, tx_hash).await);
            }
            sleep(poll.tick).await;
        }
    }

    async fn time_out(
        &self,
        id: &SubmissionId,
        status: TransactionStatus,
        tx_hash: Option<TxHash>,
    ) -> Outcome {
        if let Some(hash) = tx_hash {
            if self.receipt_succeeded(hash).await {
                return self
                    .tracker
                    .resolve(id, Outcome::Succeeded { tx_hash: hash })
                    .await;
            }
        }

        warn!(submission = %id, status = %status, "Timed out waiting for custody");

        if !status.is_terminal() && self.tracker.mark_cancel_requested(id).await {
            match self.custody.cancel_transaction(id).await {
                Ok(()) => info!(submission = %id, "Cancellation requested"),
                Err(e) => {
                    warn!(submission = %id, error = %e, "Cancellation failed");
                    self.tracker.record_cancel_failed(id, e.to_string()).await;
                }
            }
        }

        self.tracker.resolve(id, Outcome::TimedOut { tx_hash }).await
    }

    /// Single receipt lookup that only reports a confirmed success.
    async fn receipt_succeeded(&self, hash: TxHash) -> bool {
        match self.chain.transaction_receipt(hash).await {
            Ok(Some(receipt)) => receipt.status == Some(true),
            Ok(None) => false,
            Err(e) => {
                debug!(tx_hash = %hash, error = %e, "Receipt lookup failed");
                false
            }
        }
    }

    /// Waits for the receipt of `hash` and reports its verdict.
    ///
    /// A successful receipt is reported after the settle delay. A missing
    /// receipt, a receipt without a status field, or a lookup error yields
    /// [`ReceiptStatus::Unknown`].
    pub async fn check_chain_receipt(&self, hash: TxHash) -> ReceiptStatus {
        let receipt = self.config.receipt;
        let deadline = Instant::now() + receipt.timeout;

        loop {
            match self.chain.transaction_receipt(hash).await {
                Ok(Some(found)) => {
                    return match found.status {
                        Some(false) => {
                            warn!(tx_hash = %hash, block = ?found.block_number, "Transaction failed on chain");
                            ReceiptStatus::Failure
                        }
                        Some(true) => {
                            debug!(tx_hash = %hash, block = ?found.block_number, "Transaction succeeded on chain");
                            sleep(receipt.settle_delay).await;
                            ReceiptStatus::Success
                        }
                        None => {
                            warn!(tx_hash = %hash, "Receipt carries no status");
                            ReceiptStatus::Unknown
                        }
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(tx_hash = %hash, error = %e, "Receipt lookup failed");
                    return ReceiptStatus::Unknown;
                }
            }

            if Instant::now() >= deadline {
                debug!(tx_hash = %hash, "No receipt within timeout");
                return ReceiptStatus::Unknown;
            }
            sleep(receipt.interval).await;
        }
    }
}

fn unresolved(external_tx_id: Option<&str>, exhausted: RetryExhausted<CustodyApiError>) -> SubmitError {
    UnresolvedSubmission {
        external_tx_id: external_tx_id.map(str::to_string),
        attempts: exhausted.attempts,
        last: exhausted.last,
    }
    .into()
}
