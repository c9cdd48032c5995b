//! Scriptable in-memory collaborators.
//!
//! Available to this crate's tests and, with the `testing` feature, to
//! downstream crates.

use crate::chain::{ChainClient, ChainError, ReceiptInfo};
use crate::custody::{
    CreateTransactionRequest, CreateTransactionResponse, CustodyApiError, CustodyClient,
    ExternalWallet, WalletAsset,
};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolValue;
use async_trait::async_trait;
use custody_domain::{
    CallDescriptor, GasPricing, RawTransaction, StatusReport, SubmissionId, TransactionStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// In-memory chain node.
#[derive(Default)]
pub struct MockChain {
    call_results: Mutex<HashMap<[u8; 4], Bytes>>,
    calls: Mutex<Vec<CallDescriptor>>,
    prepare_failures: AtomicU32,
    prepare_reverts: AtomicU32,
    prepare_calls: AtomicU32,
    receipts: Mutex<HashMap<TxHash, ReceiptInfo>>,
    receipt_calls: AtomicU32,
    max_log_range: Mutex<Option<u64>>,
    log_failures: AtomicU32,
    log_calls: AtomicU32,
    nonce: AtomicU64,
}

impl MockChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the raw return data for calls with this selector.
    pub fn set_call_result(&self, selector: [u8; 4], data: impl Into<Bytes>) {
        lock(&self.call_results).insert(selector, data.into());
    }

    /// Scripts an ABI-encoded return value for calls with this selector.
    pub fn set_return<T: SolValue>(&self, selector: [u8; 4], value: T) {
        self.set_call_result(selector, value.abi_encode());
    }

    /// Makes the next `n` transaction preparations fail.
    pub fn fail_prepare(&self, n: u32) {
        self.prepare_failures.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` transaction preparations revert during gas
    /// estimation.
    pub fn revert_prepare(&self, n: u32) {
        self.prepare_reverts.store(n, Ordering::SeqCst);
    }

    /// Registers a mined receipt; `status` of `None` models a pre-Byzantium
    /// receipt without a status field.
    pub fn set_receipt(&self, hash: TxHash, status: Option<bool>) {
        lock(&self.receipts).insert(
            hash,
            ReceiptInfo {
                tx_hash: hash,
                block_number: Some(1),
                status,
            },
        );
    }

    /// Refuses log queries spanning more than `blocks` blocks.
    pub fn set_max_log_range(&self, blocks: u64) {
        *lock(&self.max_log_range) = Some(blocks);
    }

    /// Makes the next `n` log queries fail with a transport error.
    pub fn fail_logs(&self, n: u32) {
        self.log_failures.store(n, Ordering::SeqCst);
    }

    /// Every call passed to [`ChainClient::call`].
    pub fn calls(&self) -> Vec<CallDescriptor> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn prepare_calls(&self) -> u32 {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> u32 {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> u32 {
        self.log_calls.load(Ordering::SeqCst)
    }

    /// Chain lookups of any kind made so far.
    pub fn total_calls(&self) -> u32 {
        self.call_count() as u32 + self.prepare_calls() + self.receipt_calls() + self.log_calls()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(1)
    }

    async fn call(&self, call: &CallDescriptor) -> Result<Bytes, ChainError> {
        lock(&self.calls).push(call.clone());
        let selector: [u8; 4] = call
            .data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Reverted("call data shorter than a selector".into()))?;
        lock(&self.call_results)
            .get(&selector)
            .cloned()
            .ok_or_else(|| {
                ChainError::Reverted(format!("no result for 0x{}", hex::encode(selector)))
            })
    }

    async fn prepare_transaction(
        &self,
        call: &CallDescriptor,
    ) -> Result<RawTransaction, ChainError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.prepare_failures) {
            return Err(ChainError::Transport("gas estimation timed out".into()));
        }
        if take_failure(&self.prepare_reverts) {
            return Err(ChainError::Reverted(
                "execution reverted: TransferHelper: TRANSFER_FROM_FAILED".into(),
            ));
        }
        Ok(RawTransaction {
            from: call.from,
            to: call.target,
            value: call.value,
            data: call.data.clone(),
            nonce: self.nonce.fetch_add(1, Ordering::SeqCst),
            gas_limit: 100_000,
            gas: GasPricing::Legacy {
                gas_price: 30_000_000_000,
            },
            chain_id: 1,
        })
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.receipts).get(&hash).copied())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(0)
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, ChainError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.log_failures) {
            return Err(ChainError::Transport("connection reset".into()));
        }

        let from = filter.get_from_block().unwrap_or_default();
        let to = filter.get_to_block().unwrap_or(from);
        if let Some(max) = *lock(&self.max_log_range) {
            if to - from + 1 > max {
                return Err(ChainError::RangeTooLarge(format!(
                    "query returned more than {max} results"
                )));
            }
        }

        // One log per block.
        Ok((from..=to)
            .map(|block| Log {
                block_number: Some(block),
                ..Default::default()
            })
            .collect())
    }
}

/// In-memory custody service.
#[derive(Default)]
pub struct MockCustody {
    create_failures: AtomicU32,
    lost_responses: AtomicU32,
    rejects_creates: AtomicBool,
    create_calls: AtomicU32,
    created: AtomicU32,
    by_external_id: Mutex<HashMap<String, String>>,
    lookup_failures: AtomicU32,
    lookup_calls: AtomicU32,
    requests: Mutex<Vec<CreateTransactionRequest>>,
    statuses: Mutex<HashMap<String, VecDeque<StatusReport>>>,
    status_failures: AtomicU32,
    status_calls: AtomicU32,
    cancel_calls: AtomicU32,
    cancel_fails: AtomicBool,
    wallets: Mutex<Vec<ExternalWallet>>,
    wallets_fail: AtomicBool,
    wallet_calls: AtomicU32,
}

impl MockCustody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` create requests fail with a 503.
    pub fn fail_creates(&self, n: u32) {
        self.create_failures.store(n, Ordering::SeqCst);
    }

    /// Creates the next `n` transactions but answers each with a 504, as if
    /// the response was lost on the way back.
    pub fn lose_create_responses(&self, n: u32) {
        self.lost_responses.store(n, Ordering::SeqCst);
    }

    /// Rejects every create request as invalid (400).
    pub fn reject_creates(&self) {
        self.rejects_creates.store(true, Ordering::SeqCst);
    }

    /// Makes the next `n` lookups by external id fail with a 503.
    pub fn fail_lookups(&self, n: u32) {
        self.lookup_failures.store(n, Ordering::SeqCst);
    }

    /// Scripts the statuses returned for `id`, in order. The last one repeats.
    pub fn script_status(&self, id: &str, steps: Vec<(TransactionStatus, Option<TxHash>)>) {
        let reports = steps
            .into_iter()
            .map(|(status, tx_hash)| StatusReport {
                id: SubmissionId::from(id),
                status,
                sub_status: None,
                tx_hash,
            })
            .collect();
        lock(&self.statuses).insert(id.to_string(), reports);
    }

    /// Makes the next `n` status reads fail.
    pub fn fail_status(&self, n: u32) {
        self.status_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_cancel(&self) {
        self.cancel_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_wallets(&self) {
        self.wallets_fail.store(true, Ordering::SeqCst);
    }

    /// Adds a whitelisted wallet holding one asset/address pair.
    pub fn add_wallet(&self, id: &str, asset_id: &str, address: Address) {
        self.add_wallet_raw(id, asset_id, &address.to_string());
    }

    /// Adds a wallet with the address string exactly as the service would list it.
    pub fn add_wallet_raw(&self, id: &str, asset_id: &str, address: &str) {
        let mut wallets = lock(&self.wallets);
        let asset = WalletAsset {
            id: asset_id.to_string(),
            address: address.to_string(),
            status: Some("APPROVED".into()),
        };
        match wallets.iter_mut().find(|w| w.id == id) {
            Some(wallet) => wallet.assets.push(asset),
            None => wallets.push(ExternalWallet {
                id: id.to_string(),
                name: id.to_string(),
                assets: vec![asset],
            }),
        }
    }

    /// Every create request received, failed attempts included.
    pub fn requests(&self) -> Vec<CreateTransactionRequest> {
        lock(&self.requests).clone()
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Transactions actually created.
    pub fn created(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> u32 {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn wallet_calls(&self) -> u32 {
        self.wallet_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CustodyClient for MockCustody {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, CustodyApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
        if take_failure(&self.create_failures) {
            return Err(CustodyApiError::Api {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        if self.rejects_creates.load(Ordering::SeqCst) {
            return Err(CustodyApiError::Api {
                status: 400,
                body: "invalid destination".into(),
            });
        }

        let mut by_external_id = lock(&self.by_external_id);
        if let Some(key) = &request.external_tx_id {
            if by_external_id.contains_key(key) {
                return Err(CustodyApiError::Api {
                    status: 400,
                    body: format!("externalTxId {key} already exists"),
                });
            }
        }

        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("tx-{n}");
        if let Some(key) = &request.external_tx_id {
            by_external_id.insert(key.clone(), id.clone());
        }

        if take_failure(&self.lost_responses) {
            return Err(CustodyApiError::Api {
                status: 504,
                body: "gateway timeout".into(),
            });
        }
        Ok(CreateTransactionResponse {
            id,
            status: "SUBMITTED".into(),
        })
    }

    async fn find_by_external_id(
        &self,
        external_tx_id: &str,
    ) -> Result<Option<StatusReport>, CustodyApiError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.lookup_failures) {
            return Err(CustodyApiError::Api {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        Ok(lock(&self.by_external_id)
            .get(external_tx_id)
            .map(|id| StatusReport {
                id: SubmissionId::new(id.clone()),
                status: TransactionStatus::Submitted,
                sub_status: None,
                tx_hash: None,
            }))
    }

    async fn get_transaction(&self, id: &SubmissionId) -> Result<StatusReport, CustodyApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.status_failures) {
            return Err(CustodyApiError::Api {
                status: 502,
                body: "bad gateway".into(),
            });
        }

        let mut statuses = lock(&self.statuses);
        let report = match statuses.get_mut(id.as_str()) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().cloned(),
            None => None,
        };
        Ok(report.unwrap_or_else(|| StatusReport {
            id: id.clone(),
            status: TransactionStatus::Submitted,
            sub_status: None,
            tx_hash: None,
        }))
    }

    async fn cancel_transaction(&self, id: &SubmissionId) -> Result<(), CustodyApiError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.cancel_fails.load(Ordering::SeqCst) {
            return Err(CustodyApiError::Rejected(format!("cancel of {id} declined")));
        }
        Ok(())
    }

    async fn external_wallets(&self) -> Result<Vec<ExternalWallet>, CustodyApiError> {
        self.wallet_calls.fetch_add(1, Ordering::SeqCst);
        if self.wallets_fail.load(Ordering::SeqCst) {
            return Err(CustodyApiError::Api {
                status: 401,
                body: "unauthorized".into(),
            });
        }
        Ok(lock(&self.wallets).clone())
    }
}
