//! Trade orchestrator.
//!
//! Coordinates simulate → build → submit → confirm for strategy calls and
//! manages token allowances before fund-moving calls.

use crate::custody::{BridgeConfig, CustodyBridge};
use crate::error::ExecutionError;
use crate::tracking::SubmissionTracker;
use crate::transaction::{BuilderConfig, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use custody_domain::{CallDescriptor, CustodySubmission, Network, Outcome, Token, TokenAmount};
use custody_protocols::cache::LoadOnceCache;
use custody_protocols::capabilities::{Exchange, Lending, Staking, SwapParams};
use custody_protocols::chain::ChainClient;
use custody_protocols::custody::CustodyClient;
use custody_protocols::erc20;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for [`TradeOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Network the vault operates on.
    pub network: Network,
    /// Whether calls are actually sent; otherwise only simulated.
    pub send_enabled: bool,
    /// Factor applied to the required amount when approving.
    pub approval_multiplier: U256,
    /// Transaction builder settings.
    pub builder: BuilderConfig,
    /// Custody bridge settings.
    pub bridge: BridgeConfig,
}

impl OrchestratorConfig {
    pub fn new(
        network: Network,
        source_account_id: impl Into<String>,
        test_mode: bool,
        send_enabled: bool,
    ) -> Self {
        Self {
            network,
            send_enabled,
            approval_multiplier: U256::from(100_000u64),
            builder: BuilderConfig::default(),
            bridge: BridgeConfig::new(network, source_account_id).with_test_mode(test_mode),
        }
    }
}

/// Result of [`TradeOrchestrator::send`].
#[derive(Debug, Clone)]
pub struct SendReport {
    /// Return data of the dry run.
    pub simulation: Bytes,
    /// Custody submission, when the call was sent.
    pub submission: Option<CustodySubmission>,
    /// Terminal outcome, when the call was sent.
    pub outcome: Option<Outcome>,
}

impl SendReport {
    /// Whether the call was submitted to custody.
    #[must_use]
    pub fn was_sent(&self) -> bool {
        self.submission.is_some()
    }
}

/// Result of [`TradeOrchestrator::ensure_approval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalResult {
    /// The existing allowance covers the amount.
    AlreadyApproved,
    /// An approval was sent; carries its outcome.
    Submitted(Outcome),
}

/// Façade over simulation, building, custody submission and confirmation.
pub struct TradeOrchestrator {
    chain: Arc<dyn ChainClient>,
    builder: TransactionBuilder,
    bridge: CustodyBridge,
    tracker: Arc<SubmissionTracker>,
    tokens: LoadOnceCache<Address, Token>,
    config: OrchestratorConfig,
}

impl TradeOrchestrator {
    /// Creates an orchestrator with default timings.
    pub fn new(
        network: Network,
        source_account_id: impl Into<String>,
        test_mode: bool,
        send_enabled: bool,
        chain: Arc<dyn ChainClient>,
        custody: Arc<dyn CustodyClient>,
    ) -> Self {
        Self::with_config(
            OrchestratorConfig::new(network, source_account_id, test_mode, send_enabled),
            chain,
            custody,
        )
    }

    pub fn with_config(
        config: OrchestratorConfig,
        chain: Arc<dyn ChainClient>,
        custody: Arc<dyn CustodyClient>,
    ) -> Self {
        let tracker = Arc::new(SubmissionTracker::new());
        Self {
            builder: TransactionBuilder::new(Arc::clone(&chain), config.builder),
            bridge: CustodyBridge::new(
                custody,
                Arc::clone(&chain),
                Arc::clone(&tracker),
                config.bridge.clone(),
            ),
            chain,
            tracker,
            tokens: LoadOnceCache::new(),
            config,
        }
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.config.network
    }

    #[must_use]
    pub fn send_enabled(&self) -> bool {
        self.config.send_enabled
    }

    #[must_use]
    pub fn bridge(&self) -> &CustodyBridge {
        &self.bridge
    }

    #[must_use]
    pub fn tracker(&self) -> &Arc<SubmissionTracker> {
        &self.tracker
    }

    /// Simulates `call` and, when sending is enabled, sends it through custody.
    ///
    /// `send_override` replaces the configured send flag for this call.
    /// `approval_override` is the address whitelisting is checked against
    /// instead of the call target.
    ///
    /// # Errors
    /// [`ExecutionError::Simulation`] if the dry run fails; otherwise the
    /// typed build, whitelist, submission or poll error of the failing stage.
    /// [`ExecutionError::Unresolved`] means custody may hold the transaction:
    /// verify before sending again.
    pub async fn send(
        &self,
        call: CallDescriptor,
        send_override: Option<bool>,
        approval_override: Option<Address>,
    ) -> Result<SendReport, ExecutionError> {
        debug!(from = %call.from, to = %call.target, "Simulating call");
        let simulation = self
            .chain
            .call(&call)
            .await
            .map_err(ExecutionError::Simulation)?;
        debug!(result = %simulation, "Simulation result");

        if !send_override.unwrap_or(self.config.send_enabled) {
            return Ok(SendReport {
                simulation,
                submission: None,
                outcome: None,
            });
        }

        let raw = self.builder.build(&call).await?;
        let note = call_note(&call);
        let submission = self.bridge.submit(&raw, approval_override, &note).await?;
        let outcome = self.bridge.poll(&submission.id).await?;

        if outcome.is_success() {
            info!(submission = %submission.id, outcome = %outcome, "Transaction confirmed");
        } else {
            warn!(submission = %submission.id, outcome = %outcome, "Transaction not confirmed");
        }

        Ok(SendReport {
            simulation,
            submission: Some(submission),
            outcome: Some(outcome),
        })
    }

    /// Makes sure `spender` may pull `amount` of `token` from `owner`.
    ///
    /// An allowance strictly greater than `amount` is enough. Otherwise an
    /// approval for `amount` times the approval multiplier is sent, with
    /// whitelisting checked against `spender`.
    ///
    /// # Errors
    /// [`ExecutionError::InsufficientAllowance`] when sending is disabled;
    /// any error of the approval's [`send`](Self::send).
    pub async fn ensure_approval(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<ApprovalResult, ExecutionError> {
        let allowance = erc20::read_allowance(self.chain.as_ref(), token, owner, spender).await?;
        info!(%token, %spender, %allowance, required = %amount, "Current allowance");

        if allowance > amount {
            return Ok(ApprovalResult::AlreadyApproved);
        }

        if !self.config.send_enabled {
            warn!(%owner, %token, %spender, "Not enough allowance and sending is disabled");
            return Err(ExecutionError::InsufficientAllowance {
                token,
                spender,
                allowance,
                required: amount,
            });
        }

        let approved = amount.saturating_mul(self.config.approval_multiplier);
        info!(%token, %spender, amount = %approved, "Approving");
        let call = erc20::approve_call(token, owner, spender, approved);
        let report = self.send(call, None, Some(spender)).await?;

        report
            .outcome
            .map(ApprovalResult::Submitted)
            .ok_or_else(|| ExecutionError::InvalidInput("approval was not sent".to_string()))
    }

    /// Reads `balanceOf(owner)` on `token`.
    ///
    /// # Errors
    /// Returns the chain read error.
    pub async fn current_balance(&self, owner: Address, token: Address) -> Result<U256, ExecutionError> {
        Ok(erc20::read_balance(self.chain.as_ref(), token, owner).await?)
    }

    /// Token decimals and symbol, loaded once per token.
    ///
    /// # Errors
    /// Returns the chain read error; nothing is cached on failure.
    pub async fn token_metadata(&self, token: Address) -> Result<Token, ExecutionError> {
        let chain = self.chain.as_ref();
        Ok(self
            .tokens
            .get_or_try_load(token, || erc20::read_token(chain, token))
            .await?)
    }

    /// Balance of `owner` in `token` with its decimals.
    ///
    /// # Errors
    /// Returns the chain read error.
    pub async fn token_balance(
        &self,
        owner: Address,
        token: Address,
    ) -> Result<TokenAmount, ExecutionError> {
        let metadata = self.token_metadata(token).await?;
        let raw = self.current_balance(owner, token).await?;
        Ok(metadata.amount(raw))
    }

    /// Swaps on `exchange`: approves the input token for the exchange,
    /// checks the balance, then sends the swap.
    ///
    /// # Errors
    /// [`ExecutionError::InvalidInput`] for an empty path,
    /// [`ExecutionError::Unsuccessful`] if the approval did not succeed,
    /// [`ExecutionError::InsufficientBalance`] if `from` lacks the input
    /// amount, and any error of [`send`](Self::send).
    pub async fn execute_swap(
        &self,
        exchange: &dyn Exchange,
        from: Address,
        params: &SwapParams,
    ) -> Result<SendReport, ExecutionError> {
        let token_in = params
            .token_in()
            .ok_or_else(|| ExecutionError::InvalidInput("swap path is empty".to_string()))?;

        info!(exchange = exchange.name(), %token_in, amount_in = %params.amount_in, "Swapping");
        self.approve_for(from, token_in, exchange.spender(), params.amount_in)
            .await?;
        self.require_balance(from, token_in, params.amount_in).await?;

        self.send(exchange.swap_call(from, params), None, None).await
    }

    /// Supplies `amount` of `asset` to a money market.
    ///
    /// # Errors
    /// As for [`execute_swap`](Self::execute_swap).
    pub async fn supply(
        &self,
        lending: &dyn Lending,
        from: Address,
        asset: Address,
        amount: U256,
    ) -> Result<SendReport, ExecutionError> {
        self.approve_for(from, asset, lending.spender(), amount).await?;
        self.require_balance(from, asset, amount).await?;
        self.send(lending.supply_call(from, asset, amount), None, None)
            .await
    }

    /// Repays `amount` of borrowed `asset`.
    ///
    /// # Errors
    /// As for [`execute_swap`](Self::execute_swap).
    pub async fn repay(
        &self,
        lending: &dyn Lending,
        from: Address,
        asset: Address,
        amount: U256,
    ) -> Result<SendReport, ExecutionError> {
        self.approve_for(from, asset, lending.spender(), amount).await?;
        self.send(lending.repay_call(from, asset, amount), None, None)
            .await
    }

    /// Borrows `amount` of `asset` at a variable rate.
    ///
    /// # Errors
    /// Any error of [`send`](Self::send).
    pub async fn borrow(
        &self,
        lending: &dyn Lending,
        from: Address,
        asset: Address,
        amount: U256,
    ) -> Result<SendReport, ExecutionError> {
        self.send(lending.borrow_call(from, asset, amount), None, None)
            .await
    }

    /// Stakes `amount` of the staking token.
    ///
    /// # Errors
    /// As for [`execute_swap`](Self::execute_swap).
    pub async fn stake(
        &self,
        staking: &dyn Staking,
        from: Address,
        amount: U256,
    ) -> Result<SendReport, ExecutionError> {
        let token = staking.staking_token();
        self.approve_for(from, token, staking.spender(), amount).await?;
        self.require_balance(from, token, amount).await?;
        self.send(staking.stake_call(from, amount), None, None).await
    }

    /// Unstakes `amount` after checking the staked balance.
    ///
    /// # Errors
    /// [`ExecutionError::InsufficientBalance`] if less is staked, and any
    /// error of [`send`](Self::send).
    pub async fn unstake(
        &self,
        staking: &dyn Staking,
        from: Address,
        amount: U256,
    ) -> Result<SendReport, ExecutionError> {
        let staked = staking.staked_balance(self.chain.as_ref(), from).await?;
        if staked < amount {
            return Err(ExecutionError::InsufficientBalance {
                token: staking.staking_token(),
                balance: staked,
                required: amount,
            });
        }
        self.send(staking.unstake_call(from, amount), None, None)
            .await
    }

    async fn approve_for(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        match self.ensure_approval(owner, token, spender, amount).await? {
            ApprovalResult::AlreadyApproved => Ok(()),
            ApprovalResult::Submitted(outcome) if outcome.is_success() => Ok(()),
            ApprovalResult::Submitted(outcome) => Err(ExecutionError::Unsuccessful { outcome }),
        }
    }

    async fn require_balance(
        &self,
        owner: Address,
        token: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        let balance = self.current_balance(owner, token).await?;
        if balance < amount {
            return Err(ExecutionError::InsufficientBalance {
                token,
                balance,
                required: amount,
            });
        }
        Ok(())
    }
}

fn call_note(call: &CallDescriptor) -> String {
    match call.data.get(..4) {
        Some(selector) => format!("0x{} on {}", alloy::hex::encode(selector), call.target),
        None => format!("transfer to {}", call.target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WhitelistError;
    use alloy::primitives::{B256, address};
    use alloy::sol_types::SolCall;
    use custody_domain::{DestinationDescriptor, TransactionStatus};
    use custody_protocols::erc20::IERC20;
    use custody_protocols::mock::{MockChain, MockCustody};
    use custody_protocols::uniswap_v2::UniswapV2Router;

    const VAULT: Address = address!("0xa1BF30455Dc68807711612CD167450fCD0fde502");
    const USDC: Address = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
    const WETH: Address = address!("0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619");
    const SPENDER: Address = address!("0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff");

    struct Harness {
        chain: Arc<MockChain>,
        custody: Arc<MockCustody>,
        orchestrator: TradeOrchestrator,
    }

    fn harness(test_mode: bool, send_enabled: bool) -> Harness {
        let chain = Arc::new(MockChain::new());
        let custody = Arc::new(MockCustody::new());
        let orchestrator = TradeOrchestrator::new(
            Network::Polygon,
            "4",
            test_mode,
            send_enabled,
            chain.clone(),
            custody.clone(),
        );
        Harness {
            chain,
            custody,
            orchestrator,
        }
    }

    /// Scripts `tx-1` to complete with a successful receipt.
    fn confirm_first_submission(h: &Harness) -> B256 {
        let hash = B256::repeat_byte(0xaa);
        h.custody.script_status(
            "tx-1",
            vec![
                (TransactionStatus::Submitted, None),
                (TransactionStatus::Completed, Some(hash)),
            ],
        );
        h.chain.set_receipt(hash, Some(true));
        hash
    }

    fn approve_call_data() -> CallDescriptor {
        erc20::approve_call(USDC, VAULT, SPENDER, U256::from(1u64))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_disabled_only_simulates() {
        let h = harness(true, false);
        h.chain
            .set_return(IERC20::approveCall::SELECTOR, true);

        let report = h
            .orchestrator
            .send(approve_call_data(), None, None)
            .await
            .unwrap();

        assert!(!report.was_sent());
        assert!(report.outcome.is_none());
        assert_eq!(report.simulation.len(), 32);
        assert_eq!(h.chain.prepare_calls(), 0);
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_enabled_runs_full_pipeline() {
        let h = harness(true, false);
        h.chain
            .set_return(IERC20::approveCall::SELECTOR, true);
        let hash = confirm_first_submission(&h);

        let report = h
            .orchestrator
            .send(approve_call_data(), Some(true), None)
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(Outcome::Succeeded { tx_hash: hash }));
        assert_eq!(h.chain.prepare_calls(), 1);
        assert_eq!(h.custody.created(), 1);
        assert_eq!(
            report.submission.unwrap().destination,
            DestinationDescriptor::OneTimeAddress(USDC)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_failure_stops_before_build() {
        let h = harness(true, true);

        let err = h
            .orchestrator
            .send(approve_call_data(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Simulation(_)));
        assert_eq!(h.chain.prepare_calls(), 0);
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_failure_creates_no_submission() {
        let h = harness(true, true);
        h.chain
            .set_return(IERC20::approveCall::SELECTOR, true);
        h.chain.fail_prepare(4);

        let err = h
            .orchestrator
            .send(approve_call_data(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Build(_)));
        assert!(err.is_retryable());
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwhitelisted_target_propagates_typed() {
        let h = harness(false, true);
        h.chain
            .set_return(IERC20::approveCall::SELECTOR, true);

        let err = h
            .orchestrator
            .send(approve_call_data(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::Whitelist(WhitelistError::NotWhitelisted { .. })
        ));
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowance_above_amount_is_already_approved() {
        let h = harness(false, true);
        h.chain
            .set_return(IERC20::allowanceCall::SELECTOR, U256::from(500u64));

        let result = h
            .orchestrator
            .ensure_approval(VAULT, USDC, SPENDER, U256::from(400u64))
            .await
            .unwrap();

        assert_eq!(result, ApprovalResult::AlreadyApproved);
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowance_equal_to_amount_is_not_enough() {
        let h = harness(false, false);
        h.chain
            .set_return(IERC20::allowanceCall::SELECTOR, U256::from(400u64));

        let result = h
            .orchestrator
            .ensure_approval(VAULT, USDC, SPENDER, U256::from(400u64))
            .await;

        assert!(matches!(
            result,
            Err(ExecutionError::InsufficientAllowance { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_allowance_when_sending_disabled() {
        let h = harness(false, false);
        h.chain
            .set_return(IERC20::allowanceCall::SELECTOR, U256::from(100u64));

        let err = h
            .orchestrator
            .ensure_approval(VAULT, USDC, SPENDER, U256::from(400u64))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::InsufficientAllowance { allowance, required, .. }
                if allowance == U256::from(100u64) && required == U256::from(400u64)
        ));
        assert!(!err.is_retryable());
        assert_eq!(h.chain.prepare_calls(), 0);
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_approval_sent_to_spender_destination() {
        let h = harness(false, true);
        h.chain
            .set_return(IERC20::allowanceCall::SELECTOR, U256::from(100u64));
        h.chain
            .set_return(IERC20::approveCall::SELECTOR, true);
        h.custody.add_wallet("wl-usdc", "MATIC_POLYGON", USDC);
        h.custody.add_wallet("wl-router", "MATIC_POLYGON", SPENDER);
        let hash = confirm_first_submission(&h);

        let result = h
            .orchestrator
            .ensure_approval(VAULT, USDC, SPENDER, U256::from(400u64))
            .await
            .unwrap();

        assert_eq!(
            result,
            ApprovalResult::Submitted(Outcome::Succeeded { tx_hash: hash })
        );
        assert_eq!(h.custody.created(), 1);

        let request = &h.custody.requests()[0];
        assert_eq!(request.destination.id.as_deref(), Some("wl-router"));

        let data = alloy::hex::decode(&request.extra_parameters.contract_call_data).unwrap();
        let approve = IERC20::approveCall::abi_decode(&data).unwrap();
        assert_eq!(approve.spender, SPENDER);
        assert_eq!(approve.amount, U256::from(400u64) * U256::from(100_000u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_balance_and_token_metadata() {
        let h = harness(true, false);
        h.chain
            .set_return(IERC20::balanceOfCall::SELECTOR, U256::from(2_500_000u64));
        h.chain.set_return(IERC20::decimalsCall::SELECTOR, U256::from(6u8));
        h.chain
            .set_return(IERC20::symbolCall::SELECTOR, "USDC".to_string());

        let raw = h.orchestrator.current_balance(VAULT, USDC).await.unwrap();
        assert_eq!(raw, U256::from(2_500_000u64));

        let first = h.orchestrator.token_balance(VAULT, USDC).await.unwrap();
        let second = h.orchestrator.token_balance(VAULT, USDC).await.unwrap();
        assert_eq!(first.to_string(), "2.5");
        assert_eq!(first, second);

        let metadata_reads = h
            .chain
            .calls()
            .iter()
            .filter(|c| {
                c.data.starts_with(&IERC20::decimalsCall::SELECTOR)
                    || c.data.starts_with(&IERC20::symbolCall::SELECTOR)
            })
            .count();
        assert_eq!(metadata_reads, 2);
    }

    fn swap_params() -> SwapParams {
        SwapParams {
            amount_in: U256::from(1_000u64),
            min_amount_out: U256::from(1u64),
            path: vec![USDC, WETH],
            recipient: VAULT,
            deadline: 1_700_000_600,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_swap_sends_to_router() {
        let h = harness(false, true);
        let router = UniswapV2Router::quickswap();
        h.chain
            .set_return(IERC20::allowanceCall::SELECTOR, U256::MAX);
        h.chain
            .set_return(IERC20::balanceOfCall::SELECTOR, U256::from(5_000u64));
        let swap = router.swap_call(VAULT, &swap_params());
        let selector: [u8; 4] = swap.data[..4].try_into().unwrap();
        h.chain.set_call_result(selector, Bytes::new());
        h.custody
            .add_wallet("wl-router", "MATIC_POLYGON", router.router());
        let hash = confirm_first_submission(&h);

        let report = h
            .orchestrator
            .execute_swap(&router, VAULT, &swap_params())
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(Outcome::Succeeded { tx_hash: hash }));
        assert_eq!(h.custody.created(), 1);
        assert_eq!(
            h.custody.requests()[0].destination.id.as_deref(),
            Some("wl-router")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_swap_checks_balance() {
        let h = harness(false, true);
        h.chain
            .set_return(IERC20::allowanceCall::SELECTOR, U256::MAX);
        h.chain
            .set_return(IERC20::balanceOfCall::SELECTOR, U256::from(10u64));

        let err = h
            .orchestrator
            .execute_swap(&UniswapV2Router::quickswap(), VAULT, &swap_params())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::InsufficientBalance { .. }));
        assert_eq!(h.custody.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_swap_rejects_empty_path() {
        let h = harness(false, true);
        let params = SwapParams {
            path: Vec::new(),
            ..swap_params()
        };

        let err = h
            .orchestrator
            .execute_swap(&UniswapV2Router::quickswap(), VAULT, &params)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::InvalidInput(_)));
        assert_eq!(h.chain.call_count(), 0);
    }
}
