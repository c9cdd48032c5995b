//! Protocol capability traits.
//!
//! Adapters encode protocol calls into [`CallDescriptor`]s; the orchestrator
//! owns approval, simulation and submission. Pricing and slippage policy stay
//! with the caller, which passes explicit minimums.

use crate::chain::{ChainClient, ChainError};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use custody_domain::CallDescriptor;

/// Parameters for an exact-input swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    /// Amount of `path[0]` to sell.
    pub amount_in: U256,
    /// Minimum amount of the last path token to receive.
    pub min_amount_out: U256,
    /// Token route, input first.
    pub path: Vec<Address>,
    /// Receiver of the output token.
    pub recipient: Address,
    /// Unix timestamp after which the swap reverts.
    pub deadline: u64,
}

impl SwapParams {
    /// Input token of the route.
    #[must_use]
    pub fn token_in(&self) -> Option<Address> {
        self.path.first().copied()
    }
}

/// Parameters for adding liquidity to a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a: U256,
    pub amount_b: U256,
    pub min_amount_a: U256,
    pub min_amount_b: U256,
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters for removing liquidity from a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    /// LP tokens to burn.
    pub liquidity: U256,
    pub min_amount_a: U256,
    pub min_amount_b: U256,
    pub recipient: Address,
    pub deadline: u64,
}

/// A venue that swaps tokens and manages pair liquidity.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Human-readable venue name.
    fn name(&self) -> &str;

    /// Contract that must be approved to pull input tokens.
    fn spender(&self) -> Address;

    /// Encodes an exact-input swap sent by `from`.
    fn swap_call(&self, from: Address, params: &SwapParams) -> CallDescriptor;

    fn add_liquidity_call(&self, from: Address, params: &AddLiquidityParams) -> CallDescriptor;

    fn remove_liquidity_call(&self, from: Address, params: &RemoveLiquidityParams)
    -> CallDescriptor;

    /// Quotes the output amount for `amount_in` along `path`.
    async fn quote(
        &self,
        chain: &dyn ChainClient,
        amount_in: U256,
        path: &[Address],
    ) -> Result<U256, ChainError>;
}

/// A money market.
pub trait Lending: Send + Sync {
    /// Contract that must be approved to pull supplied or repaid assets.
    fn spender(&self) -> Address;

    fn supply_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor;

    /// Borrows at a variable rate.
    fn borrow_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor;

    fn repay_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor;

    fn withdraw_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor;
}

/// A staking or farming contract.
#[async_trait]
pub trait Staking: Send + Sync {
    /// Token staked into the contract.
    fn staking_token(&self) -> Address;

    /// Contract that must be approved to pull the staking token.
    fn spender(&self) -> Address;

    fn stake_call(&self, from: Address, amount: U256) -> CallDescriptor;

    fn unstake_call(&self, from: Address, amount: U256) -> CallDescriptor;

    fn claim_rewards_call(&self, from: Address) -> CallDescriptor;

    /// Reads the amount currently staked by `account`.
    async fn staked_balance(
        &self,
        chain: &dyn ChainClient,
        account: Address,
    ) -> Result<U256, ChainError>;
}
