//! Synthetix-style `StakingRewards` adapter, as used by QuickSwap LP farms.

use crate::capabilities::Staking;
use crate::chain::{ChainClient, ChainError};
use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use custody_domain::CallDescriptor;

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IStakingRewards {
        function stake(uint256 amount) external;
        function withdraw(uint256 amount) external;
        function getReward() external;
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Staking adapter for a single rewards contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakingRewards {
    contract: Address,
    staking_token: Address,
}

impl StakingRewards {
    #[must_use]
    pub fn new(contract: Address, staking_token: Address) -> Self {
        Self {
            contract,
            staking_token,
        }
    }
}

#[async_trait]
impl Staking for StakingRewards {
    fn staking_token(&self) -> Address {
        self.staking_token
    }

    fn spender(&self) -> Address {
        self.contract
    }

    fn stake_call(&self, from: Address, amount: U256) -> CallDescriptor {
        CallDescriptor::new(self.contract, IStakingRewards::stakeCall { amount }.abi_encode(), from)
    }

    fn unstake_call(&self, from: Address, amount: U256) -> CallDescriptor {
        CallDescriptor::new(
            self.contract,
            IStakingRewards::withdrawCall { amount }.abi_encode(),
            from,
        )
    }

    fn claim_rewards_call(&self, from: Address) -> CallDescriptor {
        CallDescriptor::new(self.contract, IStakingRewards::getRewardCall {}.abi_encode(), from)
    }

    async fn staked_balance(
        &self,
        chain: &dyn ChainClient,
        account: Address,
    ) -> Result<U256, ChainError> {
        let data = IStakingRewards::balanceOfCall { account }.abi_encode();
        let raw = chain
            .call(&CallDescriptor::new(self.contract, data, account))
            .await?;
        IStakingRewards::balanceOfCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(format!("balanceOf: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_unstake_encodes_withdraw() {
        let farm = StakingRewards::new(
            address!("0x8FF56b5325446aAe6EfBf006a4C1D88e4935a914"),
            address!("0x853Ee4b2A13f8a742d64C8F088bE7bA2131f670d"),
        );
        let user = address!("0xa1BF30455Dc68807711612CD167450fCD0fde502");

        let call = farm.unstake_call(user, U256::from(7u64));
        assert_eq!(&call.data[..4], &IStakingRewards::withdrawCall::SELECTOR);
        assert_eq!(farm.spender(), call.target);
        assert_eq!(
            farm.claim_rewards_call(user).data.as_ref(),
            IStakingRewards::getRewardCall::SELECTOR.as_slice()
        );
    }
}
