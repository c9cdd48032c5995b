//! Aave V3 pool adapter.

use crate::capabilities::Lending;
use alloy::primitives::{Address, U256, address};
use alloy::sol;
use alloy::sol_types::SolCall;
use custody_domain::CallDescriptor;

/// Aave V3 pool, same address on Polygon, Arbitrum, Optimism and Avalanche.
pub const AAVE_V3_POOL: Address = address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD");

/// Variable interest rate mode.
const VARIABLE_RATE: u64 = 2;

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IAaveV3Pool {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function borrow(address asset, uint256 amount, uint256 interestRateMode, uint16 referralCode, address onBehalfOf) external;
        function repay(address asset, uint256 amount, uint256 interestRateMode, address onBehalfOf) external returns (uint256);
        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
    }
}

/// Lending adapter for an Aave V3 pool deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AaveV3Pool {
    pool: Address,
}

impl AaveV3Pool {
    #[must_use]
    pub fn new(pool: Address) -> Self {
        Self { pool }
    }
}

impl Default for AaveV3Pool {
    fn default() -> Self {
        Self::new(AAVE_V3_POOL)
    }
}

impl Lending for AaveV3Pool {
    fn spender(&self) -> Address {
        self.pool
    }

    fn supply_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor {
        let data = IAaveV3Pool::supplyCall {
            asset,
            amount,
            onBehalfOf: from,
            referralCode: 0,
        }
        .abi_encode();
        CallDescriptor::new(self.pool, data, from)
    }

    fn borrow_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor {
        let data = IAaveV3Pool::borrowCall {
            asset,
            amount,
            interestRateMode: U256::from(VARIABLE_RATE),
            referralCode: 0,
            onBehalfOf: from,
        }
        .abi_encode();
        CallDescriptor::new(self.pool, data, from)
    }

    fn repay_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor {
        let data = IAaveV3Pool::repayCall {
            asset,
            amount,
            interestRateMode: U256::from(VARIABLE_RATE),
            onBehalfOf: from,
        }
        .abi_encode();
        CallDescriptor::new(self.pool, data, from)
    }

    fn withdraw_call(&self, from: Address, asset: Address, amount: U256) -> CallDescriptor {
        let data = IAaveV3Pool::withdrawCall {
            asset,
            amount,
            to: from,
        }
        .abi_encode();
        CallDescriptor::new(self.pool, data, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_uses_variable_rate() {
        let pool = AaveV3Pool::default();
        let user = address!("0xa1BF30455Dc68807711612CD167450fCD0fde502");
        let usdc = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

        let call = pool.borrow_call(user, usdc, U256::from(1_000_000u64));
        let decoded = IAaveV3Pool::borrowCall::abi_decode(&call.data).unwrap();

        assert_eq!(call.target, AAVE_V3_POOL);
        assert_eq!(decoded.interestRateMode, U256::from(2u64));
        assert_eq!(decoded.onBehalfOf, user);
    }

    #[test]
    fn test_withdraw_returns_to_sender() {
        let user = address!("0xa1BF30455Dc68807711612CD167450fCD0fde502");
        let call = AaveV3Pool::default().withdraw_call(user, Address::ZERO, U256::MAX);
        let decoded = IAaveV3Pool::withdrawCall::abi_decode(&call.data).unwrap();
        assert_eq!(decoded.to, user);
        assert_eq!(decoded.amount, U256::MAX);
    }
}
