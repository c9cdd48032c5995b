//! Uniswap V2 style router adapter.

use crate::capabilities::{AddLiquidityParams, Exchange, RemoveLiquidityParams, SwapParams};
use crate::chain::{ChainClient, ChainError};
use alloy::primitives::{Address, U256, address};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use custody_domain::CallDescriptor;

/// Uniswap V2 router on Ethereum mainnet.
pub const UNISWAP_V2_ROUTER: Address = address!("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// QuickSwap router on Polygon.
pub const QUICKSWAP_ROUTER: Address = address!("0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff");

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path)
            external view returns (uint256[] memory amounts);

        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);

        function addLiquidity(
            address tokenA,
            address tokenB,
            uint256 amountADesired,
            uint256 amountBDesired,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);

        function removeLiquidity(
            address tokenA,
            address tokenB,
            uint256 liquidity,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB);
    }
}

/// Router adapter for Uniswap V2 and its forks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniswapV2Router {
    name: String,
    router: Address,
}

impl UniswapV2Router {
    /// Creates an adapter for a router deployment.
    pub fn new(name: impl Into<String>, router: Address) -> Self {
        Self {
            name: name.into(),
            router,
        }
    }

    /// Uniswap V2 on Ethereum mainnet.
    #[must_use]
    pub fn uniswap() -> Self {
        Self::new("uniswap", UNISWAP_V2_ROUTER)
    }

    /// QuickSwap on Polygon.
    #[must_use]
    pub fn quickswap() -> Self {
        Self::new("quickswap", QUICKSWAP_ROUTER)
    }

    /// Router contract address.
    #[must_use]
    pub fn router(&self) -> Address {
        self.router
    }
}

#[async_trait]
impl Exchange for UniswapV2Router {
    fn name(&self) -> &str {
        &self.name
    }

    fn spender(&self) -> Address {
        self.router
    }

    fn swap_call(&self, from: Address, params: &SwapParams) -> CallDescriptor {
        let data = IUniswapV2Router02::swapExactTokensForTokensCall {
            amountIn: params.amount_in,
            amountOutMin: params.min_amount_out,
            path: params.path.clone(),
            to: params.recipient,
            deadline: U256::from(params.deadline),
        }
        .abi_encode();
        CallDescriptor::new(self.router, data, from)
    }

    fn add_liquidity_call(&self, from: Address, params: &AddLiquidityParams) -> CallDescriptor {
        let data = IUniswapV2Router02::addLiquidityCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            amountADesired: params.amount_a,
            amountBDesired: params.amount_b,
            amountAMin: params.min_amount_a,
            amountBMin: params.min_amount_b,
            to: params.recipient,
            deadline: U256::from(params.deadline),
        }
        .abi_encode();
        CallDescriptor::new(self.router, data, from)
    }

    fn remove_liquidity_call(
        &self,
        from: Address,
        params: &RemoveLiquidityParams,
    ) -> CallDescriptor {
        let data = IUniswapV2Router02::removeLiquidityCall {
            tokenA: params.token_a,
            tokenB: params.token_b,
            liquidity: params.liquidity,
            amountAMin: params.min_amount_a,
            amountBMin: params.min_amount_b,
            to: params.recipient,
            deadline: U256::from(params.deadline),
        }
        .abi_encode();
        CallDescriptor::new(self.router, data, from)
    }

    async fn quote(
        &self,
        chain: &dyn ChainClient,
        amount_in: U256,
        path: &[Address],
    ) -> Result<U256, ChainError> {
        let data = IUniswapV2Router02::getAmountsOutCall {
            amountIn: amount_in,
            path: path.to_vec(),
        }
        .abi_encode();
        let raw = chain
            .call(&CallDescriptor::new(self.router, data, Address::ZERO))
            .await?;
        let amounts = IUniswapV2Router02::getAmountsOutCall::abi_decode_returns(&raw)
            .map_err(|e| ChainError::Decode(format!("getAmountsOut: {e}")))?;
        amounts
            .last()
            .copied()
            .ok_or_else(|| ChainError::Decode("getAmountsOut returned no amounts".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
    const VAULT: Address = address!("0xa1BF30455Dc68807711612CD167450fCD0fde502");

    #[test]
    fn test_swap_call_targets_router() {
        let router = UniswapV2Router::uniswap();
        let params = SwapParams {
            amount_in: U256::from(1_000u64),
            min_amount_out: U256::from(900u64),
            path: vec![USDC, WETH],
            recipient: VAULT,
            deadline: 1_700_000_600,
        };

        let call = router.swap_call(VAULT, &params);

        assert_eq!(call.target, UNISWAP_V2_ROUTER);
        assert_eq!(call.from, VAULT);
        assert_eq!(router.spender(), UNISWAP_V2_ROUTER);
        assert_eq!(params.token_in(), Some(USDC));

        let decoded =
            IUniswapV2Router02::swapExactTokensForTokensCall::abi_decode(&call.data).unwrap();
        assert_eq!(decoded.amountIn, U256::from(1_000u64));
        assert_eq!(decoded.amountOutMin, U256::from(900u64));
        assert_eq!(decoded.path, vec![USDC, WETH]);
        assert_eq!(decoded.deadline, U256::from(1_700_000_600u64));
    }

    #[test]
    fn test_liquidity_calls() {
        let router = UniswapV2Router::quickswap();
        assert_eq!(router.name(), "quickswap");

        let add = router.add_liquidity_call(
            VAULT,
            &AddLiquidityParams {
                token_a: USDC,
                token_b: WETH,
                amount_a: U256::from(10u64),
                amount_b: U256::from(20u64),
                min_amount_a: U256::from(9u64),
                min_amount_b: U256::from(18u64),
                recipient: VAULT,
                deadline: 1,
            },
        );
        assert_eq!(&add.data[..4], &IUniswapV2Router02::addLiquidityCall::SELECTOR);

        let remove = router.remove_liquidity_call(
            VAULT,
            &RemoveLiquidityParams {
                token_a: USDC,
                token_b: WETH,
                liquidity: U256::from(5u64),
                min_amount_a: U256::ZERO,
                min_amount_b: U256::ZERO,
                recipient: VAULT,
                deadline: 1,
            },
        );
        let decoded = IUniswapV2Router02::removeLiquidityCall::abi_decode(&remove.data).unwrap();
        assert_eq!(decoded.liquidity, U256::from(5u64));
        assert_eq!(remove.target, QUICKSWAP_ROUTER);
    }

    #[tokio::test]
    async fn test_quote_reads_last_amount() {
        use crate::mock::MockChain;

        let chain = MockChain::new();
        chain.set_return(
            IUniswapV2Router02::getAmountsOutCall::SELECTOR,
            vec![U256::from(1_000u64), U256::from(497u64)],
        );

        let out = UniswapV2Router::uniswap()
            .quote(&chain, U256::from(1_000u64), &[USDC, WETH])
            .await
            .unwrap();

        assert_eq!(out, U256::from(497u64));
        assert_eq!(chain.calls()[0].target, UNISWAP_V2_ROUTER);
    }
}
