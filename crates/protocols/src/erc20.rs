//! ERC-20 bindings used by the approval and balance flows.

use crate::chain::{ChainClient, ChainError};
use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use custody_domain::{CallDescriptor, Token};

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Builds an `approve(spender, amount)` call on `token` sent by `owner`.
#[must_use]
pub fn approve_call(token: Address, owner: Address, spender: Address, amount: U256) -> CallDescriptor {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    CallDescriptor::new(token, data, owner)
}

/// Builds a `transfer(to, amount)` call on `token` sent by `owner`.
#[must_use]
pub fn transfer_call(token: Address, owner: Address, to: Address, amount: U256) -> CallDescriptor {
    let data = IERC20::transferCall { to, amount }.abi_encode();
    CallDescriptor::new(token, data, owner)
}

async fn read<C: SolCall>(
    chain: &dyn ChainClient,
    token: Address,
    from: Address,
    call: C,
) -> Result<C::Return, ChainError> {
    let descriptor = CallDescriptor::new(token, call.abi_encode(), from);
    let raw = chain.call(&descriptor).await?;
    C::abi_decode_returns(&raw).map_err(|e| ChainError::Decode(format!("{}: {e}", C::SIGNATURE)))
}

/// Reads `allowance(owner, spender)`.
pub async fn read_allowance(
    chain: &dyn ChainClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256, ChainError> {
    read(chain, token, owner, IERC20::allowanceCall { owner, spender }).await
}

/// Reads `balanceOf(account)`.
pub async fn read_balance(
    chain: &dyn ChainClient,
    token: Address,
    account: Address,
) -> Result<U256, ChainError> {
    read(chain, token, account, IERC20::balanceOfCall { account }).await
}

/// Reads `decimals()`.
pub async fn read_decimals(chain: &dyn ChainClient, token: Address) -> Result<u8, ChainError> {
    read(chain, token, Address::ZERO, IERC20::decimalsCall {}).await
}

/// Reads `symbol()`.
pub async fn read_symbol(chain: &dyn ChainClient, token: Address) -> Result<String, ChainError> {
    read(chain, token, Address::ZERO, IERC20::symbolCall {}).await
}

/// Reads decimals and symbol into a [`Token`].
pub async fn read_token(chain: &dyn ChainClient, token: Address) -> Result<Token, ChainError> {
    let decimals = read_decimals(chain, token).await?;
    let symbol = read_symbol(chain, token).await?;
    Ok(Token::new(token, symbol, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_approve_call_encoding() {
        let token = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
        let owner = address!("0xa1BF30455Dc68807711612CD167450fCD0fde502");
        let spender = address!("0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff");

        let call = approve_call(token, owner, spender, U256::from(40_000_000u64));

        assert_eq!(call.target, token);
        assert_eq!(call.from, owner);
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(&call.data[..4], &IERC20::approveCall::SELECTOR);

        let decoded = IERC20::approveCall::abi_decode(&call.data).unwrap();
        assert_eq!(decoded.spender, spender);
        assert_eq!(decoded.amount, U256::from(40_000_000u64));
    }
}
