use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Fee parameters resolved by the chain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasPricing {
    /// Pre-London single gas price.
    Legacy {
        /// Gas price in wei.
        gas_price: u128,
    },
    /// EIP-1559 fee caps.
    Eip1559 {
        /// Maximum total fee per gas in wei.
        max_fee_per_gas: u128,
        /// Maximum priority fee per gas in wei.
        max_priority_fee_per_gas: u128,
    },
}

/// A fully resolved transaction ready to hand to custody.
///
/// Built once by the transaction builder and never mutated afterwards; the
/// custody bridge only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Sender account.
    pub from: Address,
    /// Contract the transaction executes against.
    pub to: Address,
    /// Native value in wei.
    pub value: U256,
    /// ABI-encoded call data.
    pub data: Bytes,
    /// Sender nonce at build time.
    pub nonce: u64,
    /// Estimated gas limit.
    pub gas_limit: u64,
    /// Fee parameters.
    pub gas: GasPricing,
    /// Chain the transaction was built for.
    pub chain_id: u64,
}

impl RawTransaction {
    /// Returns the call data as a `0x`-prefixed hex string.
    #[must_use]
    pub fn data_hex(&self) -> String {
        self.data.to_string()
    }
}
