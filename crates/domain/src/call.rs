use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// An unsigned contract call supplied by strategy code.
///
/// Created per invocation and consumed by simulation and by the transaction
/// builder. `from` is the custody-held account the call executes as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// Contract being called.
    pub target: Address,
    /// ABI-encoded call data.
    pub data: Bytes,
    /// Native value attached to the call, in wei.
    pub value: U256,
    /// Sender account.
    pub from: Address,
}

impl CallDescriptor {
    /// Creates a zero-value call.
    pub fn new(target: Address, data: impl Into<Bytes>, from: Address) -> Self {
        Self {
            target,
            data: data.into(),
            value: U256::ZERO,
            from,
        }
    }

    /// Attaches native value to the call.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_new_call_has_zero_value() {
        let call = CallDescriptor::new(
            address!("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
            vec![0x09, 0x5e, 0xa7, 0xb3],
            address!("0xa1BF30455Dc68807711612CD167450fCD0fde502"),
        );
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(call.data.len(), 4);

        let call = call.with_value(U256::from(7u64));
        assert_eq!(call.value, U256::from(7u64));
    }
}
