//! Transaction builder.

use crate::error::BuildError;
use crate::retry::{RetryPolicy, retry_if};
use custody_domain::{CallDescriptor, RawTransaction};
use custody_protocols::chain::{ChainClient, ChainError};
use std::sync::Arc;
use tracing::info;

/// Configuration for [`TransactionBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuilderConfig {
    /// Retry policy for nonce and gas resolution.
    pub retry: RetryPolicy,
}

/// Turns call descriptors into raw transactions.
///
/// Nonce, gas limit and fees are resolved by the chain node. Only node state
/// is read; nothing is signed or sent.
pub struct TransactionBuilder {
    chain: Arc<dyn ChainClient>,
    config: BuilderConfig,
}

impl TransactionBuilder {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>, config: BuilderConfig) -> Self {
        Self { chain, config }
    }

    /// Builds a raw transaction for `call`.
    ///
    /// Only transient node failures are retried; a revert during gas
    /// estimation fails on the first attempt.
    ///
    /// # Errors
    /// Returns [`BuildError`] with the last cause and the attempts made.
    pub async fn build(&self, call: &CallDescriptor) -> Result<RawTransaction, BuildError> {
        let raw = retry_if(
            "build_transaction",
            self.config.retry,
            ChainError::is_transient,
            |_| self.chain.prepare_transaction(call),
        )
        .await?;

        info!(
            from = %raw.from,
            to = %raw.to,
            nonce = raw.nonce,
            gas_limit = raw.gas_limit,
            chain_id = raw.chain_id,
            "Transaction built"
        );
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{U256, address};
    use std::time::Duration;
    use tokio::time::Instant;
    use custody_protocols::mock::MockChain;

    fn call() -> CallDescriptor {
        CallDescriptor::new(
            address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"),
            vec![0x09, 0x5e, 0xa7, 0xb3],
            address!("0xa1BF30455Dc68807711612CD167450fCD0fde502"),
        )
        .with_value(U256::from(3u64))
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_copies_call_fields() {
        let chain = Arc::new(MockChain::new());
        let builder = TransactionBuilder::new(chain.clone(), BuilderConfig::default());

        let raw = builder.build(&call()).await.unwrap();

        assert_eq!(raw.to, call().target);
        assert_eq!(raw.value, U256::from(3u64));
        assert_eq!(raw.data, call().data);
        assert_eq!(chain.prepare_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_retries_transient_failures() {
        let chain = Arc::new(MockChain::new());
        chain.fail_prepare(3);
        let builder = TransactionBuilder::new(chain.clone(), BuilderConfig::default());

        assert!(builder.build(&call()).await.is_ok());
        assert_eq!(chain.prepare_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_exhaustion() {
        let chain = Arc::new(MockChain::new());
        chain.fail_prepare(10);
        let builder = TransactionBuilder::new(chain.clone(), BuilderConfig::default());

        let err = builder.build(&call()).await.unwrap_err();

        assert_eq!(err.attempts, 4);
        assert!(matches!(err.last, ChainError::Transport(_)));
        assert_eq!(chain.prepare_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_is_not_retried() {
        let chain = Arc::new(MockChain::new());
        chain.revert_prepare(10);
        let builder = TransactionBuilder::new(chain.clone(), BuilderConfig::default());

        let start = Instant::now();
        let err = builder.build(&call()).await.unwrap_err();

        assert_eq!(err.attempts, 1);
        assert!(matches!(err.last, ChainError::Reverted(_)));
        assert_eq!(chain.prepare_calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
