//! HTTP JSON-RPC implementation of [`ChainClient`].

use super::{ChainClient, ChainError, ReceiptInfo};
use alloy::consensus::{Eip658Value, TxReceipt};
use alloy::primitives::{Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionInput, TransactionRequest};
use alloy::transports::TransportError;
use async_trait::async_trait;
use custody_domain::{CallDescriptor, GasPricing, RawTransaction};
use tracing::debug;

/// Configuration for the RPC provider.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// HTTP endpoint of the chain node.
    pub url: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
        }
    }
}

impl RpcConfig {
    /// Creates a configuration for an endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Chain node client over HTTP.
pub struct RpcProvider {
    provider: DynProvider,
    config: RpcConfig,
}

impl RpcProvider {
    /// Creates a provider for the configured endpoint.
    ///
    /// # Errors
    /// Returns [`ChainError::InvalidUrl`] if the endpoint does not parse.
    pub fn new(config: RpcConfig) -> Result<Self, ChainError> {
        let url = config
            .url
            .parse()
            .map_err(|e| ChainError::InvalidUrl(format!("{}: {e}", config.url)))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url)
            .erased();
        Ok(Self { provider, config })
    }

    /// Endpoint this provider talks to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn request_for(call: &CallDescriptor) -> TransactionRequest {
        TransactionRequest::default()
            .from(call.from)
            .to(call.target)
            .value(call.value)
            .input(TransactionInput::new(call.data.clone()))
    }
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => ChainError::from_rpc(payload.code, payload.message.to_string()),
            None => ChainError::Transport(err.to_string()),
        }
    }
}

#[async_trait]
impl ChainClient for RpcProvider {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn call(&self, call: &CallDescriptor) -> Result<Bytes, ChainError> {
        Ok(self.provider.call(Self::request_for(call)).await?)
    }

    async fn prepare_transaction(
        &self,
        call: &CallDescriptor,
    ) -> Result<RawTransaction, ChainError> {
        let request = Self::request_for(call);

        let chain_id = self.provider.get_chain_id().await?;
        let nonce = self
            .provider
            .get_transaction_count(call.from)
            .pending()
            .await?;
        let gas_limit = self.provider.estimate_gas(request).await?;

        let gas = match self.provider.estimate_eip1559_fees().await {
            Ok(fees) => GasPricing::Eip1559 {
                max_fee_per_gas: fees.max_fee_per_gas,
                max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            },
            Err(e) => {
                debug!(error = %e, "EIP-1559 fee estimation unavailable, using legacy gas price");
                GasPricing::Legacy {
                    gas_price: self.provider.get_gas_price().await?,
                }
            }
        };

        debug!(
            from = %call.from,
            to = %call.target,
            nonce,
            gas_limit,
            chain_id,
            "Prepared transaction"
        );

        Ok(RawTransaction {
            from: call.from,
            to: call.target,
            value: call.value,
            data: call.data.clone(),
            nonce,
            gas_limit,
            gas,
            chain_id,
        })
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError> {
        let Some(receipt) = self.provider.get_transaction_receipt(hash).await? else {
            return Ok(None);
        };

        let status = match receipt.inner.status_or_post_state() {
            Eip658Value::Eip658(success) => Some(success),
            Eip658Value::PostState(_) => None,
        };

        Ok(Some(ReceiptInfo {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status,
        }))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>, ChainError> {
        Ok(self.provider.get_logs(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{U256, address};

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RpcProvider::new(RpcConfig::new("not a url"));
        assert!(matches!(result, Err(ChainError::InvalidUrl(_))));
    }

    #[test]
    fn test_request_carries_call_fields() {
        let call = CallDescriptor::new(
            address!("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
            vec![0xde, 0xad],
            address!("0xa1BF30455Dc68807711612CD167450fCD0fde502"),
        )
        .with_value(U256::from(5u64));

        let request = RpcProvider::request_for(&call);
        assert_eq!(request.from, Some(call.from));
        assert_eq!(request.value, Some(U256::from(5u64)));
        assert_eq!(request.input.input().cloned(), Some(call.data.clone()));
    }
}
