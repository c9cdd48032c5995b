//! Custody REST payloads.

use super::CustodyApiError;
use alloy::primitives::TxHash;
use custody_domain::{DestinationDescriptor, StatusReport, SubmissionId, TransactionStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Peer kinds understood by the custody service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerType {
    VaultAccount,
    ExternalWallet,
    OneTimeAddress,
}

/// Raw address destination payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeAddress {
    pub address: String,
}

/// Source or destination of a custody transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPeerPath {
    #[serde(rename = "type")]
    pub peer_type: PeerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_address: Option<OneTimeAddress>,
}

impl TransferPeerPath {
    /// A vault account peer.
    pub fn vault(id: impl Into<String>) -> Self {
        Self {
            peer_type: PeerType::VaultAccount,
            id: Some(id.into()),
            one_time_address: None,
        }
    }
}

impl From<&DestinationDescriptor> for TransferPeerPath {
    fn from(destination: &DestinationDescriptor) -> Self {
        match destination {
            DestinationDescriptor::VaultAccount(id) => Self::vault(id.clone()),
            DestinationDescriptor::ExternalWallet(id) => Self {
                peer_type: PeerType::ExternalWallet,
                id: Some(id.clone()),
                one_time_address: None,
            },
            DestinationDescriptor::OneTimeAddress(address) => Self {
                peer_type: PeerType::OneTimeAddress,
                id: None,
                one_time_address: Some(OneTimeAddress {
                    address: address.to_string(),
                }),
            },
        }
    }
}

/// Transaction operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionOperation {
    ContractCall,
}

/// Operation-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraParameters {
    /// `0x`-prefixed call data.
    pub contract_call_data: String,
}

/// Body of `POST /v1/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub operation: TransactionOperation,
    pub asset_id: String,
    pub source: TransferPeerPath,
    pub destination: TransferPeerPath,
    /// Native amount as a decimal string of base units.
    pub amount: String,
    pub note: String,
    pub extra_parameters: ExtraParameters,
    /// Caller-supplied dedup key; the service rejects a second transaction
    /// carrying the same value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_tx_id: Option<String>,
}

/// Response of `POST /v1/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    pub id: String,
    pub status: String,
}

/// Response of `GET /v1/transactions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub sub_status: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

impl TransactionResponse {
    /// Converts to the canonical status report.
    ///
    /// # Errors
    /// Returns [`CustodyApiError::Decode`] for a malformed, non-empty hash.
    pub fn into_report(self) -> Result<StatusReport, CustodyApiError> {
        let tx_hash = match self.tx_hash.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                TxHash::from_str(raw)
                    .map_err(|e| CustodyApiError::Decode(format!("txHash {raw}: {e}")))?,
            ),
        };
        let sub_status = self.sub_status.filter(|s| !s.is_empty());

        Ok(StatusReport {
            id: SubmissionId(self.id),
            status: TransactionStatus::from_custody(&self.status),
            sub_status,
            tx_hash,
        })
    }
}

/// Response of `POST /v1/transactions/{id}/cancel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
}

/// A whitelisted external wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalWallet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assets: Vec<WalletAsset>,
}

/// One asset/address pair under an external wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAsset {
    /// Custody asset id.
    pub id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    #[test]
    fn test_destination_peer_paths() {
        let wallet = TransferPeerPath::from(&DestinationDescriptor::ExternalWallet("wl-1".into()));
        assert_eq!(
            serde_json::to_value(&wallet).unwrap(),
            json!({"type": "EXTERNAL_WALLET", "id": "wl-1"})
        );

        let one_time = TransferPeerPath::from(&DestinationDescriptor::OneTimeAddress(address!(
            "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"
        )));
        assert_eq!(
            serde_json::to_value(&one_time).unwrap(),
            json!({
                "type": "ONE_TIME_ADDRESS",
                "oneTimeAddress": {"address": "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"}
            })
        );
    }

    #[test]
    fn test_create_request_shape() {
        let request = CreateTransactionRequest {
            operation: TransactionOperation::ContractCall,
            asset_id: "ETH".into(),
            source: TransferPeerPath::vault("4"),
            destination: TransferPeerPath::from(&DestinationDescriptor::VaultAccount("7".into())),
            amount: "0".into(),
            note: "approve".into(),
            extra_parameters: ExtraParameters {
                contract_call_data: "0x095ea7b3".into(),
            },
            external_tx_id: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operation"], "CONTRACT_CALL");
        assert_eq!(value["assetId"], "ETH");
        assert_eq!(value["source"], json!({"type": "VAULT_ACCOUNT", "id": "4"}));
        assert_eq!(value["extraParameters"]["contractCallData"], "0x095ea7b3");
        assert!(value.get("externalTxId").is_none());
    }

    #[test]
    fn test_transaction_response_into_report() {
        let response: TransactionResponse = serde_json::from_value(json!({
            "id": "379822f6",
            "status": "CONFIRMING",
            "subStatus": "",
            "txHash": "0x091d798c91fd1ddc5e14ac49d053dc1bb12dc21adf9a99d309f6e3c5617ee816"
        }))
        .unwrap();

        let report = response.into_report().unwrap();
        assert_eq!(report.id, SubmissionId::from("379822f6"));
        assert_eq!(report.status, TransactionStatus::Confirming);
        assert!(report.sub_status.is_none());
        assert!(report.tx_hash.is_some());
    }

    #[test]
    fn test_empty_hash_is_absent_and_bad_hash_is_rejected() {
        let pending = TransactionResponse {
            id: "a".into(),
            status: "QUEUED".into(),
            sub_status: None,
            tx_hash: Some(String::new()),
        };
        assert_eq!(pending.into_report().unwrap().tx_hash, None);

        let malformed = TransactionResponse {
            id: "a".into(),
            status: "BROADCASTING".into(),
            sub_status: None,
            tx_hash: Some("0x1234".into()),
        };
        assert!(matches!(
            malformed.into_report(),
            Err(CustodyApiError::Decode(_))
        ));
    }
}
