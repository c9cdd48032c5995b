//! Signed REST client for the custody service.

use super::{
    CancelResponse, CreateTransactionRequest, CreateTransactionResponse, CustodyApiError,
    CustodyClient, ExternalWallet, TransactionResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use custody_domain::{StatusReport, SubmissionId};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifetime of a request token in seconds.
const TOKEN_TTL_SECS: i64 = 55;

/// Configuration for the custody REST client.
#[derive(Debug, Clone)]
pub struct CustodyApiConfig {
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// API key sent in `X-API-Key` and as the token subject.
    pub api_key: String,
    /// PEM-encoded RSA private key used to sign requests.
    pub private_key_pem: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CustodyApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fireblocks.io".to_string(),
            api_key: String::new(),
            private_key_pem: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Claims signed into every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestClaims {
    pub uri: String,
    pub nonce: String,
    pub iat: i64,
    pub exp: i64,
    pub sub: String,
    pub body_hash: String,
}

impl RequestClaims {
    fn new(uri: &str, api_key: &str, body: &[u8]) -> Self {
        let now = Utc::now().timestamp();
        Self {
            uri: uri.to_string(),
            nonce: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            sub: api_key.to_string(),
            body_hash: hex::encode(Sha256::digest(body)),
        }
    }
}

/// HTTP client for the custody REST API.
pub struct CustodyApi {
    client: Client,
    key: EncodingKey,
    config: CustodyApiConfig,
}

impl CustodyApi {
    /// Creates a client.
    ///
    /// # Errors
    /// Fails if the private key is not a valid RSA PEM or the HTTP client
    /// cannot be built.
    pub fn new(config: CustodyApiConfig) -> Result<Self, CustodyApiError> {
        let key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            key,
            config,
        })
    }

    fn sign(&self, path: &str, body: &[u8]) -> Result<String, CustodyApiError> {
        let claims = RequestClaims::new(path, &self.config.api_key, body);
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.key)?)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T, CustodyApiError> {
        let payload = body.unwrap_or_default();
        let token = self.sign(path, &payload)?;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        debug!(method = %method, path, "Custody request");

        let mut builder = self
            .client
            .request(method, &url)
            .header("X-API-Key", &self.config.api_key)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        if !payload.is_empty() {
            builder = builder.header(CONTENT_TYPE, "application/json").body(payload);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path, "Custody request failed");
            return Err(CustodyApiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| CustodyApiError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl CustodyClient for CustodyApi {
    async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, CustodyApiError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| CustodyApiError::Decode(format!("encode request: {e}")))?;
        self.request(Method::POST, "/v1/transactions", Some(body))
            .await
    }

    async fn get_transaction(&self, id: &SubmissionId) -> Result<StatusReport, CustodyApiError> {
        let path = format!("/v1/transactions/{id}");
        let response: TransactionResponse = self.request(Method::GET, &path, None).await?;
        response.into_report()
    }

    async fn find_by_external_id(
        &self,
        external_tx_id: &str,
    ) -> Result<Option<StatusReport>, CustodyApiError> {
        let path = format!("/v1/transactions/external_tx_id/{external_tx_id}");
        match self.request::<TransactionResponse>(Method::GET, &path, None).await {
            Ok(response) => response.into_report().map(Some),
            Err(CustodyApiError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn cancel_transaction(&self, id: &SubmissionId) -> Result<(), CustodyApiError> {
        let path = format!("/v1/transactions/{id}/cancel");
        let response: CancelResponse = self.request(Method::POST, &path, None).await?;
        if response.success {
            Ok(())
        } else {
            Err(CustodyApiError::Rejected(format!("cancel of {id} declined")))
        }
    }

    async fn external_wallets(&self) -> Result<Vec<ExternalWallet>, CustodyApiError> {
        self.request(Method::GET, "/v1/external_wallets", None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_bind_body_and_expiry() {
        let claims = RequestClaims::new("/v1/transactions", "key-1", b"{}");

        assert_eq!(claims.uri, "/v1/transactions");
        assert_eq!(claims.sub, "key-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
        assert_eq!(
            claims.body_hash,
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_nonce_is_fresh_per_request() {
        let a = RequestClaims::new("/v1/external_wallets", "k", b"");
        let b = RequestClaims::new("/v1/external_wallets", "k", b"");
        assert_ne!(a.nonce, b.nonce);
        assert_eq!(a.body_hash, b.body_hash);
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let config = CustodyApiConfig {
            api_key: "k".into(),
            private_key_pem: "not a key".into(),
            ..CustodyApiConfig::default()
        };
        assert!(matches!(
            CustodyApi::new(config),
            Err(CustodyApiError::Auth(_))
        ));
    }
}
