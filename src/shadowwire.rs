//! Privacy Pool API Client
//!
//! HTTP client for the third-party privacy-transfer service (ShadowWire
//! pool API). The service holds the private pool: deposits come back as
//! unsigned transactions for the user to sign, internal transfers and
//! withdrawals are signed and settled by the service itself.
//!
//! [`PoolApi`] is the seam the remote backend depends on; [`ShadowWireClient`]
//! is the reqwest implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default pool API endpoint
pub const DEFAULT_API_URL: &str = "https://shadow.radr.fun/shadowpay/api";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositRequest {
    pub wallet: String,
    /// Smallest units
    pub amount: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepositResponse {
    pub success: bool,
    /// Base64 unsigned transaction the depositor must sign and send
    #[serde(default)]
    pub unsigned_tx_base64: Option<String>,
    /// The depositor's balance account in the pool
    #[serde(default)]
    pub user_balance_pda: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawRequest {
    pub wallet: String,
    /// Smallest units
    pub amount: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WithdrawResponse {
    pub success: bool,
    #[serde(default)]
    pub tx_signature: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Transfer kind. Only internal transfers, which stay inside the pool, are
/// issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub sender: String,
    pub recipient: String,
    /// Human decimal amount (1.5 = 1.5 SOL)
    pub amount: f64,
    pub token: String,
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferResponse {
    pub success: bool,
    #[serde(default)]
    pub tx_signature: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RangeProofRequest<'a> {
    proof: &'a str,
    commitment: &'a str,
}

#[derive(Debug, Deserialize)]
struct RangeProofResponse {
    valid: bool,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    available: u64,
}

// ============================================================================
// API Trait
// ============================================================================

/// Operations offered by the privacy pool service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PoolApi: Send + Sync {
    /// Build a deposit; returns an unsigned transaction
    async fn deposit(&self, request: DepositRequest) -> Result<DepositResponse, PoolApiError>;

    /// Withdraw from the pool to the wallet (settled by the service)
    async fn withdraw(&self, request: WithdrawRequest) -> Result<WithdrawResponse, PoolApiError>;

    /// Transfer between pool accounts (settled by the service)
    async fn transfer(&self, request: TransferRequest) -> Result<TransferResponse, PoolApiError>;

    /// Bulletproof range-proof verification against a commitment
    async fn verify_range_proof(
        &self,
        proof_hex: String,
        commitment: String,
    ) -> Result<bool, PoolApiError>;

    /// Shielded balance of `wallet` in smallest units
    async fn balance(&self, wallet: String, token: String) -> Result<u64, PoolApiError>;
}

// ============================================================================
// HTTP Client
// ============================================================================

/// Pool API HTTP client
#[derive(Debug, Clone)]
pub struct ShadowWireClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ShadowWireClient {
    /// Create a new client with custom URL
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Client for the public endpoint
    pub fn with_default_url(api_key: Option<String>) -> Self {
        Self::new(DEFAULT_API_URL, api_key)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, PoolApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(target: "privacy_devkit::shadowwire", %url, "POST");
        let resp = self.authorized(self.client.post(&url)).json(body).send().await?;
        Self::decode(resp).await
    }

    async fn decode<R: DeserializeOwned>(resp: Response) -> Result<R, PoolApiError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PoolApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json()
            .await
            .map_err(|e| PoolApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl PoolApi for ShadowWireClient {
    async fn deposit(&self, request: DepositRequest) -> Result<DepositResponse, PoolApiError> {
        self.post("/pool/deposit", &request).await
    }

    async fn withdraw(&self, request: WithdrawRequest) -> Result<WithdrawResponse, PoolApiError> {
        self.post("/pool/withdraw", &request).await
    }

    async fn transfer(&self, request: TransferRequest) -> Result<TransferResponse, PoolApiError> {
        self.post("/zk/internal-transfer", &request).await
    }

    async fn verify_range_proof(
        &self,
        proof_hex: String,
        commitment: String,
    ) -> Result<bool, PoolApiError> {
        let body = RangeProofRequest {
            proof: &proof_hex,
            commitment: &commitment,
        };
        let resp: RangeProofResponse = self.post("/zk/verify-range-proof", &body).await?;
        Ok(resp.valid)
    }

    async fn balance(&self, wallet: String, token: String) -> Result<u64, PoolApiError> {
        let url = format!("{}/pool/balance/{}", self.base_url, wallet);
        let resp = self
            .authorized(self.client.get(&url).query(&[("token", token.as_str())]))
            .send()
            .await?;
        let balance: BalanceResponse = Self::decode(resp).await?;
        Ok(balance.available)
    }
}

/// Pool API error types
#[derive(Debug, thiserror::Error)]
pub enum PoolApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("pool API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };

    /// Serve `router` on an ephemeral local port and return its base URL
    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_urls() {
        let client = ShadowWireClient::new("http://localhost:9000/api/", None);
        assert_eq!(client.base_url(), "http://localhost:9000/api");

        let default = ShadowWireClient::with_default_url(None);
        assert_eq!(default.base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_transfer_request_wire_shape() {
        let req = TransferRequest {
            sender: "alice".to_string(),
            recipient: "bob".to_string(),
            amount: 0.5,
            token: "SOL".to_string(),
            transfer_type: TransferType::Internal,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "internal");
        assert_eq!(json["amount"], 0.5);
    }

    #[tokio::test]
    async fn test_deposit_against_local_server() {
        let router = Router::new().route(
            "/pool/deposit",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "secret");
                assert_eq!(body["wallet"], "wallet-1");
                assert_eq!(body["amount"], 42);
                Json(serde_json::json!({
                    "success": true,
                    "unsigned_tx_base64": "AQID",
                    "user_balance_pda": "pda-1"
                }))
            }),
        );
        let url = spawn_server(router).await;
        let client = ShadowWireClient::new(&url, Some("secret".to_string()));

        let resp = client
            .deposit(DepositRequest {
                wallet: "wallet-1".to_string(),
                amount: 42,
            })
            .await
            .unwrap();

        assert!(resp.success);
        assert_eq!(resp.unsigned_tx_base64.as_deref(), Some("AQID"));
        assert_eq!(resp.user_balance_pda.as_deref(), Some("pda-1"));
    }

    #[tokio::test]
    async fn test_error_status_carries_upstream_message() {
        let router = Router::new()
            .route(
                "/pool/withdraw",
                post(|| async { (StatusCode::BAD_REQUEST, "insufficient shielded balance") }),
            )
            .route(
                "/pool/balance/:wallet",
                get(|Path(wallet): Path<String>| async move {
                    assert_eq!(wallet, "wallet-2");
                    Json(serde_json::json!({ "available": 1234 }))
                }),
            );
        let url = spawn_server(router).await;
        let client = ShadowWireClient::new(&url, None);

        let err = client
            .withdraw(WithdrawRequest {
                wallet: "wallet-2".to_string(),
                amount: 10,
            })
            .await
            .unwrap_err();
        match err {
            PoolApiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "insufficient shielded balance");
            }
            other => panic!("unexpected error: {other}"),
        }

        let balance = client
            .balance("wallet-2".to_string(), "SOL".to_string())
            .await
            .unwrap();
        assert_eq!(balance, 1234);
    }
}
