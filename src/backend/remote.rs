//! Remote Backend
//!
//! Adapts the privacy operations onto the third-party pool API. Shields come
//! back unsigned and must go through the signing pipeline; transfers and
//! unshields are settled by the service.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{PrivacyBackend, ShieldResult, TransferResult, UnshieldResult};
use crate::common::{PrivacyError, Result};
use crate::proof::{self, Proof};
use crate::shadowwire::{
    DepositRequest, PoolApi, TransferRequest, TransferType, WithdrawRequest,
};
use crate::tokens::{self, Token, NATIVE_TOKEN};

/// Pool API backed privacy provider
pub struct RemoteBackend {
    api: Arc<dyn PoolApi>,
    /// Wallet that owns the pool account
    wallet: String,
}

impl RemoteBackend {
    pub fn new(api: Arc<dyn PoolApi>, wallet: impl Into<String>) -> Self {
        Self {
            api,
            wallet: wallet.into(),
        }
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }
}

/// A `success: false` reply from the pool, with its message when it sent one
fn rejected(operation: &str, error: Option<String>) -> PrivacyError {
    let message = error.unwrap_or_else(|| "no error message".to_string());
    warn!(target: "privacy_devkit::backend::remote", operation, error = %message, "pool rejected request");
    PrivacyError::upstream(format!("{} rejected: {}", operation, message))
}

/// Reject tokens the pool does not list before any network call
fn supported_token(token: &str) -> Result<&'static Token> {
    tokens::find_token(token).ok_or_else(|| PrivacyError::UnsupportedToken {
        token: token.to_string(),
        supported: tokens::supported_symbols(),
    })
}

#[async_trait]
impl PrivacyBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn shield(&self, amount: u64, token: &str) -> Result<ShieldResult> {
        let token = supported_token(token)?;

        let resp = self
            .api
            .deposit(DepositRequest {
                wallet: self.wallet.clone(),
                amount,
            })
            .await?;

        if !resp.success {
            return Err(rejected("deposit", resp.error));
        }
        debug!(
            target: "privacy_devkit::backend::remote",
            amount, token = token.symbol, "deposit built"
        );

        Ok(ShieldResult {
            success: true,
            transaction_id: None,
            commitment: resp.user_balance_pda,
            unsigned_transaction_base64: resp.unsigned_tx_base64,
        })
    }

    async fn transfer(&self, recipient: &str, amount: u64) -> Result<TransferResult> {
        // The uniform interface carries no token for transfers
        let sol = supported_token(NATIVE_TOKEN)?;
        // the pool takes a decimal amount
        if amount > tokens::MAX_EXACT_AMOUNT {
            return Err(PrivacyError::invalid_input(format!(
                "transfer amount {} exceeds {} lamports",
                amount,
                tokens::MAX_EXACT_AMOUNT
            )));
        }
        info!(
            target: "privacy_devkit::backend::remote",
            "transfer has no token parameter; sending {}", sol.symbol
        );

        let resp = self
            .api
            .transfer(TransferRequest {
                sender: self.wallet.clone(),
                recipient: recipient.to_string(),
                amount: sol.from_smallest_unit(amount),
                token: sol.symbol.to_string(),
                transfer_type: TransferType::Internal,
            })
            .await?;

        if !resp.success {
            return Err(rejected("transfer", resp.error));
        }

        Ok(TransferResult {
            success: true,
            signature: resp.tx_signature,
            slot: None,
        })
    }

    async fn unshield(&self, amount: u64, token: &str) -> Result<UnshieldResult> {
        supported_token(token)?;

        let resp = self
            .api
            .withdraw(WithdrawRequest {
                wallet: self.wallet.clone(),
                amount,
            })
            .await?;

        if !resp.success {
            return Err(rejected("withdraw", resp.error));
        }

        Ok(UnshieldResult {
            success: true,
            transaction_id: resp.tx_signature.clone(),
            signature: resp.tx_signature,
        })
    }

    async fn verify_proof(&self, proof: &Proof, public_inputs: &[String]) -> Result<bool> {
        let Some(commitment) = public_inputs.first() else {
            return Ok(proof::is_well_formed(proof, public_inputs));
        };

        let Some(proof_hex) = proof.to_hex() else {
            debug!(target: "privacy_devkit::backend::remote", "proof is not hex or base64");
            return Ok(false);
        };

        let valid = self
            .api
            .verify_range_proof(proof_hex, commitment.clone())
            .await?;
        Ok(valid)
    }

    async fn shielded_balance(&self, token: &str) -> Result<u64> {
        let token = supported_token(token)?;
        let balance = self
            .api
            .balance(self.wallet.clone(), token.symbol.to_string())
            .await?;
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadowwire::{
        DepositResponse, MockPoolApi, PoolApiError, TransferResponse, WithdrawResponse,
    };
    use mockall::predicate::eq;

    fn backend(api: MockPoolApi) -> RemoteBackend {
        RemoteBackend::new(Arc::new(api), "wallet-1")
    }

    #[tokio::test]
    async fn test_unsupported_token_never_reaches_api() {
        let mut api = MockPoolApi::new();
        api.expect_deposit().times(0);
        api.expect_withdraw().times(0);
        api.expect_balance().times(0);
        let backend = backend(api);

        let err = backend.shield(100, "DOGE").await.unwrap_err();
        match &err {
            PrivacyError::UnsupportedToken { token, supported } => {
                assert_eq!(token, "DOGE");
                assert!(supported.contains("USDC"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(backend.unshield(100, "DOGE").await.is_err());
        assert!(backend.shielded_balance("DOGE").await.is_err());
    }

    #[tokio::test]
    async fn test_shield_returns_unsigned_deposit() {
        let mut api = MockPoolApi::new();
        api.expect_deposit()
            .with(eq(DepositRequest {
                wallet: "wallet-1".to_string(),
                amount: 1_000_000,
            }))
            .times(1)
            .returning(|_| {
                Ok(DepositResponse {
                    success: true,
                    unsigned_tx_base64: Some("AQID".to_string()),
                    user_balance_pda: Some("pda-1".to_string()),
                    error: None,
                })
            });

        let result = backend(api).shield(1_000_000, "SOL").await.unwrap();
        assert!(result.success);
        assert!(result.needs_signing());
        assert_eq!(result.unsigned_transaction_base64.as_deref(), Some("AQID"));
        assert_eq!(result.commitment.as_deref(), Some("pda-1"));
    }

    #[tokio::test]
    async fn test_transfer_converts_lamports_to_sol() {
        let mut api = MockPoolApi::new();
        api.expect_transfer()
            .withf(|req| {
                req.amount == 1.5
                    && req.token == "SOL"
                    && req.sender == "wallet-1"
                    && req.recipient == "bob"
                    && req.transfer_type == TransferType::Internal
            })
            .times(1)
            .returning(|_| {
                Ok(TransferResponse {
                    success: true,
                    tx_signature: Some("sig-1".to_string()),
                    error: None,
                })
            });

        let result = backend(api).transfer("bob", 1_500_000_000).await.unwrap();
        assert!(result.success);
        assert_eq!(result.signature.as_deref(), Some("sig-1"));
    }

    #[tokio::test]
    async fn test_transfer_rejects_amount_beyond_exact_range() {
        let mut api = MockPoolApi::new();
        api.expect_transfer().times(0);

        let err = backend(api)
            .transfer("bob", tokens::MAX_EXACT_AMOUNT + 1)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_unshield_reports_signature_twice() {
        let mut api = MockPoolApi::new();
        api.expect_withdraw().times(1).returning(|_| {
            Ok(WithdrawResponse {
                success: true,
                tx_signature: Some("sig-2".to_string()),
                error: None,
            })
        });

        let result = backend(api).unshield(10, "usdc").await.unwrap();
        assert_eq!(result.signature.as_deref(), Some("sig-2"));
        assert_eq!(result.transaction_id.as_deref(), Some("sig-2"));
    }

    #[tokio::test]
    async fn test_range_proof_delegation() {
        let mut api = MockPoolApi::new();
        api.expect_verify_range_proof()
            .with(eq("deadbeef".to_string()), eq("commitment-1".to_string()))
            .times(1)
            .returning(|_, _| Ok(true));
        let backend = backend(api);

        let inputs = vec!["commitment-1".to_string(), "ignored".to_string()];
        assert!(backend
            .verify_proof(&Proof::from("DEADBEEF"), &inputs)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_verify_without_call() {
        let mut api = MockPoolApi::new();
        api.expect_verify_range_proof().times(0);
        let backend = backend(api);

        // malformed proof with inputs: false, no call
        let inputs = vec!["c".to_string()];
        assert!(!backend
            .verify_proof(&Proof::from("not-hex!"), &inputs)
            .await
            .unwrap());

        // no inputs: format check only
        assert!(backend.verify_proof(&Proof::from("deadbeef"), &[]).await.unwrap());
        assert!(!backend.verify_proof(&Proof::from(""), &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let mut api = MockPoolApi::new();
        api.expect_deposit().returning(|_| {
            Err(PoolApiError::Api {
                status: 503,
                message: "pool paused".to_string(),
            })
        });

        let err = backend(api).shield(1, "SOL").await.unwrap_err();
        assert!(matches!(err, PrivacyError::Upstream(_)));
        assert!(err.to_string().contains("pool paused"));
    }

    #[tokio::test]
    async fn test_unsuccessful_reply_carries_pool_message() {
        let mut api = MockPoolApi::new();
        api.expect_deposit().returning(|_| {
            Ok(DepositResponse {
                success: false,
                unsigned_tx_base64: None,
                user_balance_pda: None,
                error: Some("insufficient balance".to_string()),
            })
        });
        api.expect_transfer().returning(|_| {
            Ok(TransferResponse {
                success: false,
                tx_signature: None,
                error: Some("recipient not registered".to_string()),
            })
        });
        api.expect_withdraw().returning(|_| {
            Ok(WithdrawResponse {
                success: false,
                tx_signature: None,
                error: None,
            })
        });
        let backend = backend(api);

        let err = backend.shield(5, "SOL").await.unwrap_err();
        assert!(matches!(err, PrivacyError::Upstream(_)));
        assert!(err.to_string().contains("insufficient balance"));

        let err = backend.transfer("bob", 5).await.unwrap_err();
        assert!(err.to_string().contains("recipient not registered"));

        let err = backend.unshield(5, "SOL").await.unwrap_err();
        assert!(matches!(err, PrivacyError::Upstream(_)));
        assert!(err.to_string().contains("withdraw rejected"));
    }
}
