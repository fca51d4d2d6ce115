//! Solana Ledger RPC
//!
//! The client owns exactly one ledger connection. Only three calls are
//! needed: public balance, transaction submission and signature status
//! polling for the signing pipeline.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use std::str::FromStr;

// ============================================================================
// Types
// ============================================================================

/// Status of a submitted transaction at `confirmed` commitment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet seen at the requested commitment
    Pending,
    Confirmed,
    /// Landed but the transaction failed
    Failed(String),
}

/// Parse a base58 address
pub fn parse_pubkey(s: &str) -> Result<Pubkey, RpcError> {
    Pubkey::from_str(s.trim()).map_err(|e| RpcError::InvalidAddress(format!("{}: {}", s, e)))
}

// ============================================================================
// RPC Trait
// ============================================================================

/// Ledger operations used by the client and the signing pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Public balance in lamports
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError>;

    /// Submit a signed transaction (with preflight)
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, RpcError>;

    async fn signature_status(&self, signature: &Signature) -> Result<SignatureStatus, RpcError>;
}

// ============================================================================
// Solana RPC Client
// ============================================================================

/// Nonblocking JSON-RPC connection at `confirmed` commitment
pub struct SolanaRpc {
    rpc: RpcClient,
}

impl SolanaRpc {
    pub fn new(rpc_url: &str) -> Self {
        let rpc =
            RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());
        Self { rpc }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        self.rpc
            .get_balance(address)
            .await
            .map_err(|e| RpcError::RpcError(e.to_string()))
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, RpcError> {
        self.rpc
            .send_transaction(transaction)
            .await
            .map_err(|e| RpcError::Rejected(e.to_string()))
    }

    async fn signature_status(&self, signature: &Signature) -> Result<SignatureStatus, RpcError> {
        let status = self
            .rpc
            .get_signature_status_with_commitment(signature, CommitmentConfig::confirmed())
            .await
            .map_err(|e| RpcError::RpcError(e.to_string()))?;

        Ok(match status {
            None => SignatureStatus::Pending,
            Some(Ok(())) => SignatureStatus::Confirmed,
            Some(Err(err)) => SignatureStatus::Failed(err.to_string()),
        })
    }
}

/// Ledger RPC errors
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The node refused the transaction (preflight or send failure)
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("RPC error: {0}")]
    RpcError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pubkey() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_pubkey(&key.to_string()).unwrap(), key);
        assert_eq!(parse_pubkey(&format!(" {} ", key)).unwrap(), key);
        assert!(matches!(
            parse_pubkey("not-an-address"),
            Err(RpcError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_client_keeps_url() {
        let rpc = SolanaRpc::new("http://127.0.0.1:8899");
        assert_eq!(rpc.url(), "http://127.0.0.1:8899");
    }
}
