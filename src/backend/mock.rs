//! Mock Backend
//!
//! Local stand-in for development and tests. Every operation succeeds with
//! generated identifiers and nothing touches the network. Shielded amounts
//! are tallied per token in memory and lost when the process exits.

use async_trait::async_trait;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::{PrivacyBackend, ShieldResult, TransferResult, UnshieldResult};
use crate::common::Result;
use crate::proof::{self, Proof};

/// In-memory mock backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Shielded minus unshielded, keyed by upper-case token symbol
    balances: Arc<RwLock<HashMap<String, u64>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Unique id: operation, millisecond timestamp, random suffix
fn mock_id(operation: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "mock-tx-{}-{}-{}",
        operation,
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// Random 32-byte value, hex encoded
fn mock_commitment() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Random 64-byte value, base58 encoded (shaped like a ledger signature)
fn mock_signature() -> String {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    bs58::encode(bytes).into_string()
}

#[async_trait]
impl PrivacyBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn shield(&self, amount: u64, token: &str) -> Result<ShieldResult> {
        let transaction_id = mock_id("shield");
        let commitment = mock_commitment();

        {
            let mut balances = self.balances.write().await;
            let entry = balances.entry(token.to_uppercase()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }

        info!(
            target: "privacy_devkit::backend::mock",
            amount, token, %transaction_id, "simulated shield"
        );

        Ok(ShieldResult {
            success: true,
            transaction_id: Some(transaction_id),
            commitment: Some(commitment),
            unsigned_transaction_base64: None,
        })
    }

    async fn transfer(&self, recipient: &str, amount: u64) -> Result<TransferResult> {
        let signature = mock_signature();

        info!(
            target: "privacy_devkit::backend::mock",
            amount, recipient, %signature, "simulated private transfer"
        );

        Ok(TransferResult {
            success: true,
            signature: Some(signature),
            slot: None,
        })
    }

    async fn unshield(&self, amount: u64, token: &str) -> Result<UnshieldResult> {
        let transaction_id = mock_id("unshield");

        {
            let mut balances = self.balances.write().await;
            let entry = balances.entry(token.to_uppercase()).or_insert(0);
            *entry = entry.saturating_sub(amount);
        }

        info!(
            target: "privacy_devkit::backend::mock",
            amount, token, %transaction_id, "simulated unshield"
        );

        Ok(UnshieldResult {
            success: true,
            transaction_id: Some(transaction_id),
            signature: Some(mock_signature()),
        })
    }

    async fn verify_proof(&self, proof: &Proof, public_inputs: &[String]) -> Result<bool> {
        let valid = proof::is_well_formed(proof, public_inputs);
        info!(
            target: "privacy_devkit::backend::mock",
            valid, proof_len = proof.len(), "format-only proof check"
        );
        Ok(valid)
    }

    async fn shielded_balance(&self, token: &str) -> Result<u64> {
        let balances = self.balances.read().await;
        Ok(balances.get(&token.to_uppercase()).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shield_generates_unique_ids() {
        let backend = MockBackend::new();

        let first = backend.shield(1_000_000, "SOL").await.unwrap();
        let second = backend.shield(1_000_000, "SOL").await.unwrap();

        assert!(first.success);
        assert!(!first.needs_signing());
        assert!(first.transaction_id.as_deref().unwrap().starts_with("mock-tx-shield-"));
        assert_eq!(first.commitment.as_deref().unwrap().len(), 64);
        assert_ne!(first.transaction_id, second.transaction_id);
        assert_ne!(first.commitment, second.commitment);
    }

    #[tokio::test]
    async fn test_transfer_and_unshield_succeed() {
        let backend = MockBackend::new();

        let transfer = backend.transfer("recipient", 500).await.unwrap();
        assert!(transfer.success);
        assert!(transfer.signature.is_some());

        let unshield = backend.unshield(500, "SOL").await.unwrap();
        assert!(unshield.success);
        assert!(unshield.transaction_id.unwrap().starts_with("mock-tx-unshield-"));
    }

    #[tokio::test]
    async fn test_balance_tally() {
        let backend = MockBackend::new();

        backend.shield(300, "sol").await.unwrap();
        backend.shield(200, "SOL").await.unwrap();
        backend.unshield(100, "SOL").await.unwrap();
        assert_eq!(backend.shielded_balance("SOL").await.unwrap(), 400);

        // never goes negative
        backend.unshield(10_000, "SOL").await.unwrap();
        assert_eq!(backend.shielded_balance("SOL").await.unwrap(), 0);
        assert_eq!(backend.shielded_balance("USDC").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_verify_matches_format_validator() {
        let backend = MockBackend::new();

        for proof in [
            Proof::from("deadbeef"),
            Proof::from(""),
            Proof::from("not-hex!"),
            Proof::Bytes(vec![0u8; 8]),
            Proof::Bytes(Vec::new()),
        ] {
            let expected = proof::is_well_formed(&proof, &[]);
            assert_eq!(backend.verify_proof(&proof, &[]).await.unwrap(), expected);
        }
    }
}
