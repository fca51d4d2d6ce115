//! Privacy Client
//!
//! Owns one ledger RPC connection (fixed at construction) and one active
//! backend that can be swapped at runtime. Every operation validates its
//! input before reaching the backend.
//!
//! A process-wide default client built from the environment backs the free
//! functions at the bottom of this module. Explicit instances are preferred.

use serde_json::json;
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::RwLock;
use tracing::info;

use crate::backend::{
    self, BackendKind, PrivacyBackend, ShieldResult, TransferResult, UnshieldResult,
};
use crate::common::{
    log_operation_event, resolve_env_only, EventCategory, PrivacyConfig, PrivacyError, Result,
};
use crate::proof::Proof;
use crate::rpc::{self, LedgerRpc, SolanaRpc};
use crate::signing::{SettlementOutcome, SigningPipeline, TransactionSigner};

/// Client over a ledger connection and a swappable backend
pub struct PrivacyClient {
    rpc: Arc<dyn LedgerRpc>,
    config: PrivacyConfig,
    backend: RwLock<(BackendKind, Arc<dyn PrivacyBackend>)>,
}

impl PrivacyClient {
    /// Connect to `config.rpc_url` and auto-select the backend
    pub fn new(config: PrivacyConfig) -> Result<Self> {
        let rpc: Arc<dyn LedgerRpc> = Arc::new(SolanaRpc::new(&config.rpc_url));
        Self::with_rpc(config, rpc)
    }

    /// Use an existing ledger connection
    pub fn with_rpc(config: PrivacyConfig, rpc: Arc<dyn LedgerRpc>) -> Result<Self> {
        let kind = BackendKind::auto(&config);
        let active = backend::construct(&kind, &config)?;
        Ok(Self::with_backend(config, rpc, kind, active))
    }

    /// Use an already constructed backend
    pub fn with_backend(
        config: PrivacyConfig,
        rpc: Arc<dyn LedgerRpc>,
        kind: BackendKind,
        backend: Arc<dyn PrivacyBackend>,
    ) -> Self {
        info!(
            target: "privacy_devkit::client",
            network = %config.network, backend = %kind, "privacy client ready"
        );
        Self {
            rpc,
            config,
            backend: RwLock::new((kind, backend)),
        }
    }

    pub fn config(&self) -> &PrivacyConfig {
        &self.config
    }

    /// Ledger connection shared with the signing pipeline
    pub fn rpc(&self) -> Arc<dyn LedgerRpc> {
        Arc::clone(&self.rpc)
    }

    pub async fn backend_kind(&self) -> BackendKind {
        self.backend.read().await.0.clone()
    }

    /// Swap the active backend. On failure the previous backend stays active.
    pub async fn set_backend(&self, kind: BackendKind) -> Result<()> {
        let next = backend::construct(&kind, &self.config)?;
        log_operation_event(
            EventCategory::System,
            next.name(),
            json!({ "event": "backend_switch", "kind": kind.to_string() }),
            None,
        );
        *self.backend.write().await = (kind, next);
        Ok(())
    }

    /// Clone the active backend out of the lock
    async fn active(&self) -> Arc<dyn PrivacyBackend> {
        Arc::clone(&self.backend.read().await.1)
    }

    /// Public balance in lamports
    pub async fn get_balance(&self, address: &str) -> Result<u64> {
        let pubkey =
            rpc::parse_pubkey(address).map_err(|e| PrivacyError::invalid_input(e.to_string()))?;
        Ok(self.rpc.get_balance(&pubkey).await?)
    }

    pub async fn shield(&self, amount: u64, token: &str) -> Result<ShieldResult> {
        require_amount(amount)?;
        let token = require_token(token)?;

        let backend = self.active().await;
        let result = backend.shield(amount, token).await;
        log_outcome(
            EventCategory::Shield,
            backend.name(),
            json!({ "amount": amount, "token": token }),
            &result,
        );
        result
    }

    pub async fn transfer(&self, recipient: &str, amount: u64) -> Result<TransferResult> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(PrivacyError::invalid_input("recipient is required"));
        }
        require_amount(amount)?;

        let backend = self.active().await;
        let result = backend.transfer(recipient, amount).await;
        log_outcome(
            EventCategory::Transfer,
            backend.name(),
            json!({ "amount": amount, "recipient": recipient }),
            &result,
        );
        result
    }

    pub async fn unshield(&self, amount: u64, token: &str) -> Result<UnshieldResult> {
        require_amount(amount)?;
        let token = require_token(token)?;

        let backend = self.active().await;
        let result = backend.unshield(amount, token).await;
        log_outcome(
            EventCategory::Unshield,
            backend.name(),
            json!({ "amount": amount, "token": token }),
            &result,
        );
        result
    }

    pub async fn verify_proof(&self, proof: &Proof, public_inputs: &[String]) -> Result<bool> {
        let backend = self.active().await;
        let result = backend.verify_proof(proof, public_inputs).await;
        log_outcome(
            EventCategory::Verify,
            backend.name(),
            json!({ "proofLen": proof.len(), "publicInputs": public_inputs.len() }),
            &result,
        );
        result
    }

    pub async fn shielded_balance(&self, token: &str) -> Result<u64> {
        let token = require_token(token)?;
        self.active().await.shielded_balance(token).await
    }

    /// Signing pipeline over this client's connection
    pub fn signing_pipeline(&self) -> SigningPipeline {
        SigningPipeline::new(self.rpc())
    }

    /// Finish a shield on-chain. `None` when the result needs no signing.
    pub async fn settle_shield(
        &self,
        result: &ShieldResult,
        signer: Option<&dyn TransactionSigner>,
    ) -> Result<Option<SettlementOutcome>> {
        let Some(blob) = &result.unsigned_transaction_base64 else {
            return Ok(None);
        };
        let outcome = self.signing_pipeline().run(blob, signer).await?;
        Ok(Some(outcome))
    }
}

fn require_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(PrivacyError::invalid_input("amount must be positive"));
    }
    Ok(())
}

fn require_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(PrivacyError::invalid_input("token is required"));
    }
    Ok(token)
}

fn log_outcome<T>(
    category: EventCategory,
    backend: &str,
    details: serde_json::Value,
    result: &Result<T>,
) {
    let error = result.as_ref().err().map(|e| e.to_string());
    log_operation_event(category, backend, details, error.as_deref());
}

// ============================================================================
// Default Client
// ============================================================================

static DEFAULT_CLIENT: StdRwLock<Option<Arc<PrivacyClient>>> = StdRwLock::new(None);

/// Process-wide client, built from environment configuration on first use
pub fn default_client() -> Result<Arc<PrivacyClient>> {
    get_or_init(&DEFAULT_CLIENT, || PrivacyClient::new(resolve_env_only()))
}

fn get_or_init(
    cell: &StdRwLock<Option<Arc<PrivacyClient>>>,
    build: impl FnOnce() -> Result<PrivacyClient>,
) -> Result<Arc<PrivacyClient>> {
    if let Some(client) = cell.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
        return Ok(Arc::clone(client));
    }

    let mut slot = cell.write().unwrap_or_else(|e| e.into_inner());
    if let Some(client) = slot.as_ref() {
        return Ok(Arc::clone(client));
    }
    let client = Arc::new(build()?);
    *slot = Some(Arc::clone(&client));
    Ok(client)
}

/// Replace the process-wide client
pub fn set_default_client(client: Arc<PrivacyClient>) {
    *DEFAULT_CLIENT.write().unwrap_or_else(|e| e.into_inner()) = Some(client);
}

pub async fn shield_amount(amount: u64, token: &str) -> Result<ShieldResult> {
    default_client()?.shield(amount, token).await
}

pub async fn create_private_transfer(recipient: &str, amount: u64) -> Result<TransferResult> {
    default_client()?.transfer(recipient, amount).await
}

pub async fn unshield_amount(amount: u64, token: &str) -> Result<UnshieldResult> {
    default_client()?.unshield(amount, token).await
}

pub async fn verify_zk_proof(proof: &Proof, public_inputs: &[String]) -> Result<bool> {
    default_client()?.verify_proof(proof, public_inputs).await
}

pub async fn get_shielded_balance(token: &str) -> Result<u64> {
    default_client()?.shielded_balance(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RemoteBackend;
    use crate::rpc::MockLedgerRpc;
    use crate::shadowwire::{DepositResponse, MockPoolApi};
    use crate::signing::LocalKeySigner;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use solana_sdk::{
        hash::Hash,
        message::Message,
        pubkey::Pubkey,
        signature::Keypair,
        system_instruction,
        transaction::Transaction,
    };

    fn mock_client(rpc: MockLedgerRpc) -> PrivacyClient {
        PrivacyClient::with_rpc(PrivacyConfig::default(), Arc::new(rpc)).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_to_mock_backend() {
        let client = mock_client(MockLedgerRpc::new());
        assert_eq!(client.backend_kind().await, BackendKind::Mock);

        let result = client.shield(1_000, "SOL").await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let client = mock_client(MockLedgerRpc::new());

        for err in [
            client.shield(0, "SOL").await.unwrap_err(),
            client.shield(10, "  ").await.unwrap_err(),
            client.unshield(0, "SOL").await.unwrap_err(),
        ] {
            assert!(matches!(err, PrivacyError::InvalidInput(_)));
        }
        assert!(matches!(
            client.transfer("", 10).await.unwrap_err(),
            PrivacyError::InvalidInput(_)
        ));
        assert!(matches!(
            client.transfer("bob", 0).await.unwrap_err(),
            PrivacyError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_get_balance() {
        let owner = Pubkey::new_unique();
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_get_balance()
            .withf(move |key| *key == owner)
            .times(1)
            .returning(|_| Ok(2_000_000_000));
        let client = mock_client(rpc);

        assert_eq!(client.get_balance(&owner.to_string()).await.unwrap(), 2_000_000_000);
        assert!(matches!(
            client.get_balance("not-an-address").await.unwrap_err(),
            PrivacyError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_switch_keeps_previous_backend() {
        let client = mock_client(MockLedgerRpc::new());

        let err = client
            .set_backend(BackendKind::Unimplemented("arcium".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, PrivacyError::UnsupportedBackend { .. }));

        // no wallet configured
        let err = client.set_backend(BackendKind::Remote).await.unwrap_err();
        assert!(matches!(err, PrivacyError::Config(_)));

        assert_eq!(client.backend_kind().await, BackendKind::Mock);
    }

    #[tokio::test]
    async fn test_switch_to_remote() {
        let config = PrivacyConfig {
            remote_wallet: Some("wallet".to_string()),
            ..Default::default()
        };
        let client = PrivacyClient::with_rpc(config, Arc::new(MockLedgerRpc::new())).unwrap();
        assert_eq!(client.backend_kind().await, BackendKind::Mock);

        client.set_backend(BackendKind::Remote).await.unwrap();
        assert_eq!(client.backend_kind().await, BackendKind::Remote);
    }

    #[tokio::test]
    async fn test_two_shields_settle_with_distinct_signatures() {
        let signer = LocalKeySigner::new(Keypair::new());
        let payer = signer.pubkey();

        let mut api = MockPoolApi::new();
        api.expect_deposit().times(2).returning(move |_| {
            let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1_000);
            let message = Message::new_with_blockhash(&[ix], Some(&payer), &Hash::new_unique());
            let tx = Transaction::new_unsigned(message);
            Ok(DepositResponse {
                success: true,
                unsigned_tx_base64: Some(BASE64.encode(bincode::serialize(&tx).unwrap())),
                user_balance_pda: Some("pda".to_string()),
                error: None,
            })
        });

        let mut rpc = MockLedgerRpc::new();
        rpc.expect_send_transaction()
            .times(2)
            .returning(|tx| Ok(tx.signatures[0]));
        rpc.expect_signature_status()
            .returning(|_| Ok(rpc::SignatureStatus::Confirmed));

        let config = PrivacyConfig {
            remote_wallet: Some(payer.to_string()),
            ..Default::default()
        };
        let remote = Arc::new(RemoteBackend::new(Arc::new(api), payer.to_string()));
        let client =
            PrivacyClient::with_backend(config, Arc::new(rpc), BackendKind::Remote, remote);

        let mut signatures = Vec::new();
        for _ in 0..2 {
            let shield = client.shield(1_000, "SOL").await.unwrap();
            assert!(shield.needs_signing());
            match client.settle_shield(&shield, Some(&signer)).await.unwrap() {
                Some(SettlementOutcome::Confirmed { signature, .. }) => signatures.push(signature),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_ne!(signatures[0], signatures[1]);
    }

    #[tokio::test]
    async fn test_settle_without_blob_is_noop() {
        let mut rpc = MockLedgerRpc::new();
        rpc.expect_send_transaction().times(0);
        let client = mock_client(rpc);

        let shield = client.shield(5, "SOL").await.unwrap();
        assert!(client.settle_shield(&shield, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_client_builds_once_from_env() {
        let cell = StdRwLock::new(None);

        let first = get_or_init(&cell, || PrivacyClient::new(resolve_env_only())).unwrap();
        assert_eq!(first.config(), &resolve_env_only());

        let second = get_or_init(&cell, || panic!("client rebuilt")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_default_client_functions() {
        set_default_client(Arc::new(mock_client(MockLedgerRpc::new())));

        assert!(shield_amount(100, "SOL").await.unwrap().success);
        assert!(create_private_transfer("bob", 100).await.unwrap().success);
        assert!(unshield_amount(40, "SOL").await.unwrap().success);
        assert!(verify_zk_proof(&Proof::from("deadbeef"), &[]).await.unwrap());
        assert_eq!(get_shielded_balance("SOL").await.unwrap(), 60);
    }
}
