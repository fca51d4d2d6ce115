//! Transaction Signing Pipeline
//!
//! Finishes a shield whose backend returned an unsigned transaction:
//!
//! ```text
//! Received -> Deserialized -> Signed -> Submitted -> Confirmed
//!     \___________\______________\__________\________> Failed
//! ```
//!
//! The blob is base64 of a bincode-encoded Solana transaction, either
//! versioned (v0) or legacy. Without a signer the pipeline stops after
//! deserialization and hands the original blob back to the caller.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use solana_sdk::{
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Transaction, VersionedTransaction},
};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use crate::common::log_signing_event;
use crate::rpc::{LedgerRpc, SignatureStatus};

/// Secret key for the local signer (base58 or JSON byte array)
pub const ENV_SIGNER_KEY: &str = "PRIVACY_SIGNER_KEY";

/// Signature status polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long to wait for `confirmed` before giving up
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Errors
// ============================================================================

/// Signing pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("cannot decode transaction: {0}")]
    Decode(String),

    #[error("invalid signer key: {0}")]
    InvalidKey(String),

    #[error("{0} is not a required signer of this transaction")]
    SignerNotRequired(String),

    /// The network refused the submission
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Landed on-chain but failed
    #[error("transaction failed: {0}")]
    Failed(String),

    /// Submitted but not confirmed in time; it may still land
    #[error("transaction {signature} not confirmed before timeout")]
    ConfirmationTimeout { signature: String },
}

impl SigningError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SigningError::ConfirmationTimeout { .. })
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Wire encoding of the unsigned transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionEncoding {
    Versioned,
    Legacy,
}

impl fmt::Display for TransactionEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionEncoding::Versioned => write!(f, "versioned"),
            TransactionEncoding::Legacy => write!(f, "legacy"),
        }
    }
}

/// A deserialized unsigned transaction
#[derive(Debug, Clone)]
pub enum DecodedTransaction {
    Versioned(VersionedTransaction),
    Legacy(Transaction),
}

impl DecodedTransaction {
    pub fn encoding(&self) -> TransactionEncoding {
        match self {
            DecodedTransaction::Versioned(_) => TransactionEncoding::Versioned,
            DecodedTransaction::Legacy(_) => TransactionEncoding::Legacy,
        }
    }

    /// Common representation for signing and submission
    pub fn into_versioned(self) -> VersionedTransaction {
        match self {
            DecodedTransaction::Versioned(tx) => tx,
            DecodedTransaction::Legacy(tx) => VersionedTransaction::from(tx),
        }
    }
}

/// Decode a base64 transaction blob, versioned encoding first
pub fn decode_transaction(blob: &str) -> Result<DecodedTransaction, SigningError> {
    let bytes = BASE64
        .decode(blob.trim())
        .map_err(|e| SigningError::Decode(format!("base64: {}", e)))?;

    if let Ok(tx) = bincode::deserialize::<VersionedTransaction>(&bytes) {
        if !matches!(tx.message, VersionedMessage::Legacy(_)) {
            return Ok(DecodedTransaction::Versioned(tx));
        }
        if let Some(legacy) = tx.into_legacy_transaction() {
            return Ok(DecodedTransaction::Legacy(legacy));
        }
    }

    bincode::deserialize::<Transaction>(&bytes)
        .map(DecodedTransaction::Legacy)
        .map_err(|e| SigningError::Decode(e.to_string()))
}

// ============================================================================
// Signers
// ============================================================================

/// Anything that can add its signature to a transaction (wallet adapter,
/// local keypair)
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign `transaction`, preserving signatures of other required signers
    async fn sign_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, SigningError>;
}

/// Signer holding an ed25519 keypair in memory
pub struct LocalKeySigner {
    keypair: Keypair,
}

impl LocalKeySigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Parse a 64-byte secret key given as base58 or a JSON byte array
    pub fn from_secret(secret: &str) -> Result<Self, SigningError> {
        let secret = secret.trim();
        let bytes = if secret.starts_with('[') {
            serde_json::from_str::<Vec<u8>>(secret)
                .map_err(|e| SigningError::InvalidKey(e.to_string()))?
        } else {
            bs58::decode(secret)
                .into_vec()
                .map_err(|e| SigningError::InvalidKey(e.to_string()))?
        };

        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        Ok(Self::new(keypair))
    }

    /// Signer from `PRIVACY_SIGNER_KEY`, `None` when unset
    pub fn from_env() -> Result<Option<Self>, SigningError> {
        match env::var(ENV_SIGNER_KEY) {
            Ok(secret) if !secret.trim().is_empty() => Self::from_secret(&secret).map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl TransactionSigner for LocalKeySigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, SigningError> {
        let pubkey = self.keypair.pubkey();
        let required = transaction.message.header().num_required_signatures as usize;

        let position = transaction
            .message
            .static_account_keys()
            .iter()
            .take(required)
            .position(|key| *key == pubkey)
            .ok_or_else(|| SigningError::SignerNotRequired(pubkey.to_string()))?;

        if transaction.signatures.len() < required {
            transaction.signatures.resize(required, Signature::default());
        }
        transaction.signatures[position] =
            self.keypair.sign_message(&transaction.message.serialize());

        Ok(transaction)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Pipeline stages, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Deserialized,
    Signed,
    Submitted,
    Confirmed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Deserialized => "deserialized",
            PipelineStage::Signed => "signed",
            PipelineStage::Submitted => "submitted",
            PipelineStage::Confirmed => "confirmed",
            PipelineStage::Failed => "failed",
        }
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SettlementOutcome {
    /// Signed, submitted and confirmed
    #[serde(rename_all = "camelCase")]
    Confirmed {
        signature: String,
        encoding: TransactionEncoding,
    },
    /// No signer available; the original blob for the caller to sign
    #[serde(rename_all = "camelCase")]
    Unsigned { transaction_base64: String },
}

/// Deserialize, sign, submit and confirm one unsigned transaction
pub struct SigningPipeline {
    rpc: Arc<dyn LedgerRpc>,
    poll_interval: Duration,
    confirm_timeout: Duration,
}

impl SigningPipeline {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            rpc,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    pub fn with_timing(mut self, poll_interval: Duration, confirm_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.confirm_timeout = confirm_timeout;
        self
    }

    /// Run the pipeline over a base64 blob
    pub async fn run(
        &self,
        blob: &str,
        signer: Option<&dyn TransactionSigner>,
    ) -> Result<SettlementOutcome, SigningError> {
        log_signing_event(PipelineStage::Received.as_str(), None, None);

        let result = self.settle(blob, signer).await;
        if let Err(err) = &result {
            let signature = match err {
                SigningError::ConfirmationTimeout { signature } => Some(signature.as_str()),
                _ => None,
            };
            log_signing_event(
                PipelineStage::Failed.as_str(),
                signature,
                Some(&err.to_string()),
            );
        }
        result
    }

    async fn settle(
        &self,
        blob: &str,
        signer: Option<&dyn TransactionSigner>,
    ) -> Result<SettlementOutcome, SigningError> {
        let decoded = decode_transaction(blob)?;
        let encoding = decoded.encoding();
        log_signing_event(PipelineStage::Deserialized.as_str(), None, None);

        let Some(signer) = signer else {
            return Ok(SettlementOutcome::Unsigned {
                transaction_base64: blob.to_string(),
            });
        };

        let signed = signer.sign_transaction(decoded.into_versioned()).await?;
        log_signing_event(PipelineStage::Signed.as_str(), None, None);

        let signature = self
            .rpc
            .send_transaction(&signed)
            .await
            .map_err(|e| SigningError::Rejected(e.to_string()))?;
        let signature_str = signature.to_string();
        log_signing_event(PipelineStage::Submitted.as_str(), Some(&signature_str), None);

        self.await_confirmation(&signature).await?;
        log_signing_event(PipelineStage::Confirmed.as_str(), Some(&signature_str), None);

        Ok(SettlementOutcome::Confirmed {
            signature: signature_str,
            encoding,
        })
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<(), SigningError> {
        let deadline = Instant::now() + self.confirm_timeout;

        loop {
            match self.rpc.signature_status(signature).await {
                Ok(SignatureStatus::Confirmed) => return Ok(()),
                Ok(SignatureStatus::Failed(reason)) => return Err(SigningError::Failed(reason)),
                Ok(SignatureStatus::Pending) => {}
                Err(e) => {
                    warn!(target: "privacy_devkit::signing", %signature, error = %e, "status poll failed")
                }
            }

            if Instant::now() >= deadline {
                return Err(SigningError::ConfirmationTimeout {
                    signature: signature.to_string(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
