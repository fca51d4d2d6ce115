//! Privacy Backends
//!
//! Defines the uniform capability interface every privacy provider
//! implements, the result records it returns, and the backend selector.
//!
//! This module contains:
//! - [`PrivacyBackend`] trait
//! - `MockBackend` for local development (no network)
//! - `RemoteBackend` adapter over the pool API
//! - Registry that constructs a backend from a [`BackendKind`] and config

pub mod mock;
pub mod registry;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{PrivacyConfig, Result};
use crate::proof::Proof;

// Re-exports for convenience
pub use mock::MockBackend;
pub use registry::{construct, construct_with_api};
pub use remote::RemoteBackend;

// ============================================================================
// Operation Results
// ============================================================================

/// Result of a shield (deposit into the private pool)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
    /// Present when the deposit still has to be signed and sent by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsigned_transaction_base64: Option<String>,
}

impl ShieldResult {
    /// Not yet settled on-chain
    pub fn needs_signing(&self) -> bool {
        self.unsigned_transaction_base64.is_some()
    }
}

/// Result of a private transfer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u64>,
}

/// Result of an unshield (withdraw to a public balance)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnshieldResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

// ============================================================================
// Capability Interface
// ============================================================================

/// Privacy provider interface
///
/// Implementations:
/// - `MockBackend` - Fabricated results, no network
/// - `RemoteBackend` - Third-party pool API
///
/// Amounts are in the token's smallest unit (lamports for SOL). Inputs are
/// validated by the client before any backend call.
#[async_trait]
pub trait PrivacyBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Move `amount` of `token` into the private pool
    async fn shield(&self, amount: u64, token: &str) -> Result<ShieldResult>;

    /// Private transfer of `amount` to `recipient`
    async fn transfer(&self, recipient: &str, amount: u64) -> Result<TransferResult>;

    /// Move `amount` of `token` back to the public balance
    async fn unshield(&self, amount: u64, token: &str) -> Result<UnshieldResult>;

    /// Verify a proof against its public inputs
    async fn verify_proof(&self, proof: &Proof, public_inputs: &[String]) -> Result<bool>;

    /// Shielded balance of the configured wallet in smallest units
    async fn shielded_balance(&self, token: &str) -> Result<u64>;
}

// ============================================================================
// Backend Selector
// ============================================================================

/// Backends that can be constructed
pub const SUPPORTED_BACKENDS: &str = "mock, remote";

/// Which backend to construct
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Mock,
    Remote,
    /// A recognizable but not implemented name (e.g. "arcium", "privacycash")
    Unimplemented(String),
}

impl BackendKind {
    /// Remote when both the API key and wallet are configured, else Mock
    pub fn auto(config: &PrivacyConfig) -> Self {
        if config.has_remote_credentials() {
            BackendKind::Remote
        } else {
            BackendKind::Mock
        }
    }
}

impl FromStr for BackendKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Ok(match name.as_str() {
            "mock" => BackendKind::Mock,
            "remote" | "shadowwire" => BackendKind::Remote,
            _ => BackendKind::Unimplemented(name),
        })
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Mock => write!(f, "mock"),
            BackendKind::Remote => write!(f, "remote"),
            BackendKind::Unimplemented(name) => write!(f, "{}", name),
        }
    }
}
