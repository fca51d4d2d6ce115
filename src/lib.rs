//! Privacy Devkit
//!
//! Shield, transfer, unshield and verify on Solana without hard-coding the
//! privacy provider.
//!
//! ## Components
//!
//! 1. **Config Resolver** - Overrides, `.privacy/config.json`, environment, defaults
//! 2. **Backends** - `MockBackend` (local) and `RemoteBackend` (pool API) behind [`PrivacyBackend`]
//! 3. **Client** - One ledger connection, one swappable backend
//! 4. **Signing Pipeline** - Unsigned deposit transaction to confirmed signature
//!
//! ## Outer Surfaces
//!
//! - HTTP JSON API (`api`)
//! - CLI (`cli`, `privacy-devkit` binary)

pub mod api;
pub mod backend;
pub mod cli;
pub mod client;
pub mod common;
pub mod proof;
pub mod rpc;
pub mod shadowwire;
pub mod signing;
pub mod tokens;

// Re-exports: configuration and errors
pub use common::{resolve, ConfigOverrides, Network, PrivacyConfig, PrivacyError, Result};

// Re-exports: backends
pub use backend::{
    BackendKind, MockBackend, PrivacyBackend, RemoteBackend, ShieldResult, TransferResult,
    UnshieldResult,
};

// Re-exports: client
pub use client::{
    create_private_transfer, default_client, get_shielded_balance, set_default_client,
    shield_amount, unshield_amount, verify_zk_proof, PrivacyClient,
};

// Re-exports: proofs
pub use proof::{is_well_formed, Proof};

// Re-exports: signing
pub use signing::{
    decode_transaction, DecodedTransaction, LocalKeySigner, SettlementOutcome, SigningError,
    SigningPipeline, TransactionEncoding, TransactionSigner,
};

// Re-exports: ledger and pool API
pub use rpc::{LedgerRpc, SolanaRpc};
pub use shadowwire::{PoolApi, ShadowWireClient};
