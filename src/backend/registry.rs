//! Backend Registry
//!
//! Constructs the backend for a [`BackendKind`], checking its prerequisites
//! before any network call is possible.

use std::sync::Arc;
use tracing::debug;

use super::{BackendKind, MockBackend, PrivacyBackend, RemoteBackend, SUPPORTED_BACKENDS};
use crate::common::{ConfigError, PrivacyConfig, PrivacyError, Result};
use crate::shadowwire::{PoolApi, ShadowWireClient};

/// Build the pool API client described by `config`
fn pool_api(config: &PrivacyConfig) -> Arc<dyn PoolApi> {
    let api_key = config.remote_api_key.clone();
    let client = match &config.remote_api_url {
        Some(url) => ShadowWireClient::new(url, api_key),
        None => ShadowWireClient::with_default_url(api_key),
    };
    Arc::new(client)
}

/// Construct a backend of `kind` from `config`
pub fn construct(kind: &BackendKind, config: &PrivacyConfig) -> Result<Arc<dyn PrivacyBackend>> {
    build(kind, config, || pool_api(config))
}

/// Like [`construct`], with an injected pool API client for the remote backend
pub fn construct_with_api(
    kind: &BackendKind,
    config: &PrivacyConfig,
    api: Arc<dyn PoolApi>,
) -> Result<Arc<dyn PrivacyBackend>> {
    build(kind, config, move || api)
}

fn build(
    kind: &BackendKind,
    config: &PrivacyConfig,
    api: impl FnOnce() -> Arc<dyn PoolApi>,
) -> Result<Arc<dyn PrivacyBackend>> {
    debug!(target: "privacy_devkit::backend", backend = %kind, "constructing backend");

    match kind {
        BackendKind::Mock => Ok(Arc::new(MockBackend::new())),
        BackendKind::Remote => {
            let wallet = config
                .remote_wallet
                .clone()
                .ok_or(ConfigError::MissingField {
                    field: "remoteWallet",
                    hint: "set REMOTE_WALLET or remoteWallet in .privacy/config.json",
                })?;
            Ok(Arc::new(RemoteBackend::new(api(), wallet)))
        }
        BackendKind::Unimplemented(name) => Err(PrivacyError::UnsupportedBackend {
            name: name.clone(),
            supported: SUPPORTED_BACKENDS.to_string(),
        }),
    }
}
