//! Configuration Resolution for the Privacy Devkit
//!
//! Merges explicit overrides, a persisted config file and environment
//! variables into one effective [`PrivacyConfig`]. Resolution never fails:
//! missing inputs fall through to the next level and finally to defaults.
//!
//! # Precedence (highest first)
//!
//! 1. Explicit overrides passed by the caller (CLI flags, programmatic use)
//! 2. `.privacy/config.json` in the current directory, then the home directory
//! 3. Environment variables
//! 4. Defaults (`https://api.devnet.solana.com`, `devnet`)
//!
//! # Environment Variables
//!
//! - `RPC_URL` - Solana RPC endpoint URL
//! - `NETWORK` - "devnet" or "mainnet" ("mainnet-beta" accepted)
//! - `REMOTE_API_KEY` - API key for the remote privacy-transfer service
//! - `REMOTE_WALLET` - Wallet address used by the remote backend
//! - `REMOTE_API_URL` - Custom base URL for the remote service
//!
//! # Config File
//!
//! ```json
//! {
//!   "rpcUrl": "https://api.devnet.solana.com",
//!   "network": "devnet",
//!   "remoteApiKey": "...",
//!   "remoteWallet": "..."
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Public devnet RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Network used when nothing else is configured
pub const DEFAULT_NETWORK: Network = Network::Devnet;

/// Directory holding the config file (relative to cwd or home)
pub const CONFIG_DIR: &str = ".privacy";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.json";

pub const ENV_RPC_URL: &str = "RPC_URL";
pub const ENV_NETWORK: &str = "NETWORK";
pub const ENV_REMOTE_API_KEY: &str = "REMOTE_API_KEY";
pub const ENV_REMOTE_WALLET: &str = "REMOTE_WALLET";
pub const ENV_REMOTE_API_URL: &str = "REMOTE_API_URL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration field `{field}`: {hint}")]
    MissingField {
        field: &'static str,
        hint: &'static str,
    },

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// Network
// ============================================================================

/// Ledger network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Mainnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "devnet" | "dev" => Ok(Network::Devnet),
            "mainnet" | "mainnet-beta" | "main" => Ok(Network::Mainnet),
            _ => Err(ConfigError::InvalidValue(
                ENV_NETWORK.to_string(),
                format!("unknown network: {} (use 'devnet' or 'mainnet')", s),
            )),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Devnet => write!(f, "devnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

// ============================================================================
// Effective Configuration
// ============================================================================

/// Effective configuration after resolution
///
/// Optional fields are `None` when unset at every level; they are never
/// materialized as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyConfig {
    /// Solana RPC endpoint
    pub rpc_url: String,

    /// Network environment
    pub network: Network,

    /// API key for the remote privacy-transfer service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_api_key: Option<String>,

    /// Wallet the remote backend deposits from / withdraws to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_wallet: Option<String>,

    /// Custom base URL for the remote service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_api_url: Option<String>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            network: DEFAULT_NETWORK,
            remote_api_key: None,
            remote_wallet: None,
            remote_api_url: None,
        }
    }
}

impl PrivacyConfig {
    /// Both remote credentials are present
    pub fn has_remote_credentials(&self) -> bool {
        self.remote_api_key.is_some() && self.remote_wallet.is_some()
    }

    /// Print configuration summary (hiding the API key)
    pub fn print_summary(&self) {
        println!("=== Privacy Devkit Configuration ===");
        println!("Network: {}", self.network);
        println!("RPC URL: {}", self.rpc_url);
        println!(
            "Remote API Key: {}",
            if self.remote_api_key.is_some() { "(set)" } else { "(unset)" }
        );
        println!(
            "Remote Wallet: {}",
            self.remote_wallet.as_deref().unwrap_or("(unset)")
        );
        if let Some(url) = &self.remote_api_url {
            println!("Remote API URL: {}", url);
        }
        println!("====================================");
    }
}

/// Explicit caller-supplied overrides (highest precedence)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub network: Option<Network>,
    pub remote_api_key: Option<String>,
    pub remote_wallet: Option<String>,
    pub remote_api_url: Option<String>,
}

// ============================================================================
// Sources
// ============================================================================

/// Where resolution looks for the config file and environment values
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Directories searched in order for `.privacy/config.json`
    pub search_dirs: Vec<PathBuf>,
    /// Environment snapshot
    pub env: HashMap<String, String>,
}

impl ConfigSources {
    /// Current directory, then home, plus the process environment
    pub fn from_process() -> Self {
        let mut search_dirs = Vec::new();
        if let Ok(cwd) = env::current_dir() {
            search_dirs.push(cwd);
        }
        if let Some(home) = dirs::home_dir() {
            search_dirs.push(home);
        }

        Self {
            search_dirs,
            env: env::vars().collect(),
        }
    }

    /// Process environment only, no config file lookup
    pub fn env_only() -> Self {
        Self {
            search_dirs: Vec::new(),
            env: env::vars().collect(),
        }
    }

    /// First existing config file in search order
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| config_path(dir))
            .find(|path| path.is_file())
    }
}

/// Config file location under `dir`
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// On-disk shape. Values stay raw so that a bad `network` only disqualifies
/// that field, not the whole file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    rpc_url: Option<String>,
    network: Option<String>,
    remote_api_key: Option<String>,
    remote_wallet: Option<String>,
    remote_api_url: Option<String>,
    /// Legacy key names, used when the current names are absent
    shadowwire_api_key: Option<String>,
    shadowwire_wallet: Option<String>,
}

/// One precedence level
#[derive(Debug, Default)]
struct Layer {
    rpc_url: Option<String>,
    network: Option<Network>,
    remote_api_key: Option<String>,
    remote_wallet: Option<String>,
    remote_api_url: Option<String>,
}

impl Layer {
    fn from_overrides(overrides: &ConfigOverrides) -> Self {
        Self {
            rpc_url: non_empty(overrides.rpc_url.clone()),
            network: overrides.network,
            remote_api_key: non_empty(overrides.remote_api_key.clone()),
            remote_wallet: non_empty(overrides.remote_wallet.clone()),
            remote_api_url: non_empty(overrides.remote_api_url.clone()),
        }
    }

    fn from_file(file: FileConfig, path: &Path) -> Self {
        Self {
            rpc_url: non_empty(file.rpc_url),
            network: parse_network(file.network, &path.display().to_string()),
            remote_api_key: non_empty(file.remote_api_key)
                .or(non_empty(file.shadowwire_api_key)),
            remote_wallet: non_empty(file.remote_wallet).or(non_empty(file.shadowwire_wallet)),
            remote_api_url: non_empty(file.remote_api_url),
        }
    }

    fn from_env(env: &HashMap<String, String>) -> Self {
        let get = |key: &str| non_empty(env.get(key).cloned());
        Self {
            rpc_url: get(ENV_RPC_URL),
            network: parse_network(get(ENV_NETWORK), ENV_NETWORK),
            remote_api_key: get(ENV_REMOTE_API_KEY),
            remote_wallet: get(ENV_REMOTE_WALLET),
            remote_api_url: get(ENV_REMOTE_API_URL),
        }
    }

    /// Fill unset fields from a lower-precedence layer
    fn or(self, lower: Layer) -> Layer {
        Layer {
            rpc_url: self.rpc_url.or(lower.rpc_url),
            network: self.network.or(lower.network),
            remote_api_key: self.remote_api_key.or(lower.remote_api_key),
            remote_wallet: self.remote_wallet.or(lower.remote_wallet),
            remote_api_url: self.remote_api_url.or(lower.remote_api_url),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_network(raw: Option<String>, origin: &str) -> Option<Network> {
    let raw = non_empty(raw)?;
    match raw.parse() {
        Ok(network) => Some(network),
        Err(e) => {
            tracing::warn!(target: "privacy_devkit::config", origin, "ignoring network value: {}", e);
            None
        }
    }
}

fn load_config_file(path: &Path) -> Option<FileConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(target: "privacy_devkit::config", path = %path.display(), "unreadable config file: {}", e);
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::warn!(target: "privacy_devkit::config", path = %path.display(), "unparsable config file: {}", e);
            None
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve configuration from overrides, the config file and the process
/// environment.
pub fn resolve(overrides: &ConfigOverrides) -> PrivacyConfig {
    resolve_with(overrides, &ConfigSources::from_process())
}

/// Resolve from the process environment only (no overrides, no file)
pub fn resolve_env_only() -> PrivacyConfig {
    resolve_with(&ConfigOverrides::default(), &ConfigSources::env_only())
}

/// Resolve configuration against explicit sources
pub fn resolve_with(overrides: &ConfigOverrides, sources: &ConfigSources) -> PrivacyConfig {
    let file_layer = match sources.find_config_file() {
        Some(path) => {
            tracing::debug!(target: "privacy_devkit::config", path = %path.display(), "loading config file");
            load_config_file(&path)
                .map(|file| Layer::from_file(file, &path))
                .unwrap_or_default()
        }
        None => {
            tracing::debug!(target: "privacy_devkit::config", "no config file found");
            Layer::default()
        }
    };

    let merged = Layer::from_overrides(overrides)
        .or(file_layer)
        .or(Layer::from_env(&sources.env));

    PrivacyConfig {
        rpc_url: merged.rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
        network: merged.network.unwrap_or(DEFAULT_NETWORK),
        remote_api_key: merged.remote_api_key,
        remote_wallet: merged.remote_wallet,
        remote_api_url: merged.remote_api_url,
    }
}

/// Write `config` to `<dir>/.privacy/config.json`, creating the directory
pub fn write_config(dir: &Path, config: &PrivacyConfig) -> Result<PathBuf, ConfigError> {
    let config_dir = dir.join(CONFIG_DIR);
    fs::create_dir_all(&config_dir).map_err(|source| ConfigError::Write {
        path: config_dir.clone(),
        source,
    })?;

    let path = config_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&path, json).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
