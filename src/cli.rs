//! Command Line Interface
//!
//! Argument parsing and command execution for the `privacy-devkit` binary.
//! Global flags (`--backend`, `--rpc-url`, `--network`) may appear before or
//! after the subcommand.

use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::env;
use std::sync::Arc;

use crate::api;
use crate::backend::BackendKind;
use crate::client::PrivacyClient;
use crate::common::{resolve, write_config, ConfigOverrides, Network, Result};
use crate::proof::Proof;
use crate::signing::{LocalKeySigner, SettlementOutcome, TransactionSigner};
use crate::tokens::{self, NATIVE_TOKEN};

const ENV_HELP: &str = "\
Amounts are in the token's smallest unit (lamports for SOL).

ENVIRONMENT VARIABLES:
  RPC_URL              Solana RPC endpoint
  NETWORK              devnet or mainnet
  REMOTE_API_KEY       Pool API key
  REMOTE_WALLET        Wallet that owns the pool account
  REMOTE_API_URL       Pool API base URL
  PRIVACY_SIGNER_KEY   Local signing key (base58 or JSON byte array)
  PRIVACY_LOG_LEVEL    Log level (trace/debug/info/warn/error)
  PRIVACY_LOG_JSON     Set to 1 for JSON logs
  API_PORT             HTTP API port";

/// Parsed command line
#[derive(Parser, Debug)]
#[command(name = "privacy-devkit")]
#[command(about = "Shield, transfer, unshield and verify on Solana")]
#[command(after_help = ENV_HELP)]
pub struct Cli {
    /// Backend to use: mock or remote (default: auto)
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Solana RPC endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Network: devnet or mainnet
    #[arg(long, global = true)]
    pub network: Option<Network>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Write .privacy/config.json in the current directory
    Init {
        /// Pool API key
        #[arg(long)]
        api_key: Option<String>,

        /// Wallet that owns the pool account
        #[arg(long)]
        wallet: Option<String>,
    },

    /// Show the resolved configuration
    Config,

    /// Shield into the private pool
    Shield {
        #[arg(value_parser = parse_amount)]
        amount: u64,

        #[arg(default_value = NATIVE_TOKEN, value_parser = parse_token)]
        token: String,
    },

    /// Private transfer (SOL)
    Transfer {
        recipient: String,

        #[arg(value_parser = parse_amount)]
        amount: u64,
    },

    /// Unshield to the public balance
    Unshield {
        #[arg(value_parser = parse_amount)]
        amount: u64,

        #[arg(default_value = NATIVE_TOKEN, value_parser = parse_token)]
        token: String,
    },

    /// Verify a proof (hex or base64)
    Verify {
        proof: String,

        public_inputs: Vec<String>,
    },

    /// Public balance in lamports
    Balance { address: String },

    /// Start the HTTP API
    Serve {
        #[arg(long, env = "API_PORT", default_value_t = api::DEFAULT_PORT)]
        port: u16,
    },
}

/// Positive integer in smallest units, `_` and `,` separators allowed
fn parse_amount(value: &str) -> std::result::Result<u64, String> {
    match tokens::parse_amount(value) {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(format!("expected a positive integer amount, got {:?}", value)),
    }
}

fn parse_token(value: &str) -> std::result::Result<String, String> {
    Ok(value.trim().to_uppercase())
}

impl Cli {
    /// Config overrides carried by the global flags
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            rpc_url: self.rpc_url.clone(),
            network: self.network,
            ..Default::default()
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!(target: "privacy_devkit::cli", error = %e, "cannot render result"),
    }
}

/// Run a parsed command. `Ok(false)` means the operation completed but did
/// not succeed (e.g. a proof failed verification).
pub async fn execute(cli: Cli) -> Result<bool> {
    let mut overrides = cli.overrides();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(true);
    };

    match command {
        Command::Init { api_key, wallet } => {
            overrides.remote_api_key = api_key;
            overrides.remote_wallet = wallet;
            let config = resolve(&overrides);
            let path = write_config(&env::current_dir()?, &config)?;
            println!("Wrote {}", path.display());
            config.print_summary();
            Ok(true)
        }
        Command::Config => {
            resolve(&overrides).print_summary();
            Ok(true)
        }
        command => {
            let client = PrivacyClient::new(resolve(&overrides))?;
            if let Some(kind) = cli.backend {
                client.set_backend(kind).await?;
            }
            run_operation(client, command).await
        }
    }
}

async fn run_operation(client: PrivacyClient, command: Command) -> Result<bool> {
    match command {
        Command::Shield { amount, token } => {
            let result = client.shield(amount, &token).await?;
            print_json(&result);
            if !result.needs_signing() {
                return Ok(result.success);
            }

            let signer = LocalKeySigner::from_env()?;
            let signer = signer.as_ref().map(|s| s as &dyn TransactionSigner);
            match client.settle_shield(&result, signer).await? {
                Some(SettlementOutcome::Confirmed {
                    signature,
                    encoding,
                }) => {
                    println!("Confirmed {} transaction: {}", encoding, signature);
                }
                Some(SettlementOutcome::Unsigned { transaction_base64 }) => {
                    println!("No PRIVACY_SIGNER_KEY set. Sign and submit this transaction with your wallet:");
                    println!("{}", transaction_base64);
                }
                None => {}
            }
            Ok(result.success)
        }
        Command::Transfer { recipient, amount } => {
            let result = client.transfer(&recipient, amount).await?;
            print_json(&result);
            Ok(result.success)
        }
        Command::Unshield { amount, token } => {
            let result = client.unshield(amount, &token).await?;
            print_json(&result);
            Ok(result.success)
        }
        Command::Verify {
            proof,
            public_inputs,
        } => {
            let valid = client
                .verify_proof(&Proof::from(proof), &public_inputs)
                .await?;
            println!("{}", if valid { "Proof is valid" } else { "Proof is INVALID" });
            Ok(valid)
        }
        Command::Balance { address } => {
            let lamports = client.get_balance(&address).await?;
            match tokens::find_token(NATIVE_TOKEN) {
                Some(sol) => println!("{} ({} lamports)", sol.format(lamports), lamports),
                None => println!("{} lamports", lamports),
            }
            Ok(true)
        }
        Command::Serve { port } => {
            api::start_server(Arc::new(client), port).await?;
            Ok(true)
        }
        Command::Init { .. } | Command::Config => Ok(true),
    }
}
