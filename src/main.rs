//! Privacy Devkit CLI
//!
//! Run modes:
//!   privacy-devkit                         - Show usage
//!   privacy-devkit shield 1000000 SOL      - Shield into the private pool
//!   privacy-devkit serve --port 3001       - Start the HTTP API
//!
//! A `.env` file in the working directory is loaded before arguments and
//! configuration are resolved.

use clap::Parser;
use privacy_devkit::cli::{self, Cli};
use privacy_devkit::common::init_from_env;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // exits with status 2 on bad arguments
    let parsed = Cli::parse();

    if let Err(e) = init_from_env() {
        eprintln!("Warning: {}", e);
    }

    match cli::execute(parsed).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            std::process::exit(1);
        }
    }
}
