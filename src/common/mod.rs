//! Common Infrastructure Module
//!
//! - Configuration resolution (overrides, config file, environment)
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{
    resolve, resolve_env_only, resolve_with, write_config, ConfigError, ConfigOverrides,
    ConfigSources, Network, PrivacyConfig,
};
pub use error::{PrivacyError, Result};
pub use logging::{
    generate_correlation_id, init_from_env, init_logging, log_api_response, log_operation_event,
    log_signing_event, EventCategory, LogEvent, LogLevel, LoggingError,
};
