//! Common Error Types for the Privacy Devkit
//!
//! Every public operation reports one of these kinds so callers (CLI, HTTP
//! API) can tell bad input from misconfiguration from upstream trouble.

use thiserror::Error;

use crate::rpc::RpcError;
use crate::shadowwire::PoolApiError;
use crate::signing::SigningError;

/// Root error type
#[derive(Debug, Error)]
pub enum PrivacyError {
    /// Rejected before any backend call (non-positive amount, empty recipient, bad proof)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Selected backend is missing a credential or wallet
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Unknown or not-yet-implemented backend name
    #[error("unsupported backend \"{name}\"; supported backends: {supported}")]
    UnsupportedBackend { name: String, supported: String },

    /// Token outside the remote service's supported set
    #[error("unsupported token \"{token}\"; supported tokens: {supported}")]
    UnsupportedToken { token: String, supported: String },

    /// Remote API or RPC failure, carrying the upstream message
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Signing pipeline failure
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PoolApiError> for PrivacyError {
    fn from(e: PoolApiError) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl From<RpcError> for PrivacyError {
    fn from(e: RpcError) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl PrivacyError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Caller-side error (bad request) as opposed to an internal failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PrivacyError::InvalidInput(_)
                | PrivacyError::UnsupportedToken { .. }
                | PrivacyError::UnsupportedBackend { .. }
        )
    }

    /// Check if this is a retryable error. The core never retries; this is
    /// a hint for outer layers.
    pub fn is_retryable(&self) -> bool {
        match self {
            PrivacyError::Upstream(_) | PrivacyError::Io(_) => true,
            PrivacyError::Signing(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PrivacyError::InvalidInput(_) => "INVALID_INPUT",
            PrivacyError::Config(_) => "CONFIG_ERROR",
            PrivacyError::UnsupportedBackend { .. } => "UNSUPPORTED_BACKEND",
            PrivacyError::UnsupportedToken { .. } => "UNSUPPORTED_TOKEN",
            PrivacyError::Upstream(_) => "UPSTREAM_FAILURE",
            PrivacyError::Signing(SigningError::ConfirmationTimeout { .. }) => {
                "CONFIRMATION_TIMEOUT"
            }
            PrivacyError::Signing(_) => "SIGNING_ERROR",
            PrivacyError::Logging(_) => "LOGGING_ERROR",
            PrivacyError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using PrivacyError
pub type Result<T> = std::result::Result<T, PrivacyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PrivacyError::upstream("pool API returned 503");
        assert!(err.to_string().contains("pool API returned 503"));
        assert_eq!(err.error_code(), "UPSTREAM_FAILURE");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(PrivacyError::upstream("timeout").is_retryable());
        assert!(!PrivacyError::invalid_input("amount must be positive").is_retryable());
        assert!(PrivacyError::Signing(SigningError::ConfirmationTimeout {
            signature: "sig".to_string()
        })
        .is_retryable());
    }

    #[test]
    fn test_timeout_has_distinct_code() {
        let timeout = PrivacyError::Signing(SigningError::ConfirmationTimeout {
            signature: "sig".to_string(),
        });
        let rejected = PrivacyError::Signing(SigningError::Rejected("blockhash not found".into()));
        assert_eq!(timeout.error_code(), "CONFIRMATION_TIMEOUT");
        assert_eq!(rejected.error_code(), "SIGNING_ERROR");
    }

    #[test]
    fn test_unsupported_backend_lists_supported_set() {
        let err = PrivacyError::UnsupportedBackend {
            name: "arcium".to_string(),
            supported: "mock, remote".to_string(),
        };
        assert!(err.to_string().contains("mock, remote"));
        assert!(err.is_client_error());
    }
}
