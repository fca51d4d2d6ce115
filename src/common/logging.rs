//! Structured Logging for the Privacy Devkit
//!
//! - `tracing` macros throughout the crate with `privacy_devkit::*` targets
//! - JSON or pretty output via `tracing-subscriber`
//! - Structured [`LogEvent`] records for privacy operations and settlement
//!
//! # Usage
//!
//! ```rust,ignore
//! use privacy_devkit::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, false)?;
//! ```

use serde::Serialize;
use std::env;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log level environment variable
pub const ENV_LOG_LEVEL: &str = "PRIVACY_LOG_LEVEL";

/// Set to "1" for JSON output
pub const ENV_LOG_JSON: &str = "PRIVACY_LOG_JSON";

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// HTTP request/response events
    Api,
    Shield,
    Transfer,
    Unshield,
    Verify,
    /// Signing pipeline stage transitions
    Signing,
    /// Startup, backend switches
    System,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    pub level: String,
    pub category: EventCategory,
    pub message: String,
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.as_filter().to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log the outcome of a shield / transfer / unshield / verify call
pub fn log_operation_event(
    category: EventCategory,
    backend: &str,
    details: serde_json::Value,
    error: Option<&str>,
) {
    let success = error.is_none();
    let level = if success { LogLevel::Info } else { LogLevel::Error };
    let mut event = LogEvent::new(level, category, format!("{:?} via {}", category, backend))
        .with_data(serde_json::json!({
            "backend": backend,
            "success": success,
            "details": details
        }));

    if let Some(err) = error {
        event = event.with_error("OPERATION_ERROR", err);
    }

    if success {
        tracing::info!(target: "privacy_devkit::operation", "{}", event.to_json());
    } else {
        tracing::error!(target: "privacy_devkit::operation", "{}", event.to_json());
    }
}

/// Log a signing pipeline stage transition
pub fn log_signing_event(stage: &str, signature: Option<&str>, error: Option<&str>) {
    let level = if error.is_some() { LogLevel::Warn } else { LogLevel::Info };
    let mut event = LogEvent::new(level, EventCategory::Signing, stage).with_data(
        serde_json::json!({
            "stage": stage,
            "signature": signature
        }),
    );

    if let Some(err) = error {
        event = event.with_error("SIGNING_ERROR", err);
    }

    match level {
        LogLevel::Warn => tracing::warn!(target: "privacy_devkit::signing", "{}", event.to_json()),
        _ => tracing::info!(target: "privacy_devkit::signing", "{}", event.to_json()),
    }
}

/// Log an API response
pub fn log_api_response(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u64,
    correlation_id: &str,
) {
    let level = if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };

    let event = LogEvent::new(
        level,
        EventCategory::Api,
        format!("{} {} -> {}", method, path, status),
    )
    .with_correlation_id(correlation_id)
    .with_duration(duration_ms)
    .with_data(serde_json::json!({
        "method": method,
        "path": path,
        "status": status
    }));

    match level {
        LogLevel::Error => tracing::error!(target: "privacy_devkit::api", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "privacy_devkit::api", "{}", event.to_json()),
        _ => tracing::info!(target: "privacy_devkit::api", "{}", event.to_json()),
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_filter();
        EnvFilter::new(format!(
            "privacy_devkit={},tower_http={},axum={}",
            level, level, level
        ))
    });

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from `PRIVACY_LOG_LEVEL` / `PRIVACY_LOG_JSON`
pub fn init_from_env() -> Result<(), LoggingError> {
    let level = env::var(ENV_LOG_LEVEL)
        .map(|v| LogLevel::from(v.as_str()))
        .unwrap_or(LogLevel::Warn);
    let json_format = env::var(ENV_LOG_JSON).map(|v| v == "1").unwrap_or(false);

    init_logging(level, json_format)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..12].to_string()
}
