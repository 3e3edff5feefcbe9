//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use spoolfleet_config::ConfigError;
use spoolfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(spoolfleet::connection_failed),
        help(
            "Check that the backend is running and accessible.\n\
             URL: {url}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(spoolfleet::auth_failed),
        help(
            "Verify your API key.\n\
             Set SPOOLFLEET_API_KEY or backend.api_key in the config file."
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured")]
    #[diagnostic(
        code(spoolfleet::no_api_key),
        help(
            "Set the SPOOLFLEET_API_KEY environment variable, pass --api-key,\n\
             or run: spoolfleet config init"
        )
    )]
    NoApiKey,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(spoolfleet::not_found),
        help("Run: spoolfleet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Permissions ──────────────────────────────────────────────────
    #[error("This API key lacks the '{capability}' capability")]
    #[diagnostic(
        code(spoolfleet::permission_denied),
        help("Grant the capability on the backend, or use a different API key.")
    )]
    PermissionDenied { capability: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Backend rejected the operation: {message}")]
    #[diagnostic(code(spoolfleet::rejected))]
    Rejected { message: String },

    #[error("Backend API error: {message}")]
    #[diagnostic(code(spoolfleet::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(spoolfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error")]
    #[diagnostic(code(spoolfleet::config))]
    Config(#[from] ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(spoolfleet::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoApiKey => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(ConfigError::NoApiKey) => exit_code::AUTH,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "hub connection was shut down".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::SpoolNotFound { identifier } => CliError::NotFound {
                resource_type: "spool".into(),
                identifier,
                list_command: "spools list".into(),
            },

            CoreError::PrinterNotFound { identifier } => CliError::NotFound {
                resource_type: "printer".into(),
                identifier,
                list_command: "status".into(),
            },

            CoreError::PermissionDenied { capability } => {
                CliError::PermissionDenied { capability }
            }

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                message,
                status: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_track_error_class() {
        let e: CliError = CoreError::PrinterNotFound {
            identifier: "9".into(),
        }
        .into();
        assert_eq!(e.exit_code(), exit_code::NOT_FOUND);

        let e: CliError = CoreError::PermissionDenied {
            capability: "printers:clear_plate".into(),
        }
        .into();
        assert_eq!(e.exit_code(), exit_code::PERMISSION);

        let e = CliError::Config(ConfigError::NoApiKey);
        assert_eq!(e.exit_code(), exit_code::AUTH);
    }
}
