// ── Core error types ──
//
// User-facing errors from spoolfleet-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<spoolfleet_api::Error>` impl translates transport-layer
// errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Hub is not connected")]
    Disconnected,

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Spool not found: {identifier}")]
    SpoolNotFound { identifier: String },

    #[error("Printer not found: {identifier}")]
    PrinterNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Missing capability: {capability}")]
    PermissionDenied { capability: String },

    #[error("Operation rejected by backend: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<spoolfleet_api::Error> for CoreError {
    fn from(err: spoolfleet_api::Error) -> Self {
        match err {
            spoolfleet_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            spoolfleet_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            spoolfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            spoolfleet_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            spoolfleet_api::Error::NotFound { resource } => {
                // The only 404-able resources in this API are printers and
                // spools; the path tells us which.
                if resource.contains("/spools/") {
                    CoreError::SpoolNotFound {
                        identifier: resource,
                    }
                } else {
                    CoreError::PrinterNotFound {
                        identifier: resource,
                    }
                }
            }
            spoolfleet_api::Error::Validation { message } => {
                CoreError::ValidationFailed { message }
            }
            spoolfleet_api::Error::Api { message, status } => CoreError::Api {
                message,
                status: Some(status),
            },
            spoolfleet_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            spoolfleet_api::Error::WebSocketClosed { code, reason } => {
                CoreError::ConnectionFailed {
                    url: String::new(),
                    reason: format!("WebSocket closed (code {code}): {reason}"),
                }
            }
            spoolfleet_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
