// ── Core error types ──
//
// Reconciliation-level errors. Consumers never see raw HTTP details; the
// `From<rackstate_api::Error>` impl folds transport failures into the
// variants below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fatal reconciliation errors ──────────────────────────────────
    #[error("No site could be resolved; a site is mandatory for every device")]
    MissingSite,

    #[error("A {entity} was requested but no site could be resolved to hold it")]
    MissingParentSite { entity: String },

    #[error("Device type {model:?} is unavailable: {reason}")]
    DeviceTypeUnavailable { model: String, reason: String },

    #[error("Entity not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Store errors ─────────────────────────────────────────────────
    #[error("Cannot connect to NetBox at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("NetBox request timed out")]
    Timeout,

    #[error("Operation rejected by the store: {message}")]
    Rejected { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Inputs ───────────────────────────────────────────────────────
    #[error("Driver {driver:?} failed: {message}")]
    Driver { driver: String, message: String },

    #[error("Invalid facts: {message}")]
    Facts { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rackstate_api::Error> for CoreError {
    fn from(err: rackstate_api::Error) -> Self {
        match err {
            rackstate_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            rackstate_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
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
            rackstate_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            rackstate_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            rackstate_api::Error::Api { status: 409, message } => {
                CoreError::Rejected { message }
            }
            rackstate_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            rackstate_api::Error::MultipleResults { endpoint } => CoreError::Api {
                message: format!("ambiguous lookup on {endpoint}"),
                status: None,
            },
            rackstate_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_becomes_rejected() {
        let err = CoreError::from(rackstate_api::Error::Api {
            status: 409,
            message: "dependent objects".into(),
        });
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn server_error_keeps_status() {
        let err = CoreError::from(rackstate_api::Error::Api {
            status: 502,
            message: "bad gateway".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));
    }

    #[test]
    fn forbidden_becomes_authentication() {
        let err = CoreError::from(rackstate_api::Error::Authentication {
            message: "Invalid token".into(),
        });
        assert_eq!(err.to_string(), "Authentication failed: Invalid token");
    }
}
