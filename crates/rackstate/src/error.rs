//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use rackstate_config::ConfigError;
use rackstate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to NetBox at {url}")]
    #[diagnostic(
        code(rackstate::connection_failed),
        help(
            "{reason}\n\
             Check the URL and that NetBox is reachable from this host.\n\
             Self-signed certificate? Use --insecure (-k) or set [netbox] ca_cert."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(rackstate::timeout),
        help("Increase the timeout with --timeout or [netbox] timeout.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(rackstate::auth_failed),
        help("{message}\nCheck that the API token is valid and has write permission.")
    )]
    AuthFailed { message: String },

    #[error("No NetBox API token configured")]
    #[diagnostic(
        code(rackstate::no_credentials),
        help(
            "Pass --token, set RACKSTATE_TOKEN, or configure [netbox] token_env \
             or token in the config file."
        )
    )]
    NoCredentials,

    // ── Reconciliation ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(rackstate::placement),
        help("Configure a [site] driver; every device needs a site.")
    )]
    Placement { message: String },

    #[error("Device type {model:?} is unavailable")]
    #[diagnostic(code(rackstate::device_type), help("{reason}"))]
    DeviceType { model: String, reason: String },

    #[error("{entity_type} '{identifier}' not found")]
    #[diagnostic(code(rackstate::not_found))]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("NetBox error ({code}): {message}")]
    #[diagnostic(code(rackstate::api_error))]
    ApiError { code: String, message: String },

    // ── Inputs ───────────────────────────────────────────────────────
    #[error("Driver {driver:?} failed")]
    #[diagnostic(
        code(rackstate::driver),
        help("{message}\nRun `rackstate resolve -v` to inspect every driver.")
    )]
    Driver { driver: String, message: String },

    #[error("Invalid facts: {message}")]
    #[diagnostic(
        code(rackstate::facts),
        help("Check the file passed with --facts.")
    )]
    Facts { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rackstate::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration file not found")]
    #[diagnostic(code(rackstate::no_config), help("Expected at: {path}"))]
    NoConfig { path: String },

    #[error("{message}")]
    #[diagnostic(code(rackstate::config))]
    Config { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Facts { .. } => exit_code::USAGE,
            Self::Placement { .. }
            | Self::Driver { .. }
            | Self::Validation { .. }
            | Self::NoConfig { .. }
            | Self::Config { .. } => exit_code::CONFIG,
            Self::DeviceType { .. } | Self::ApiError { .. } => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingSite | CoreError::MissingParentSite { .. } => CliError::Placement {
                message: err.to_string(),
            },

            CoreError::DeviceTypeUnavailable { model, reason } => {
                CliError::DeviceType { model, reason }
            }

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                entity_type,
                identifier,
            },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Rejected { message } => CliError::ApiError {
                code: "rejected".into(),
                message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Driver { driver, message } => CliError::Driver { driver, message },

            CoreError::Facts { message } => CliError::Facts { message },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials => CliError::NoCredentials,
            ConfigError::Figment(e) => CliError::Config {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(CliError::from(CoreError::MissingSite).exit_code(), exit_code::CONFIG);
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(CoreError::Api {
                message: "boom".into(),
                status: Some(500),
            })
            .exit_code(),
            exit_code::GENERAL
        );
        assert_eq!(CliError::from(ConfigError::NoCredentials).exit_code(), exit_code::AUTH);
    }
}
