//! Configuration for the rackstate agent.
//!
//! One TOML file (plus `RACKSTATE_` environment overrides) describes how to
//! reach NetBox, which driver resolves each placement intent, and how a
//! reconciliation pass behaves. This crate loads it, resolves the API token
//! and translates everything into `rackstate_core` runtime types. Core never
//! reads these types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use rackstate_core::reconcile::{parse_custom_fields, parse_tags};
use rackstate_core::{
    DeviceRoles, DriverSpec, PlacementDrivers, ReconcileConfig, StoreConfig, TlsVerification,
};

/// Environment variable consulted for the token when `token_env` is unset
/// or empty.
pub const TOKEN_ENV: &str = "RACKSTATE_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no NetBox API token configured")]
    NoCredentials,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub netbox: Netbox,

    #[serde(default)]
    pub device: DeviceSection,

    // Placement drivers.
    #[serde(default)]
    pub tenant: DriverSection,
    #[serde(default)]
    pub site: DriverSection,
    #[serde(default)]
    pub location: DriverSection,
    #[serde(default)]
    pub rack: DriverSection,
    #[serde(default)]
    pub position: DriverSection,
    #[serde(default)]
    pub face: DriverSection,
    #[serde(default)]
    pub height: DriverSection,

    #[serde(default)]
    pub purge_old_devices: bool,
    #[serde(default)]
    pub preserve_tags: bool,
    #[serde(default)]
    pub expansion_as_device: bool,
    #[serde(default)]
    pub update_all: bool,
    #[serde(default)]
    pub update_network: bool,
    #[serde(default)]
    pub update_inventory: bool,
    #[serde(default)]
    pub update_psu: bool,
    #[serde(default)]
    pub update_location: bool,

    /// Shell command printing the hostname, used when the facts carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname_cmd: Option<String>,
}

/// `[netbox]`: where the inventory lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Netbox {
    /// NetBox base URL (e.g. "https://netbox.example.com").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// API token (plaintext; prefer `token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name holding the API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Netbox {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// `[device]`: roles, labels and naming of the records the agent creates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSection {
    #[serde(default = "default_server_role")]
    pub server_role: String,

    #[serde(default = "default_chassis_role")]
    pub chassis_role: String,

    #[serde(default = "default_blade_role")]
    pub blade_role: String,

    /// Manufacturer for device types created on the fly.
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,

    /// Platform name overriding OS detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: String,

    /// Comma-separated `key=value` pairs.
    #[serde(default)]
    pub custom_fields: String,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            server_role: default_server_role(),
            chassis_role: default_chassis_role(),
            blade_role: default_blade_role(),
            manufacturer: default_manufacturer(),
            platform: None,
            tags: String::new(),
            custom_fields: String::new(),
        }
    }
}

fn default_server_role() -> String {
    DeviceRoles::default().server
}
fn default_chassis_role() -> String {
    DeviceRoles::default().chassis
}
fn default_blade_role() -> String {
    DeviceRoles::default().blade
}
fn default_manufacturer() -> String {
    ReconcileConfig::default().manufacturer
}

/// One placement driver (`[site]`, `[rack]`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DriverSection {
    /// `"<name>:<value>"`, e.g. `"cmd:cat /etc/rack"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// External executable resolving the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl From<&DriverSection> for DriverSpec {
    fn from(section: &DriverSection) -> Self {
        Self {
            driver: section.driver.clone(),
            driver_file: section.driver_file.clone(),
            regex: section.regex.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "rackstate", "rackstate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rackstate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `RACKSTATE_*` variables
/// (`__` separates nesting: `RACKSTATE_NETBOX__URL`).
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RACKSTATE_").split("__"))
}

/// Load the configuration. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

// ── Translation to runtime types ────────────────────────────────────

/// Connection settings supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub insecure: bool,
    pub timeout: Option<u64>,
}

impl Config {
    /// Connection settings, command-line overrides first.
    pub fn store_config(&self, overrides: &ConnectionOverrides) -> Result<StoreConfig, ConfigError> {
        let raw_url = overrides
            .url
            .as_deref()
            .or(self.netbox.url.as_deref())
            .ok_or_else(|| invalid("netbox.url", "not configured"))?;
        let url = parse_url(raw_url)?;

        let token = match overrides.token.as_deref() {
            Some(token) if !token.is_empty() => SecretString::from(token.to_owned()),
            _ => resolve_token(&self.netbox, |name| std::env::var(name).ok())?,
        };

        Ok(StoreConfig {
            url,
            token,
            tls: tls_verification(&self.netbox, overrides.insecure),
            timeout: Duration::from_secs(overrides.timeout.unwrap_or(self.netbox.timeout)),
        })
    }

    /// Behaviour of a reconciliation pass.
    pub fn reconcile_config(&self) -> Result<ReconcileConfig, ConfigError> {
        let custom_fields: BTreeMap<String, String> = parse_custom_fields(&self.device.custom_fields)
            .map_err(|e| invalid("device.custom_fields", e.to_string()))?;

        Ok(ReconcileConfig {
            purge_old_devices: self.purge_old_devices,
            preserve_tags: self.preserve_tags,
            expansion_as_device: self.expansion_as_device,
            update_all: self.update_all,
            update_location: self.update_location,
            roles: DeviceRoles {
                server: self.device.server_role.clone(),
                chassis: self.device.chassis_role.clone(),
                blade: self.device.blade_role.clone(),
            },
            manufacturer: self.device.manufacturer.clone(),
            tags: parse_tags(&self.device.tags),
            custom_fields,
        })
    }

    pub fn placement_drivers(&self) -> PlacementDrivers {
        PlacementDrivers {
            tenant: (&self.tenant).into(),
            site: (&self.site).into(),
            location: (&self.location).into(),
            rack: (&self.rack).into(),
            position: (&self.position).into(),
            face: (&self.face).into(),
            height: (&self.height).into(),
        }
    }

    /// Selective-sync flags that are accepted but have no effect here:
    /// network, inventory and PSU sync are not part of the reconciler.
    pub fn unsupported_flags(&self) -> Vec<&'static str> {
        [
            ("update_network", self.update_network),
            ("update_inventory", self.update_inventory),
            ("update_psu", self.update_psu),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Parse and check a NetBox base URL.
pub fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid("netbox.url", format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "netbox.url",
            format!("expected an http(s) URL, got {raw}"),
        ));
    }
    Ok(url)
}

/// Token from the credential chain: the variable named by `token_env`,
/// then [`TOKEN_ENV`], then the plaintext `token`.
pub fn resolve_token(
    netbox: &Netbox,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let from_env = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(token) = netbox.token_env.as_deref().and_then(from_env) {
        return Ok(SecretString::from(token));
    }
    if let Some(token) = from_env(TOKEN_ENV) {
        return Ok(SecretString::from(token));
    }
    if let Some(token) = netbox.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token.to_owned()));
    }
    Err(ConfigError::NoCredentials)
}

pub fn tls_verification(netbox: &Netbox, insecure_flag: bool) -> TlsVerification {
    if insecure_flag || netbox.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = &netbox.ca_cert {
        TlsVerification::CustomCa(ca.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.netbox.timeout, 30);
        assert_eq!(config.device.server_role, "Server");
        assert_eq!(config.device.manufacturer, "Generic");
        assert!(config.site.driver.is_none());
    }

    #[test]
    fn file_translates_into_runtime_types() {
        let (_dir, path) = write_config(
            r#"
            update_location = true
            preserve_tags = true
            hostname_cmd = "hostname -s"

            [netbox]
            url = "https://netbox.example.com"
            token = "plain"
            timeout = 5

            [device]
            blade_role = "Compute Blade"
            tags = "web, prod, web"
            custom_fields = "owner=ops,env=prod"

            [site]
            driver = "cmd:cat /etc/site"
            regex = "^site-(\\w+)$"

            [rack]
            driver_file = "/usr/local/bin/rack-lookup"
            "#,
        );
        let config = load_config(&path).unwrap();

        let reconcile = config.reconcile_config().unwrap();
        assert!(reconcile.update_location);
        assert!(reconcile.location_sync_enabled());
        assert_eq!(reconcile.roles.blade, "Compute Blade");
        assert_eq!(reconcile.tags, vec!["prod".to_owned(), "web".to_owned()]);
        assert_eq!(reconcile.custom_fields.get("owner").map(String::as_str), Some("ops"));

        let drivers = config.placement_drivers();
        assert_eq!(
            drivers.site.name_and_value(),
            Some(("cmd", "cat /etc/site"))
        );
        assert_eq!(
            drivers.rack.driver_file.as_deref(),
            Some(Path::new("/usr/local/bin/rack-lookup"))
        );
        assert!(!drivers.tenant.is_set());
        assert_eq!(config.hostname_cmd.as_deref(), Some("hostname -s"));
    }

    #[test]
    fn command_line_wins_over_file() {
        let config = Config {
            netbox: Netbox {
                url: Some("https://file.example.com".into()),
                token: Some("from-file".into()),
                timeout: 10,
                ..Netbox::default()
            },
            ..Config::default()
        };
        let store = config
            .store_config(&ConnectionOverrides {
                url: Some("https://flag.example.com".into()),
                token: Some("from-flag".into()),
                insecure: true,
                timeout: Some(3),
            })
            .unwrap();

        assert_eq!(store.url.host_str(), Some("flag.example.com"));
        assert_eq!(store.token.expose_secret(), "from-flag");
        assert_eq!(store.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(store.timeout, Duration::from_secs(3));
    }

    #[test]
    fn token_precedence() {
        let netbox = Netbox {
            token: Some("plain".into()),
            token_env: Some("MY_NETBOX_TOKEN".into()),
            ..Netbox::default()
        };

        let both = |name: &str| match name {
            "MY_NETBOX_TOKEN" => Some("named".to_owned()),
            TOKEN_ENV => Some("generic".to_owned()),
            _ => None,
        };
        let generic_only = |name: &str| (name == TOKEN_ENV).then(|| "generic".to_owned());

        let token = resolve_token(&netbox, both).unwrap();
        assert_eq!(token.expose_secret(), "named");
        let token = resolve_token(&netbox, generic_only).unwrap();
        assert_eq!(token.expose_secret(), "generic");
        let token = resolve_token(&netbox, |_| None).unwrap();
        assert_eq!(token.expose_secret(), "plain");

        let err = resolve_token(&Netbox::default(), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials));
    }

    #[test]
    fn bad_values_are_validation_errors() {
        let mut config = Config::default();
        config.device.custom_fields = "owner".into();
        let err = config.reconcile_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "device.custom_fields"));

        assert!(matches!(
            parse_url("ftp://netbox").unwrap_err(),
            ConfigError::Validation { .. }
        ));
        let err = Config::default()
            .store_config(&ConnectionOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "netbox.url"));
    }

    #[test]
    fn ca_cert_only_applies_when_verifying() {
        let netbox = Netbox {
            ca_cert: Some("/etc/ssl/netbox.pem".into()),
            ..Netbox::default()
        };
        assert_eq!(
            tls_verification(&netbox, false),
            TlsVerification::CustomCa("/etc/ssl/netbox.pem".into())
        );
        assert_eq!(
            tls_verification(&netbox, true),
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn unsupported_flags_are_reported() {
        let config = Config {
            update_psu: true,
            update_network: true,
            ..Config::default()
        };
        assert_eq!(config.unsupported_flags(), vec!["update_network", "update_psu"]);
    }
}
