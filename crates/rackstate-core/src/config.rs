// ── Runtime configuration ──
//
// These types describe how to reach NetBox and how a reconciliation pass
// behaves. They never touch disk: the CLI builds them from its config
// layer and hands them in.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (lab instances with self-signed certs).
    DangerAcceptInvalid,
}

/// Connection settings for a NetBox instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// NetBox URL, with or without the `/api` suffix.
    pub url: Url,
    /// API token.
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Role names given to the device records the reconciler creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRoles {
    pub server: String,
    pub chassis: String,
    pub blade: String,
}

impl Default for DeviceRoles {
    fn default() -> Self {
        Self {
            server: "Server".into(),
            chassis: "Server Chassis".into(),
            blade: "Blade".into(),
        }
    }
}

/// Behaviour of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Delete a device that holds this hostname under a different serial.
    pub purge_old_devices: bool,
    /// Union configured tags with the ones already on the device.
    pub preserve_tags: bool,
    /// Model expansion units as their own device records.
    pub expansion_as_device: bool,
    /// Overwrite every managed field, not only name/tags/fields/platform.
    pub update_all: bool,
    /// Move the device when its site/rack/location intents change.
    pub update_location: bool,
    pub roles: DeviceRoles,
    /// Manufacturer attached to device types created on the fly.
    pub manufacturer: String,
    /// Configured tag names, deduplicated and sorted.
    pub tags: Vec<String>,
    pub custom_fields: BTreeMap<String, String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            purge_old_devices: false,
            preserve_tags: false,
            expansion_as_device: false,
            update_all: false,
            update_location: false,
            roles: DeviceRoles::default(),
            manufacturer: "Generic".into(),
            tags: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }
}

impl ReconcileConfig {
    /// Topology (site/rack/location) is reconciled in either mode.
    pub fn location_sync_enabled(&self) -> bool {
        self.update_all || self.update_location
    }
}
