// ── Observed hardware facts ──
//
// The reconciler is written once against `PhysicalUnitFacts`. Hardware
// discovery lives outside this crate; `StaticFacts` is the file-backed
// implementation the CLI feeds it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::Face;

const OS_RELEASE: &str = "/etc/os-release";
const KERNEL_HOSTNAME: &str = "/proc/sys/kernel/hostname";

/// Chassis a blade is mounted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisFacts {
    pub serial: String,
    pub name: String,
    /// Chassis model, used as its device type.
    pub product: String,
}

/// Physical form of the unit being reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormFactor {
    #[default]
    Standalone,
    Blade {
        chassis: ChassisFacts,
        /// Name of the chassis bay the blade occupies.
        slot: String,
    },
}

/// An expansion unit (GPU or drive sled) owned by a blade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionFacts {
    pub product: String,
    /// Chassis bay the expansion unit occupies.
    pub slot: String,
}

/// What the reconciler needs to know about one physical unit.
pub trait PhysicalUnitFacts {
    fn serial(&self) -> &str;

    fn hostname(&self) -> &str;

    /// Model name, used as the device type.
    fn product_name(&self) -> &str;

    fn form_factor(&self) -> &FormFactor;

    /// 1-based rack unit, when known.
    fn position(&self) -> Option<u32> {
        None
    }

    fn face(&self) -> Option<Face> {
        None
    }

    /// Present when the unit owns an expansion slot.
    fn expansion(&self) -> Option<&ExpansionFacts> {
        None
    }

    /// Operating system name; `None` when it could not be detected.
    fn platform(&self) -> Option<&str> {
        None
    }

    fn chassis(&self) -> Option<(&ChassisFacts, &str)> {
        match self.form_factor() {
            FormFactor::Standalone => None,
            FormFactor::Blade { chassis, slot } => Some((chassis, slot.as_str())),
        }
    }

    /// Serial given to the expansion unit's shadow device.
    fn expansion_serial(&self) -> String {
        format!("{} expansion", self.serial())
    }

    /// Name given to the expansion unit's shadow device.
    fn expansion_name(&self) -> String {
        format!("{} expansion", self.hostname())
    }
}

// ── StaticFacts ─────────────────────────────────────────────────────

/// Facts read from a JSON or TOML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticFacts {
    pub serial: String,
    /// Left empty to fall back to `hostname_cmd` or the kernel hostname.
    #[serde(default)]
    pub hostname: String,
    pub product_name: String,
    #[serde(default)]
    pub form_factor: FormFactor,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub face: Option<Face>,
    #[serde(default)]
    pub expansion: Option<ExpansionFacts>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl StaticFacts {
    /// Load from a file; `.toml` is parsed as TOML, anything else as JSON.
    pub async fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::Facts {
                message: format!("cannot read {}: {e}", path.display()),
            })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw).map_err(|e| CoreError::Facts {
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        toml::from_str(raw).map_err(|e| CoreError::Facts {
            message: e.to_string(),
        })
    }

    /// Fill an empty hostname from `hostname_cmd`, else the kernel hostname.
    pub async fn resolve_hostname(&mut self, hostname_cmd: Option<&str>) -> Result<(), CoreError> {
        if !self.hostname.trim().is_empty() {
            return Ok(());
        }

        let hostname = match hostname_cmd {
            Some(cmd) => run_hostname_cmd(cmd).await?,
            None => tokio::fs::read_to_string(KERNEL_HOSTNAME)
                .await
                .map_err(|e| CoreError::Facts {
                    message: format!("cannot read kernel hostname: {e}"),
                })?,
        };
        self.hostname = hostname.trim().to_owned();
        debug!(hostname = %self.hostname, "resolved hostname");
        Ok(())
    }

    /// Configured platform wins; otherwise keep the file's value, otherwise
    /// use the OS pretty name. Detection failure leaves `None`.
    pub async fn resolve_platform(&mut self, configured: Option<&str>) {
        if let Some(name) = configured {
            self.platform = Some(name.to_owned());
            return;
        }
        if self.platform.is_some() {
            return;
        }
        self.platform = match tokio::fs::read_to_string(OS_RELEASE).await {
            Ok(content) => parse_os_release(&content),
            Err(e) => {
                debug!(error = %e, "platform detection unavailable");
                None
            }
        };
    }

    /// Use driver-supplied placement where the facts carry none.
    pub fn fill_placement(&mut self, position: Option<u32>, face: Option<Face>) {
        if self.position.is_none() {
            self.position = position;
        }
        if self.face.is_none() {
            self.face = face;
        }
    }
}

impl PhysicalUnitFacts for StaticFacts {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn product_name(&self) -> &str {
        &self.product_name
    }

    fn form_factor(&self) -> &FormFactor {
        &self.form_factor
    }

    fn position(&self) -> Option<u32> {
        self.position
    }

    fn face(&self) -> Option<Face> {
        self.face
    }

    fn expansion(&self) -> Option<&ExpansionFacts> {
        self.expansion.as_ref()
    }

    fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }
}

async fn run_hostname_cmd(cmd: &str) -> Result<String, CoreError> {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .output()
        .await
        .map_err(|e| CoreError::Facts {
            message: format!("hostname_cmd {cmd:?} failed to start: {e}"),
        })?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `PRETTY_NAME` from os-release content, unquoted.
pub fn parse_os_release(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim().trim_matches('"').trim_matches('\'').to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standalone_is_the_default_form_factor() {
        let facts = StaticFacts::from_json_str(
            r#"{ "serial": "ABC123", "hostname": "web-01", "product_name": "PowerEdge R640" }"#,
        )
        .unwrap();
        assert_eq!(facts.form_factor, FormFactor::Standalone);
        assert!(facts.chassis().is_none());
    }

    #[test]
    fn blade_facts_from_toml() {
        let facts = StaticFacts::from_toml_str(
            r#"
            serial = "BLD003"
            hostname = "blade-03"
            product_name = "PowerEdge M640"
            face = "front"

            [form_factor]
            kind = "blade"
            slot = "Slot 3"
            chassis = { serial = "CHS001", name = "chassis-01", product = "PowerEdge M1000e" }

            [expansion]
            product = "GPU Sled"
            slot = "Slot 4"
            "#,
        )
        .unwrap();

        let (chassis, slot) = facts.chassis().unwrap();
        assert_eq!(chassis.serial, "CHS001");
        assert_eq!(slot, "Slot 3");
        assert_eq!(facts.face, Some(Face::Front));
        assert_eq!(facts.expansion_serial(), "BLD003 expansion");
        assert_eq!(facts.expansion_name(), "blade-03 expansion");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = StaticFacts::from_json_str(
            r#"{ "serial": "A", "product_name": "X", "is_blade": true }"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Facts { .. }));
    }

    #[test]
    fn os_release_pretty_name() {
        let content = "NAME=\"Debian GNU/Linux\"\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\n";
        assert_eq!(
            parse_os_release(content).as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
        assert_eq!(parse_os_release("ID=alpine\n"), None);
    }

    #[test]
    fn file_placement_wins_over_drivers() {
        let mut facts = StaticFacts::from_json_str(
            r#"{ "serial": "A", "product_name": "X", "position": 12 }"#,
        )
        .unwrap();
        facts.fill_placement(Some(30), Some(Face::Rear));
        assert_eq!(facts.position, Some(12));
        assert_eq!(facts.face, Some(Face::Rear));
    }

    #[tokio::test]
    async fn hostname_cmd_fills_empty_hostname() {
        let mut facts =
            StaticFacts::from_json_str(r#"{ "serial": "A", "product_name": "X" }"#).unwrap();
        facts.resolve_hostname(Some("echo web-42")).await.unwrap();
        assert_eq!(facts.hostname, "web-42");
    }

    #[tokio::test]
    async fn configured_platform_overrides_file() {
        let mut facts = StaticFacts::from_json_str(
            r#"{ "serial": "A", "product_name": "X", "platform": "Ubuntu" }"#,
        )
        .unwrap();
        facts.resolve_platform(Some("Debian 12")).await;
        assert_eq!(facts.platform.as_deref(), Some("Debian 12"));
    }

    #[tokio::test]
    async fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.toml");
        std::fs::write(&path, "serial = \"A\"\nproduct_name = \"X\"\n").unwrap();
        let facts = StaticFacts::load(&path).await.unwrap();
        assert_eq!(facts.serial, "A");
    }
}
