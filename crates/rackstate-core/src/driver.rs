// ── Placement drivers ──
//
// A driver turns a configured `"<name>:<value>"` string into the raw value
// of one placement intent (site, rack, ...). Built-in resolvers read files
// or run commands; `driver_file` points at an external executable that is
// run with `<value> [<regex>]` and prints the value on stdout.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::error::CoreError;
use crate::model::Face;

/// Resolves one driver value.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// `Ok(None)` means the intent is unset.
    async fn resolve(&self, value: &str, regex: Option<&Regex>)
    -> Result<Option<String>, CoreError>;
}

/// Apply the optional pattern: capture group 1 when the pattern has one,
/// else the whole match. Without a pattern the trimmed text is returned.
pub fn extract(text: &str, regex: Option<&Regex>) -> Option<String> {
    let found = match regex {
        None => Some(text.trim().to_owned()),
        Some(re) => re.captures(text).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim().to_owned())
        }),
    };
    found.filter(|v| !v.is_empty())
}

fn driver_error(driver: &str, message: impl Into<String>) -> CoreError {
    CoreError::Driver {
        driver: driver.into(),
        message: message.into(),
    }
}

// ── Built-in resolvers ──────────────────────────────────────────────

/// `file:<path>` reads the file.
pub struct FileResolver;

#[async_trait]
impl Resolver for FileResolver {
    async fn resolve(
        &self,
        value: &str,
        regex: Option<&Regex>,
    ) -> Result<Option<String>, CoreError> {
        let content = tokio::fs::read_to_string(value)
            .await
            .map_err(|e| driver_error("file", format!("cannot read {value}: {e}")))?;
        Ok(extract(&content, regex))
    }
}

/// `cmd:<shell command>` runs the command through `sh -c`.
pub struct CommandResolver;

#[async_trait]
impl Resolver for CommandResolver {
    async fn resolve(
        &self,
        value: &str,
        regex: Option<&Regex>,
    ) -> Result<Option<String>, CoreError> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(value)
            .output()
            .await
            .map_err(|e| driver_error("cmd", format!("cannot run {value:?}: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(extract(&stdout, regex))
    }
}

/// External executable given by `driver_file`.
pub struct PluginResolver {
    path: PathBuf,
}

impl PluginResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Resolver for PluginResolver {
    async fn resolve(
        &self,
        value: &str,
        regex: Option<&Regex>,
    ) -> Result<Option<String>, CoreError> {
        let name = self.path.display().to_string();
        let mut cmd = tokio::process::Command::new(&self.path);
        cmd.arg(value);
        if let Some(re) = regex {
            cmd.arg(re.as_str());
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| driver_error(&name, format!("cannot execute: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(driver_error(
                &name,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        // The plugin applies the pattern itself.
        Ok(extract(&String::from_utf8_lossy(&output.stdout), None))
    }
}

// ── Specs and registry ──────────────────────────────────────────────

/// Configured driver for one intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverSpec {
    /// `"<name>:<value>"`; the value may itself contain `:`.
    pub driver: Option<String>,
    /// External executable; takes precedence over the named driver.
    pub driver_file: Option<PathBuf>,
    pub regex: Option<String>,
}

impl DriverSpec {
    /// Split `driver` into name and value.
    pub fn name_and_value(&self) -> Option<(&str, &str)> {
        let raw = self.driver.as_deref()?;
        Some(raw.split_once(':').unwrap_or((raw, "")))
    }

    pub fn is_set(&self) -> bool {
        self.driver_file.is_some() || self.driver.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Lookup table of resolvers, populated at startup.
pub struct DriverRegistry {
    resolvers: HashMap<String, Arc<dyn Resolver>>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl DriverRegistry {
    /// Registry without any driver.
    pub fn empty() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Registry with the `file` and `cmd` drivers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("file", Arc::new(FileResolver));
        registry.register("cmd", Arc::new(CommandResolver));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) {
        self.resolvers.insert(name.into(), resolver);
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Evaluate `spec` for the intent called `intent`.
    pub async fn evaluate(
        &self,
        intent: &str,
        spec: &DriverSpec,
    ) -> Result<Option<String>, CoreError> {
        if !spec.is_set() {
            return Ok(None);
        }

        let regex = spec
            .regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| CoreError::Config {
                message: format!("invalid regex for {intent}: {e}"),
            })?;
        let value = spec.name_and_value().map_or("", |(_, value)| value);

        let resolved = if let Some(path) = &spec.driver_file {
            PluginResolver::new(path.clone())
                .resolve(value, regex.as_ref())
                .await?
        } else {
            let (name, _) = spec.name_and_value().unwrap_or_default();
            let resolver = self.resolvers.get(name).ok_or_else(|| CoreError::Config {
                message: format!(
                    "unknown driver {name:?} for {intent} (known: {})",
                    self.names().join(", ")
                ),
            })?;
            resolver.resolve(value, regex.as_ref()).await?
        };

        debug!(intent, value = ?resolved, "driver resolved");
        Ok(resolved.filter(|v| !v.trim().is_empty()))
    }
}

// ── Placement intents ───────────────────────────────────────────────

/// One driver spec per placement intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementDrivers {
    pub tenant: DriverSpec,
    pub site: DriverSpec,
    pub location: DriverSpec,
    pub rack: DriverSpec,
    pub position: DriverSpec,
    pub face: DriverSpec,
    pub height: DriverSpec,
}

/// Where the configuration says the device belongs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementIntents {
    pub tenant: Option<String>,
    pub site: Option<String>,
    pub location: Option<String>,
    pub rack: Option<String>,
    pub position: Option<u32>,
    pub face: Option<Face>,
    /// Rack units of the device type.
    pub height: Option<u32>,
}

impl PlacementDrivers {
    /// Raw value of every intent, in a fixed order.
    pub async fn raw_values(
        &self,
        registry: &DriverRegistry,
    ) -> Result<Vec<(&'static str, Option<String>)>, CoreError> {
        let specs = [
            ("tenant", &self.tenant),
            ("site", &self.site),
            ("location", &self.location),
            ("rack", &self.rack),
            ("position", &self.position),
            ("face", &self.face),
            ("height", &self.height),
        ];
        let mut values = Vec::with_capacity(specs.len());
        for (intent, spec) in specs {
            values.push((intent, registry.evaluate(intent, spec).await?));
        }
        Ok(values)
    }

    /// Evaluate and type-check every intent.
    pub async fn resolve(&self, registry: &DriverRegistry) -> Result<PlacementIntents, CoreError> {
        let position = registry
            .evaluate("position", &self.position)
            .await?
            .map(|raw| parse_position(&raw))
            .transpose()?;
        let face = registry
            .evaluate("face", &self.face)
            .await?
            .map(|raw| {
                raw.parse::<Face>()
                    .map_err(|_| driver_error("face", format!("{raw:?} is not front or rear")))
            })
            .transpose()?;
        let height = registry
            .evaluate("height", &self.height)
            .await?
            .map(|raw| {
                raw.trim().parse::<u32>().map_err(|_| {
                    driver_error("height", format!("{raw:?} is not a non-negative integer"))
                })
            })
            .transpose()?;

        Ok(PlacementIntents {
            tenant: registry.evaluate("tenant", &self.tenant).await?,
            site: registry.evaluate("site", &self.site).await?,
            location: registry.evaluate("location", &self.location).await?,
            rack: registry.evaluate("rack", &self.rack).await?,
            position,
            face,
            height,
        })
    }
}

fn parse_position(raw: &str) -> Result<u32, CoreError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(driver_error(
            "position",
            format!("{raw:?} is not a positive integer"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl Resolver for Fixed {
        async fn resolve(
            &self,
            _value: &str,
            regex: Option<&Regex>,
        ) -> Result<Option<String>, CoreError> {
            Ok(extract(self.0, regex))
        }
    }

    fn spec(driver: &str) -> DriverSpec {
        DriverSpec {
            driver: Some(driver.into()),
            ..DriverSpec::default()
        }
    }

    #[test]
    fn extract_prefers_first_group() {
        let re = Regex::new(r"rack=(\w+)").unwrap();
        assert_eq!(extract("site=par rack=R12", Some(&re)).as_deref(), Some("R12"));

        let whole = Regex::new(r"R\d+").unwrap();
        assert_eq!(extract("in R7 now", Some(&whole)).as_deref(), Some("R7"));
        assert_eq!(extract("nothing", Some(&whole)), None);
        assert_eq!(extract("  \n", None), None);
    }

    #[test]
    fn driver_value_may_contain_colons() {
        let s = spec("cmd:echo a:b");
        assert_eq!(s.name_and_value(), Some(("cmd", "echo a:b")));
    }

    #[tokio::test]
    async fn unset_driver_is_none() {
        let registry = DriverRegistry::with_builtins();
        let value = registry
            .evaluate("site", &DriverSpec::default())
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn unknown_driver_is_a_config_error() {
        let registry = DriverRegistry::with_builtins();
        let err = registry.evaluate("site", &spec("ldap:foo")).await.unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn cmd_driver_applies_regex() {
        let registry = DriverRegistry::with_builtins();
        let s = DriverSpec {
            regex: Some(r"dc=(\S+)".into()),
            ..spec("cmd:echo host dc=paris-dc1")
        };
        let value = registry.evaluate("site", &s).await.unwrap();
        assert_eq!(value.as_deref(), Some("paris-dc1"));
    }

    #[tokio::test]
    async fn file_driver_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rack");
        std::fs::write(&path, "R12\n").unwrap();

        let registry = DriverRegistry::with_builtins();
        let value = registry
            .evaluate("rack", &spec(&format!("file:{}", path.display())))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("R12"));
    }

    #[tokio::test]
    async fn registered_resolvers_are_used() {
        let mut registry = DriverRegistry::empty();
        registry.register("fixed", Arc::new(Fixed("Rear")));
        let drivers = PlacementDrivers {
            site: spec("fixed:"),
            face: spec("fixed:"),
            ..PlacementDrivers::default()
        };

        let intents = drivers.resolve(&registry).await.unwrap();
        assert_eq!(intents.site.as_deref(), Some("Rear"));
        assert_eq!(intents.face, Some(Face::Rear));
        assert!(intents.rack.is_none());
    }

    #[tokio::test]
    async fn bad_position_is_a_driver_error() {
        let mut registry = DriverRegistry::empty();
        registry.register("fixed", Arc::new(Fixed("0")));
        let drivers = PlacementDrivers {
            position: spec("fixed:"),
            ..PlacementDrivers::default()
        };
        let err = drivers.resolve(&registry).await.unwrap_err();
        assert!(matches!(err, CoreError::Driver { .. }));
    }

    #[tokio::test]
    async fn plugin_receives_value_and_regex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driver.sh");
        std::fs::write(&path, "#!/bin/sh\necho \"$1|$2\"\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let registry = DriverRegistry::with_builtins();
        let s = DriverSpec {
            driver: Some("custom:lookup".into()),
            driver_file: Some(path),
            regex: Some("x(.)".into()),
        };
        let value = registry.evaluate("tenant", &s).await.unwrap();
        assert_eq!(value.as_deref(), Some("lookup|x(.)"));
    }
}
