//! CLI configuration: thin wrapper around `rackstate_config` that applies
//! `GlobalOpts` overrides (--config, --url, --token, ...).

use rackstate_config::{Config, ConnectionOverrides, config_path, load_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the configuration file named by `--config`, or the default one.
///
/// An explicit path must exist; the default path may be absent.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = match &global.config {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::NoConfig {
                    path: path.display().to_string(),
                });
            }
            path.clone()
        }
        None => config_path(),
    };
    tracing::debug!(path = %path.display(), "loading configuration");
    Ok(load_config(&path)?)
}

pub fn overrides(global: &GlobalOpts) -> ConnectionOverrides {
    ConnectionOverrides {
        url: global.url.clone(),
        token: global.token.clone(),
        insecure: global.insecure,
        timeout: global.timeout,
    }
}
