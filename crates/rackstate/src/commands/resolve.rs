//! `rackstate resolve`: print what every placement driver evaluates to.

use rackstate_core::DriverRegistry;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let registry = DriverRegistry::with_builtins();

    for (intent, value) in cfg.placement_drivers().raw_values(&registry).await? {
        println!("{intent:<9} {}", value.as_deref().unwrap_or("<unset>"));
    }
    Ok(())
}
