//! `rackstate sync`: one reconciliation pass for this machine.

use tracing::{info, warn};

use rackstate_core::{DriverRegistry, NetboxStore, ReconcileConfig, Reconciler, StaticFacts};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config;
use crate::error::CliError;

pub async fn handle(args: &SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    for flag in cfg.unsupported_flags() {
        warn!(flag, "network, inventory and PSU sync are not performed; ignoring");
    }

    let mut reconcile = cfg.reconcile_config()?;
    apply_flags(args, &mut reconcile);
    let store_config = cfg.store_config(&config::overrides(global))?;

    let registry = DriverRegistry::with_builtins();
    let intents = cfg.placement_drivers().resolve(&registry).await?;

    let mut facts = StaticFacts::load(&args.facts).await?;
    facts.resolve_hostname(cfg.hostname_cmd.as_deref()).await?;
    facts.resolve_platform(cfg.device.platform.as_deref()).await;
    facts.fill_placement(intents.position, intents.face);
    info!(serial = %facts.serial, hostname = %facts.hostname, "facts loaded");

    let store = NetboxStore::connect(&store_config)?;
    let report = Reconciler::new(&store, &reconcile)
        .reconcile(&facts, &intents)
        .await?;

    println!("{} ({}): {report}", facts.hostname, facts.serial);
    Ok(())
}

/// Command-line switches only ever turn behaviour on.
fn apply_flags(args: &SyncArgs, config: &mut ReconcileConfig) {
    config.update_all |= args.update_all;
    config.update_location |= args.update_location;
    config.purge_old_devices |= args.purge_old_devices;
    config.preserve_tags |= args.preserve_tags;
    config.expansion_as_device |= args.expansion_as_device;
}
