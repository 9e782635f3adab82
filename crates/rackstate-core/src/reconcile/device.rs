// ── Device identification ──
//
// Serial is the identity of a device record. Helpers here find records by
// serial, create them when missing, and remove records that no longer
// match the hardware.

use tracing::{info, warn};

use super::drift::{Topology, diff_expansion};
use super::report::ReconcileReport;
use super::topology::{PreviousParents, cleanup};
use crate::error::CoreError;
use crate::model::{Device, EntityKind, NewDevice};
use crate::store::RemoteStore;

/// Delete the device holding `hostname` when its serial is not `serial`:
/// the hardware behind that name was swapped. Parents it leaves empty are
/// removed unless `target` is about to use them.
pub async fn purge_stale<S: RemoteStore>(
    store: &S,
    hostname: &str,
    serial: &str,
    target: &Topology,
    report: &mut ReconcileReport,
) -> Result<(), CoreError> {
    let Some(stale) = store.device_by_name(hostname).await? else {
        return Ok(());
    };
    if stale.serial == serial {
        return Ok(());
    }

    info!(
        hostname,
        stale_serial = %stale.serial,
        serial,
        "purging device left behind by replaced hardware"
    );
    store.delete_device(stale.id).await?;
    report.deleted(EntityKind::Device, stale.display_name().to_owned());
    cleanup(store, PreviousParents::outside(&stale, target), report).await
}

/// The device with `new.serial`, created from `new` when it does not exist.
/// The flag is `true` when the record was created.
pub async fn find_or_create<S: RemoteStore>(
    store: &S,
    new: &NewDevice,
    report: &mut ReconcileReport,
) -> Result<(Device, bool), CoreError> {
    if let Some(device) = store.device_by_serial(&new.serial).await? {
        return Ok((device, false));
    }
    let device = store.create_device(new).await?;
    report.created(EntityKind::Device, device.display_name().to_owned());
    Ok((device, true))
}

/// Bring an expansion shadow in line with its primary, cleaning up the
/// parents it leaves.
pub async fn follow_primary<S: RemoteStore>(
    store: &S,
    shadow: &Device,
    expected_name: &str,
    primary: &Device,
    report: &mut ReconcileReport,
) -> Result<Device, CoreError> {
    let changes = diff_expansion(shadow, expected_name, primary);
    if changes.is_empty() {
        return Ok(shadow.clone());
    }

    let previous = PreviousParents::left_by(shadow, &changes);
    let updated = store.update_device(shadow.id, &changes).await?;
    report.updated(
        EntityKind::Device,
        updated.display_name().to_owned(),
        changes.changed_fields(),
    );
    cleanup(store, previous, report).await?;
    Ok(updated)
}

/// Delete the expansion shadow with `serial`, if one exists.
pub async fn remove_shadow<S: RemoteStore>(
    store: &S,
    serial: &str,
    primary: &Device,
    report: &mut ReconcileReport,
) -> Result<bool, CoreError> {
    let Some(shadow) = store.device_by_serial(serial).await? else {
        return Ok(false);
    };

    warn!(serial, "removing expansion device no longer owned");
    store.delete_device(shadow.id).await?;
    report.deleted(EntityKind::Device, shadow.display_name().to_owned());

    // Parents the primary still uses stay put.
    let kept = Topology {
        site: primary.site,
        rack: primary.rack,
        location: primary.location,
    };
    cleanup(store, PreviousParents::outside(&shadow, &kept), report).await?;
    Ok(true)
}
