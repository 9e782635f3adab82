// ── Chassis bay assignment ──
//
// Keeps a child device installed in the bay the facts name. A bay is
// always emptied before its device is installed elsewhere, so no device is
// ever referenced by two bays.

use tracing::{debug, error};

use super::report::ReconcileReport;
use crate::error::CoreError;
use crate::model::{Device, EntityKind, ObjectId};
use crate::store::RemoteStore;

/// Outcome of a bay assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Already installed in the expected bay.
    Unchanged,
    /// Moved (or first installed) into the expected bay.
    Assigned,
    /// The expected bay does not exist on the chassis.
    Missing,
    /// More than one bay on the chassis carries the name.
    Ambiguous,
}

/// Install `device` in the bay named `slot` on `chassis`.
pub async fn assign<S: RemoteStore>(
    store: &S,
    device: &Device,
    chassis: &Device,
    slot: &str,
    report: &mut ReconcileReport,
) -> Result<SlotOutcome, CoreError> {
    if let Some(current) = &device.bay {
        if current.name == slot && same_chassis(store, current.chassis, chassis).await? {
            debug!(device = device.display_name(), slot, "bay already correct");
            return Ok(SlotOutcome::Unchanged);
        }
    }

    let mut bays = store.device_bays(chassis.id, slot).await?;
    if bays.len() > 1 {
        error!(
            device = device.display_name(),
            chassis = %chassis.serial,
            slot,
            matches = bays.len(),
            "bay name is not unique on chassis"
        );
        report.skipped(
            EntityKind::DeviceBay,
            slot,
            format!("{} bays match {slot:?} on chassis {}", bays.len(), chassis.serial),
        );
        return Ok(SlotOutcome::Ambiguous);
    }
    let Some(target) = bays.pop() else {
        error!(
            device = device.display_name(),
            chassis = %chassis.serial,
            slot,
            "could not find bay on chassis"
        );
        report.skipped(
            EntityKind::DeviceBay,
            slot,
            format!("no bay {slot:?} on chassis {}", chassis.serial),
        );
        return Ok(SlotOutcome::Missing);
    };

    if let Some(current) = &device.bay {
        store.set_bay_installed_device(current.id, None).await?;
        report.updated(
            EntityKind::DeviceBay,
            current.name.clone(),
            vec!["installed_device"],
        );
    }

    store
        .set_bay_installed_device(target.id, Some(device.id))
        .await?;
    report.updated(EntityKind::DeviceBay, target.name, vec!["installed_device"]);
    Ok(SlotOutcome::Assigned)
}

/// Whether the chassis holding a bay is the expected one, judged by serial.
async fn same_chassis<S: RemoteStore>(
    store: &S,
    holder: ObjectId,
    expected: &Device,
) -> Result<bool, CoreError> {
    if holder == expected.id {
        return Ok(true);
    }
    Ok(store
        .device(holder)
        .await?
        .is_some_and(|d| d.serial == expected.serial))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::NewDevice;
    use crate::store::MemoryStore;

    fn unit(site: ObjectId, serial: &str) -> NewDevice {
        NewDevice {
            name: serial.to_lowercase(),
            serial: serial.into(),
            device_type: ObjectId::new(1),
            role: ObjectId::new(1),
            site,
            platform: None,
            tenant: None,
            rack: None,
            location: None,
            position: None,
            face: None,
            tags: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    struct Fixture {
        store: MemoryStore,
        chassis: Device,
        blade: Device,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let chassis = store.seed_device(&unit(site.id, "CHS001")).unwrap();
        let blade = store.seed_device(&unit(site.id, "BLD001")).unwrap();
        Fixture {
            store,
            chassis,
            blade,
        }
    }

    #[tokio::test]
    async fn first_assignment_sets_the_bay() {
        let f = fixture();
        f.store.seed_device_bay(f.chassis.id, "Slot 1");

        let mut report = ReconcileReport::default();
        let outcome = assign(&f.store, &f.blade, &f.chassis, "Slot 1", &mut report)
            .await
            .unwrap();

        assert_eq!(outcome, SlotOutcome::Assigned);
        assert_eq!(report.write_count(), 1);
        let bay = f.store.device(f.blade.id).await.unwrap().unwrap().bay.unwrap();
        assert_eq!(bay.name, "Slot 1");
    }

    #[tokio::test]
    async fn move_clears_the_old_bay_first() {
        let f = fixture();
        let old = f.store.seed_device_bay(f.chassis.id, "Slot 1");
        f.store.seed_device_bay(f.chassis.id, "Slot 2");
        f.store.seed_installation(old.id, f.blade.id).unwrap();
        let blade = f.store.device(f.blade.id).await.unwrap().unwrap();

        let mut report = ReconcileReport::default();
        let outcome = assign(&f.store, &blade, &f.chassis, "Slot 2", &mut report)
            .await
            .unwrap();

        assert_eq!(outcome, SlotOutcome::Assigned);
        assert_eq!(report.write_count(), 2);
        let holders: Vec<_> = f
            .store
            .bays()
            .into_iter()
            .filter(|b| b.installed_device == Some(f.blade.id))
            .collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].name, "Slot 2");
    }

    #[tokio::test]
    async fn missing_bay_is_skipped() {
        let f = fixture();
        let mut report = ReconcileReport::default();
        let outcome = assign(&f.store, &f.blade, &f.chassis, "Slot 5", &mut report)
            .await
            .unwrap();

        assert_eq!(outcome, SlotOutcome::Missing);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(f.store.write_count(), 0);
    }

    #[tokio::test]
    async fn ambiguous_bay_name_is_skipped() {
        let f = fixture();
        f.store.seed_device_bay(f.chassis.id, "Slot 1");
        f.store.seed_device_bay(f.chassis.id, "Slot 1");

        let mut report = ReconcileReport::default();
        let outcome = assign(&f.store, &f.blade, &f.chassis, "Slot 1", &mut report)
            .await
            .unwrap();

        assert_eq!(outcome, SlotOutcome::Ambiguous);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(f.store.write_count(), 0);
        assert!(f.store.device(f.blade.id).await.unwrap().unwrap().bay.is_none());
    }
}
