// ── Topology cleanup ──
//
// After a device has been detached from a rack, location or site, the old
// parent is re-fetched and deleted if nothing is left in it. Cleanup always
// runs after the device update, in rack → location → site order, so a rack
// is gone before its location's rack_count is checked.

use tracing::debug;

use super::drift::Topology;
use super::report::ReconcileReport;
use crate::error::CoreError;
use crate::model::{Device, DeviceChanges, EntityKind, ObjectId};
use crate::store::RemoteStore;

/// Parents a device is about to leave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviousParents {
    pub site: Option<ObjectId>,
    pub rack: Option<ObjectId>,
    pub location: Option<ObjectId>,
}

impl PreviousParents {
    /// Parents of `current` that `changes` moves the device away from.
    pub fn left_by(current: &Device, changes: &DeviceChanges) -> Self {
        Self {
            site: changes
                .site
                .filter(|site| *site != current.site)
                .map(|_| current.site),
            rack: changes
                .rack
                .filter(|rack| *rack != current.rack)
                .and(current.rack),
            location: changes
                .location
                .filter(|location| *location != current.location)
                .and(current.location),
        }
    }

    /// Parents of a deleted `device` that `kept` no longer points at.
    pub fn outside(device: &Device, kept: &Topology) -> Self {
        Self {
            site: (device.site != kept.site).then_some(device.site),
            rack: device.rack.filter(|rack| Some(*rack) != kept.rack),
            location: device
                .location
                .filter(|location| Some(*location) != kept.location),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.site.is_none() && self.rack.is_none() && self.location.is_none()
    }
}

/// Delete every previous parent that no longer has children.
pub async fn cleanup<S: RemoteStore>(
    store: &S,
    previous: PreviousParents,
    report: &mut ReconcileReport,
) -> Result<(), CoreError> {
    if let Some(rack) = previous.rack {
        cleanup_rack(store, rack, report).await?;
    }
    if let Some(location) = previous.location {
        cleanup_location(store, location, report).await?;
    }
    if let Some(site) = previous.site {
        cleanup_site(store, site, report).await?;
    }
    Ok(())
}

pub async fn cleanup_rack<S: RemoteStore>(
    store: &S,
    id: ObjectId,
    report: &mut ReconcileReport,
) -> Result<bool, CoreError> {
    let Some(rack) = store.rack(id).await? else {
        return Ok(false);
    };
    if !rack.is_empty() {
        debug!(rack = %rack.name, devices = rack.device_count, "rack still in use");
        return Ok(false);
    }
    store.delete_rack(rack.id).await?;
    report.deleted(EntityKind::Rack, rack.name);
    Ok(true)
}

pub async fn cleanup_location<S: RemoteStore>(
    store: &S,
    id: ObjectId,
    report: &mut ReconcileReport,
) -> Result<bool, CoreError> {
    let Some(location) = store.location(id).await? else {
        return Ok(false);
    };
    if !location.is_empty() {
        debug!(
            location = %location.name,
            racks = location.rack_count,
            devices = location.device_count,
            "location still in use"
        );
        return Ok(false);
    }
    store.delete_location(location.id).await?;
    report.deleted(EntityKind::Location, location.name);
    Ok(true)
}

pub async fn cleanup_site<S: RemoteStore>(
    store: &S,
    id: ObjectId,
    report: &mut ReconcileReport,
) -> Result<bool, CoreError> {
    let Some(site) = store.site(id).await? else {
        return Ok(false);
    };
    if !site.is_empty() {
        debug!(site = %site.slug, devices = site.device_count, "site still in use");
        return Ok(false);
    }
    store.delete_site(site.id).await?;
    report.deleted(EntityKind::Site, site.name);
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::NewDevice;
    use crate::store::MemoryStore;

    fn racked(site: ObjectId, rack: Option<ObjectId>, location: Option<ObjectId>) -> NewDevice {
        NewDevice {
            name: "web-01".into(),
            serial: "ABC123".into(),
            device_type: ObjectId::new(1),
            role: ObjectId::new(1),
            site,
            platform: None,
            tenant: None,
            rack,
            location,
            position: None,
            face: None,
            tags: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn previous_parents_only_lists_real_moves() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let rack = store.seed_rack("R1", site.id, None);
        let device = store
            .seed_device(&racked(site.id, Some(rack.id), None))
            .unwrap();

        let changes = DeviceChanges {
            rack: Some(None),
            site: Some(site.id),
            ..DeviceChanges::default()
        };
        let previous = PreviousParents::left_by(&device, &changes);
        assert_eq!(previous.rack, Some(rack.id));
        assert_eq!(previous.site, None);
        assert_eq!(previous.location, None);
    }

    #[tokio::test]
    async fn rack_goes_before_its_location() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let keep = store.seed_site("lyon", "lyon");
        let location = store.seed_location("room 1", "room-1", site.id);
        let rack = store.seed_rack("R1", site.id, Some(location.id));
        store.seed_device(&racked(keep.id, None, None)).unwrap();

        let mut report = ReconcileReport::default();
        cleanup(
            &store,
            PreviousParents {
                site: Some(site.id),
                rack: Some(rack.id),
                location: Some(location.id),
            },
            &mut report,
        )
        .await
        .unwrap();

        assert_eq!(report.deleted_count(), 3);
        assert!(store.racks().is_empty());
        assert!(store.locations().is_empty());
        assert_eq!(store.sites().len(), 1);
    }

    #[tokio::test]
    async fn occupied_parent_is_kept() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let rack = store.seed_rack("R1", site.id, None);
        store
            .seed_device(&racked(site.id, Some(rack.id), None))
            .unwrap();

        let mut report = ReconcileReport::default();
        assert!(!cleanup_rack(&store, rack.id, &mut report).await.unwrap());
        assert!(!cleanup_site(&store, site.id, &mut report).await.unwrap());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn vanished_parent_is_ignored() {
        let store = MemoryStore::new();
        let mut report = ReconcileReport::default();
        let gone = ObjectId::new(99);
        assert!(!cleanup_location(&store, gone, &mut report).await.unwrap());
    }
}
