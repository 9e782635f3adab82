// ── Drift detection ──
//
// Pure comparison of a device record against what the facts and the
// configuration say it should be. The result is one `DeviceChanges` that
// the caller writes in a single update, or nothing at all.

use std::collections::BTreeMap;

use super::labels::{custom_field_update, tag_update};
use crate::model::{Device, DeviceChanges, Face, ObjectId, Tag};

/// Site, rack and location a device should be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub site: ObjectId,
    pub rack: Option<ObjectId>,
    pub location: Option<ObjectId>,
}

/// Fields only managed in update-all mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullSync {
    pub serial: String,
    pub device_type: ObjectId,
    pub role: ObjectId,
    pub tenant: Option<ObjectId>,
    pub position: Option<u32>,
    pub face: Option<Face>,
}

/// Desired state of the primary device.
#[derive(Debug, Clone)]
pub struct Expected<'a> {
    pub name: &'a str,
    pub tags: &'a [Tag],
    pub preserve_tags: bool,
    pub custom_fields: &'a BTreeMap<String, String>,
    /// `None` when the platform could not be detected; the remote value is
    /// then left alone.
    pub platform: Option<ObjectId>,
    /// Set when topology sync is enabled.
    pub topology: Option<Topology>,
    /// Set in update-all mode.
    pub full: Option<FullSync>,
}

/// Compute the update that brings `current` to `expected`.
pub fn diff_device(current: &Device, expected: &Expected<'_>) -> DeviceChanges {
    let mut changes = DeviceChanges::default();

    if current.name.as_deref() != Some(expected.name) {
        changes.name = Some(expected.name.to_owned());
    }

    changes.tags = tag_update(&current.tags, expected.tags, expected.preserve_tags);
    changes.custom_fields = custom_field_update(&current.custom_fields, expected.custom_fields);

    if let Some(topology) = expected.topology {
        diff_topology(current, topology, &mut changes);
    }

    if let Some(platform) = expected.platform {
        if current.platform != Some(platform) {
            changes.platform = Some(Some(platform));
        }
    }

    if let Some(full) = &expected.full {
        diff_full(current, full, &mut changes);
    }

    changes
}

/// Rack, location and site links. Losing the rack also clears the
/// rack-relative position and face.
pub fn diff_topology(current: &Device, target: Topology, changes: &mut DeviceChanges) {
    if current.site != target.site {
        changes.site = Some(target.site);
    }

    if current.rack != target.rack {
        changes.rack = Some(target.rack);
    }
    if target.rack.is_none() {
        if current.position.is_some() {
            changes.position = Some(None);
        }
        if current.face.is_some() {
            changes.face = Some(None);
        }
    }

    if current.location != target.location {
        changes.location = Some(target.location);
    }
}

fn diff_full(current: &Device, full: &FullSync, changes: &mut DeviceChanges) {
    if current.serial != full.serial {
        changes.serial = Some(full.serial.clone());
    }
    if current.device_type != full.device_type {
        changes.device_type = Some(full.device_type);
    }
    if current.role != full.role {
        changes.role = Some(full.role);
    }
    if current.tenant != full.tenant {
        changes.tenant = Some(full.tenant);
    }
    // Topology may already have cleared these along with the rack.
    if changes.position.is_none() && current.position != full.position {
        changes.position = Some(full.position);
    }
    if changes.face.is_none() && current.face != full.face {
        changes.face = Some(full.face);
    }
}

/// Expansion shadow devices follow their primary: same name plus suffix,
/// same tenant, site, rack and location.
pub fn diff_expansion(shadow: &Device, expected_name: &str, primary: &Device) -> DeviceChanges {
    let mut changes = DeviceChanges::default();

    if shadow.name.as_deref() != Some(expected_name) {
        changes.name = Some(expected_name.to_owned());
    }
    if shadow.tenant != primary.tenant {
        changes.tenant = Some(primary.tenant);
    }
    if shadow.site != primary.site {
        changes.site = Some(primary.site);
    }
    if shadow.rack != primary.rack {
        changes.rack = Some(primary.rack);
    }
    if shadow.location != primary.location {
        changes.location = Some(primary.location);
    }

    changes
}
