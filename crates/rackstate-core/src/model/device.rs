// ── Device domain types ──

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::catalog::Tag;
use super::object_id::ObjectId;

/// Rack face a device is mounted on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Face {
    Front,
    Rear,
}

/// Kind of inventory record, used in reports and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Site,
    Location,
    Rack,
    DeviceRole,
    Manufacturer,
    DeviceType,
    Platform,
    Tag,
    Device,
    DeviceBay,
}

/// The bay a child device is installed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BayRef {
    pub id: ObjectId,
    pub name: String,
    /// The chassis device owning the bay.
    pub chassis: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: ObjectId,
    pub name: Option<String>,
    pub serial: String,
    pub device_type: ObjectId,
    pub role: ObjectId,
    pub platform: Option<ObjectId>,
    pub site: ObjectId,
    pub tenant: Option<ObjectId>,
    pub rack: Option<ObjectId>,
    pub location: Option<ObjectId>,
    pub position: Option<u32>,
    pub face: Option<Face>,
    pub tags: Vec<Tag>,
    /// Non-null custom field values only.
    pub custom_fields: BTreeMap<String, String>,
    /// Set when the device sits in a chassis bay.
    pub bay: Option<BayRef>,
}

impl Device {
    /// Name for log lines: the hostname, or the serial for unnamed records.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.serial)
    }

    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A slot on a chassis that can hold one child device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBay {
    pub id: ObjectId,
    pub name: String,
    pub device: ObjectId,
    pub installed_device: Option<ObjectId>,
}

/// Creation request for a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub name: String,
    pub serial: String,
    pub device_type: ObjectId,
    pub role: ObjectId,
    pub site: ObjectId,
    pub platform: Option<ObjectId>,
    pub tenant: Option<ObjectId>,
    pub rack: Option<ObjectId>,
    pub location: Option<ObjectId>,
    pub position: Option<u32>,
    pub face: Option<Face>,
    pub tags: Vec<ObjectId>,
    pub custom_fields: BTreeMap<String, String>,
}

/// Field assignments for one batched device update.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it. Custom
/// field values of `None` remove the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceChanges {
    pub name: Option<String>,
    pub serial: Option<String>,
    pub device_type: Option<ObjectId>,
    pub role: Option<ObjectId>,
    pub platform: Option<Option<ObjectId>>,
    pub site: Option<ObjectId>,
    pub tenant: Option<Option<ObjectId>>,
    pub rack: Option<Option<ObjectId>>,
    pub location: Option<Option<ObjectId>>,
    pub position: Option<Option<u32>>,
    pub face: Option<Option<Face>>,
    pub tags: Option<Vec<ObjectId>>,
    pub custom_fields: Option<BTreeMap<String, Option<String>>>,
}

impl DeviceChanges {
    /// `true` when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the fields this update touches, in NetBox spelling.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let flags = [
            ("name", self.name.is_some()),
            ("serial", self.serial.is_some()),
            ("device_type", self.device_type.is_some()),
            ("role", self.role.is_some()),
            ("platform", self.platform.is_some()),
            ("site", self.site.is_some()),
            ("tenant", self.tenant.is_some()),
            ("rack", self.rack.is_some()),
            ("location", self.location.is_some()),
            ("position", self.position.is_some()),
            ("face", self.face.is_some()),
            ("tags", self.tags.is_some()),
            ("custom_fields", self.custom_fields.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(field, set)| set.then_some(field))
            .collect()
    }
}
