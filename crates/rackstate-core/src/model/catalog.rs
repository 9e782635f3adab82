// ── Device metadata ──
//
// Roles, manufacturers, device types, platforms and tags. All of them are
// found by natural key and created on first use.

use serde::{Deserialize, Serialize};

use super::object_id::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRole {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceType {
    pub id: ObjectId,
    pub model: String,
    pub slug: String,
    /// Rack units. NetBox allows half units; those are rounded down.
    pub u_height: Option<u32>,
}

/// Creation request for a device type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceType {
    pub manufacturer: ObjectId,
    pub model: String,
    pub slug: String,
    pub part_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
}
