// NetBox REST payloads.
//
// Read-side records mirror the JSON NetBox returns (nested references are
// `{id, name, slug, ...}` objects). Write-side bodies use bare integer IDs,
// which is what the NetBox writable serializers expect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Envelope ─────────────────────────────────────────────────────────

/// Paginated list envelope: `{count, next, previous, results}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// `{value, label}` choice field (status, face).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Brief nested representation of any object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NestedRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Nested device type (`model` instead of `name`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NestedDeviceType {
    pub id: u64,
    pub model: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// `parent_device` on a child device: the chassis plus the bay it sits in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParentDevice {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_bay: Option<NestedRef>,
}

// ── Organisation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SiteResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub status: Option<Choice>,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub rack_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteCreate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub status: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub site: NestedRef,
    #[serde(default)]
    pub rack_count: u32,
    #[serde(default)]
    pub device_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationCreate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub site: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RackResponse {
    pub id: u64,
    pub name: String,
    pub site: NestedRef,
    #[serde(default)]
    pub location: Option<NestedRef>,
    #[serde(default)]
    pub device_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RackCreate<'a> {
    pub name: &'a str,
    pub site: u64,
    pub location: Option<u64>,
}

/// Rack location reassignment. `None` serializes as `null` (detach).
#[derive(Debug, Clone, Serialize)]
pub struct RackLocationPatch {
    pub location: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

// ── Device metadata ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRoleResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceRoleCreate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub color: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManufacturerResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerCreate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTypeResponse {
    pub id: u64,
    pub model: String,
    pub slug: String,
    #[serde(default)]
    pub u_height: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceTypeCreate<'a> {
    pub manufacturer: u64,
    pub model: &'a str,
    pub slug: &'a str,
    pub part_number: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceTypeHeightPatch {
    pub u_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformCreate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagResponse {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCreate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceResponse {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub serial: String,
    pub device_type: NestedDeviceType,
    /// `role` on NetBox >= 3.6, `device_role` before that.
    #[serde(alias = "device_role")]
    pub role: NestedRef,
    #[serde(default)]
    pub platform: Option<NestedRef>,
    pub site: NestedRef,
    #[serde(default)]
    pub tenant: Option<NestedRef>,
    #[serde(default)]
    pub rack: Option<NestedRef>,
    #[serde(default)]
    pub location: Option<NestedRef>,
    #[serde(default)]
    pub position: Option<serde_json::Number>,
    #[serde(default)]
    pub face: Option<Choice>,
    #[serde(default)]
    pub parent_device: Option<ParentDevice>,
    #[serde(default)]
    pub tags: Vec<TagResponse>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// Body for `POST /api/dcim/devices/`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceCreate {
    pub name: String,
    pub serial: String,
    pub device_type: u64,
    pub role: u64,
    pub site: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    pub tags: Vec<u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, String>,
}

/// Body for `PATCH /api/dcim/devices/{id}/`.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DevicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceBayResponse {
    pub id: u64,
    pub name: String,
    pub device: NestedRef,
    #[serde(default)]
    pub installed_device: Option<NestedRef>,
}

/// `installed_device` is always serialized so `None` clears the bay.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceBayPatch {
    pub installed_device: Option<u64>,
}
