// ── Domain model ──
//
// Canonical, store-agnostic representations of the inventory objects the
// reconciler reads and writes. `convert` maps NetBox payloads into these.

pub mod catalog;
pub mod device;
pub mod object_id;
pub mod organisation;

// ── Re-exports ──────────────────────────────────────────────────────

pub use object_id::ObjectId;

pub use organisation::{Location, Rack, Site, Tenant};

pub use catalog::{DeviceRole, DeviceType, Manufacturer, NewDeviceType, Platform, Tag};

pub use device::{BayRef, Device, DeviceBay, DeviceChanges, EntityKind, Face, NewDevice};
