// ── Remote inventory seam ──
//
// Every read and write the reconciler performs goes through `RemoteStore`.
// Lookups return `Ok(None)` when nothing matches; a missing record is never
// an error at this layer.

mod memory;
mod netbox;
mod table;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use netbox::NetboxStore;

use crate::error::CoreError;
use crate::model::{
    Device, DeviceBay, DeviceChanges, DeviceRole, DeviceType, Location, Manufacturer, NewDevice,
    NewDeviceType, ObjectId, Platform, Rack, Site, Tag, Tenant,
};

/// Handle to the remote asset inventory.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    // ── Sites ────────────────────────────────────────────────────────

    async fn site_by_slug(&self, slug: &str) -> Result<Option<Site>, CoreError>;

    async fn site(&self, id: ObjectId) -> Result<Option<Site>, CoreError>;

    /// Create an active site.
    async fn create_site(&self, name: &str, slug: &str) -> Result<Site, CoreError>;

    async fn delete_site(&self, id: ObjectId) -> Result<(), CoreError>;

    // ── Locations ────────────────────────────────────────────────────

    async fn location_by_name(
        &self,
        name: &str,
        site: ObjectId,
    ) -> Result<Option<Location>, CoreError>;

    async fn location(&self, id: ObjectId) -> Result<Option<Location>, CoreError>;

    async fn create_location(
        &self,
        name: &str,
        slug: &str,
        site: ObjectId,
    ) -> Result<Location, CoreError>;

    async fn delete_location(&self, id: ObjectId) -> Result<(), CoreError>;

    // ── Racks ────────────────────────────────────────────────────────

    async fn rack_by_name(&self, name: &str, site: ObjectId) -> Result<Option<Rack>, CoreError>;

    async fn rack(&self, id: ObjectId) -> Result<Option<Rack>, CoreError>;

    async fn create_rack(
        &self,
        name: &str,
        site: ObjectId,
        location: Option<ObjectId>,
    ) -> Result<Rack, CoreError>;

    async fn set_rack_location(
        &self,
        id: ObjectId,
        location: Option<ObjectId>,
    ) -> Result<Rack, CoreError>;

    async fn delete_rack(&self, id: ObjectId) -> Result<(), CoreError>;

    // ── Tenancy ──────────────────────────────────────────────────────

    async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError>;

    // ── Device metadata ──────────────────────────────────────────────

    async fn device_role_by_name(&self, name: &str) -> Result<Option<DeviceRole>, CoreError>;

    async fn create_device_role(
        &self,
        name: &str,
        slug: &str,
        color: &str,
    ) -> Result<DeviceRole, CoreError>;

    async fn manufacturer_by_name(&self, name: &str) -> Result<Option<Manufacturer>, CoreError>;

    async fn create_manufacturer(&self, name: &str, slug: &str)
    -> Result<Manufacturer, CoreError>;

    async fn device_type_by_model(&self, model: &str) -> Result<Option<DeviceType>, CoreError>;

    async fn device_type(&self, id: ObjectId) -> Result<Option<DeviceType>, CoreError>;

    async fn create_device_type(&self, new: &NewDeviceType) -> Result<DeviceType, CoreError>;

    async fn set_device_type_height(
        &self,
        id: ObjectId,
        u_height: u32,
    ) -> Result<DeviceType, CoreError>;

    async fn platform_by_name(&self, name: &str) -> Result<Option<Platform>, CoreError>;

    async fn create_platform(&self, name: &str, slug: &str) -> Result<Platform, CoreError>;

    async fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, CoreError>;

    async fn create_tag(&self, name: &str, slug: &str) -> Result<Tag, CoreError>;

    // ── Devices ──────────────────────────────────────────────────────

    async fn device_by_serial(&self, serial: &str) -> Result<Option<Device>, CoreError>;

    async fn device_by_name(&self, name: &str) -> Result<Option<Device>, CoreError>;

    async fn device(&self, id: ObjectId) -> Result<Option<Device>, CoreError>;

    async fn create_device(&self, new: &NewDevice) -> Result<Device, CoreError>;

    /// Apply every assignment in `changes` in one write.
    async fn update_device(
        &self,
        id: ObjectId,
        changes: &DeviceChanges,
    ) -> Result<Device, CoreError>;

    async fn delete_device(&self, id: ObjectId) -> Result<(), CoreError>;

    // ── Device bays ──────────────────────────────────────────────────

    /// Bays named `name` on the `chassis` device.
    async fn device_bays(&self, chassis: ObjectId, name: &str)
    -> Result<Vec<DeviceBay>, CoreError>;

    /// Install `device` into the bay, or empty it with `None`.
    async fn set_bay_installed_device(
        &self,
        bay: ObjectId,
        device: Option<ObjectId>,
    ) -> Result<DeviceBay, CoreError>;
}
