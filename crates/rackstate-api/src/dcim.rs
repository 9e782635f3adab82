// DCIM endpoints: sites, locations, racks, device metadata, devices, bays.

use tracing::debug;

use crate::client::NetboxClient;
use crate::error::Error;
use crate::types::{
    DeviceBayPatch, DeviceBayResponse, DeviceCreate, DevicePatch, DeviceResponse,
    DeviceRoleCreate, DeviceRoleResponse, DeviceTypeCreate, DeviceTypeHeightPatch,
    DeviceTypeResponse, LocationCreate, LocationResponse, ManufacturerCreate,
    ManufacturerResponse, PlatformCreate, PlatformResponse, RackCreate, RackLocationPatch,
    RackResponse, SiteCreate, SiteResponse,
};

const SITES: &str = "dcim/sites/";
const LOCATIONS: &str = "dcim/locations/";
const RACKS: &str = "dcim/racks/";
const DEVICE_ROLES: &str = "dcim/device-roles/";
const MANUFACTURERS: &str = "dcim/manufacturers/";
const DEVICE_TYPES: &str = "dcim/device-types/";
const PLATFORMS: &str = "dcim/platforms/";
const DEVICES: &str = "dcim/devices/";
const DEVICE_BAYS: &str = "dcim/device-bays/";

impl NetboxClient {
    // ── Sites ────────────────────────────────────────────────────────

    pub async fn get_site_by_slug(&self, slug: &str) -> Result<Option<SiteResponse>, Error> {
        self.get_one(SITES, &[("slug", slug.to_owned())]).await
    }

    pub async fn get_site(&self, id: u64) -> Result<Option<SiteResponse>, Error> {
        self.get_by_id(SITES, id).await
    }

    pub async fn create_site(&self, body: &SiteCreate<'_>) -> Result<SiteResponse, Error> {
        debug!(name = body.name, slug = body.slug, "creating site");
        self.create(SITES, body).await
    }

    pub async fn delete_site(&self, id: u64) -> Result<(), Error> {
        self.delete(SITES, id).await
    }

    // ── Locations ────────────────────────────────────────────────────

    pub async fn get_location_by_name(
        &self,
        name: &str,
        site_id: u64,
    ) -> Result<Option<LocationResponse>, Error> {
        self.get_one(
            LOCATIONS,
            &[("name", name.to_owned()), ("site_id", site_id.to_string())],
        )
        .await
    }

    pub async fn get_location(&self, id: u64) -> Result<Option<LocationResponse>, Error> {
        self.get_by_id(LOCATIONS, id).await
    }

    pub async fn create_location(
        &self,
        body: &LocationCreate<'_>,
    ) -> Result<LocationResponse, Error> {
        debug!(name = body.name, site = body.site, "creating location");
        self.create(LOCATIONS, body).await
    }

    pub async fn delete_location(&self, id: u64) -> Result<(), Error> {
        self.delete(LOCATIONS, id).await
    }

    // ── Racks ────────────────────────────────────────────────────────

    pub async fn get_rack_by_name(
        &self,
        name: &str,
        site_id: u64,
    ) -> Result<Option<RackResponse>, Error> {
        self.get_one(
            RACKS,
            &[("name", name.to_owned()), ("site_id", site_id.to_string())],
        )
        .await
    }

    pub async fn get_rack(&self, id: u64) -> Result<Option<RackResponse>, Error> {
        self.get_by_id(RACKS, id).await
    }

    pub async fn create_rack(&self, body: &RackCreate<'_>) -> Result<RackResponse, Error> {
        debug!(name = body.name, site = body.site, "creating rack");
        self.create(RACKS, body).await
    }

    pub async fn update_rack_location(
        &self,
        id: u64,
        location: Option<u64>,
    ) -> Result<RackResponse, Error> {
        self.patch(RACKS, id, &RackLocationPatch { location }).await
    }

    pub async fn delete_rack(&self, id: u64) -> Result<(), Error> {
        self.delete(RACKS, id).await
    }

    // ── Device roles / manufacturers / types / platforms ─────────────

    pub async fn get_device_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<DeviceRoleResponse>, Error> {
        self.get_one(DEVICE_ROLES, &[("name", name.to_owned())])
            .await
    }

    pub async fn create_device_role(
        &self,
        body: &DeviceRoleCreate<'_>,
    ) -> Result<DeviceRoleResponse, Error> {
        self.create(DEVICE_ROLES, body).await
    }

    pub async fn get_manufacturer_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ManufacturerResponse>, Error> {
        self.get_one(MANUFACTURERS, &[("name", name.to_owned())])
            .await
    }

    pub async fn create_manufacturer(
        &self,
        body: &ManufacturerCreate<'_>,
    ) -> Result<ManufacturerResponse, Error> {
        self.create(MANUFACTURERS, body).await
    }

    pub async fn get_device_type_by_model(
        &self,
        model: &str,
    ) -> Result<Option<DeviceTypeResponse>, Error> {
        self.get_one(DEVICE_TYPES, &[("model", model.to_owned())])
            .await
    }

    pub async fn get_device_type(&self, id: u64) -> Result<Option<DeviceTypeResponse>, Error> {
        self.get_by_id(DEVICE_TYPES, id).await
    }

    pub async fn create_device_type(
        &self,
        body: &DeviceTypeCreate<'_>,
    ) -> Result<DeviceTypeResponse, Error> {
        self.create(DEVICE_TYPES, body).await
    }

    pub async fn update_device_type_height(
        &self,
        id: u64,
        u_height: u32,
    ) -> Result<DeviceTypeResponse, Error> {
        self.patch(DEVICE_TYPES, id, &DeviceTypeHeightPatch { u_height })
            .await
    }

    pub async fn get_platform_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlatformResponse>, Error> {
        self.get_one(PLATFORMS, &[("name", name.to_owned())]).await
    }

    pub async fn create_platform(
        &self,
        body: &PlatformCreate<'_>,
    ) -> Result<PlatformResponse, Error> {
        self.create(PLATFORMS, body).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn get_device_by_serial(
        &self,
        serial: &str,
    ) -> Result<Option<DeviceResponse>, Error> {
        self.get_one(DEVICES, &[("serial", serial.to_owned())])
            .await
    }

    pub async fn get_device_by_name(&self, name: &str) -> Result<Option<DeviceResponse>, Error> {
        self.get_one(DEVICES, &[("name", name.to_owned())]).await
    }

    pub async fn get_device(&self, id: u64) -> Result<Option<DeviceResponse>, Error> {
        self.get_by_id(DEVICES, id).await
    }

    pub async fn create_device(&self, body: &DeviceCreate) -> Result<DeviceResponse, Error> {
        debug!(name = %body.name, serial = %body.serial, "creating device");
        self.create(DEVICES, body).await
    }

    pub async fn update_device(
        &self,
        id: u64,
        patch: &DevicePatch,
    ) -> Result<DeviceResponse, Error> {
        self.patch(DEVICES, id, patch).await
    }

    pub async fn delete_device(&self, id: u64) -> Result<(), Error> {
        self.delete(DEVICES, id).await
    }

    // ── Device bays ──────────────────────────────────────────────────

    /// `GET dcim/device-bays/?device_id=..&name=..`: every matching bay.
    pub async fn filter_device_bays(
        &self,
        device_id: u64,
        name: &str,
    ) -> Result<Vec<DeviceBayResponse>, Error> {
        self.list_all(
            DEVICE_BAYS,
            &[("device_id", device_id.to_string()), ("name", name.to_owned())],
        )
        .await
    }

    pub async fn set_device_bay_installed(
        &self,
        id: u64,
        installed_device: Option<u64>,
    ) -> Result<DeviceBayResponse, Error> {
        self.patch(DEVICE_BAYS, id, &DeviceBayPatch { installed_device })
            .await
    }
}
