// ── NetBox-backed store ──
//
// Thin adapter from `RemoteStore` onto `rackstate_api::NetboxClient`.
// Payload shaping lives in `convert`; this file only routes calls.

use async_trait::async_trait;
use rackstate_api::types::{
    DeviceCreate, DevicePatch, DeviceRoleCreate, DeviceTypeCreate, LocationCreate,
    ManufacturerCreate, PlatformCreate, RackCreate, SiteCreate, TagCreate,
};
use rackstate_api::{NetboxClient, TlsMode, TransportConfig};

use super::RemoteStore;
use crate::config::{StoreConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{
    Device, DeviceBay, DeviceChanges, DeviceRole, DeviceType, Location, Manufacturer, NewDevice,
    NewDeviceType, ObjectId, Platform, Rack, Site, Tag, Tenant,
};

/// `RemoteStore` over a live NetBox instance.
pub struct NetboxStore {
    client: NetboxClient,
}

impl NetboxStore {
    /// Build the HTTP client described by `config`.
    pub fn connect(config: &StoreConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };
        let client = NetboxClient::new(config.url.as_str(), &config.token, &transport)?;
        Ok(Self { client })
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[async_trait]
impl RemoteStore for NetboxStore {
    // ── Sites ────────────────────────────────────────────────────────

    async fn site_by_slug(&self, slug: &str) -> Result<Option<Site>, CoreError> {
        Ok(self.client.get_site_by_slug(slug).await?.map(Site::from))
    }

    async fn site(&self, id: ObjectId) -> Result<Option<Site>, CoreError> {
        Ok(self.client.get_site(id.get()).await?.map(Site::from))
    }

    async fn create_site(&self, name: &str, slug: &str) -> Result<Site, CoreError> {
        let body = SiteCreate {
            name,
            slug,
            status: "active",
        };
        Ok(self.client.create_site(&body).await?.into())
    }

    async fn delete_site(&self, id: ObjectId) -> Result<(), CoreError> {
        Ok(self.client.delete_site(id.get()).await?)
    }

    // ── Locations ────────────────────────────────────────────────────

    async fn location_by_name(
        &self,
        name: &str,
        site: ObjectId,
    ) -> Result<Option<Location>, CoreError> {
        Ok(self
            .client
            .get_location_by_name(name, site.get())
            .await?
            .map(Location::from))
    }

    async fn location(&self, id: ObjectId) -> Result<Option<Location>, CoreError> {
        Ok(self.client.get_location(id.get()).await?.map(Location::from))
    }

    async fn create_location(
        &self,
        name: &str,
        slug: &str,
        site: ObjectId,
    ) -> Result<Location, CoreError> {
        let body = LocationCreate {
            name,
            slug,
            site: site.get(),
        };
        Ok(self.client.create_location(&body).await?.into())
    }

    async fn delete_location(&self, id: ObjectId) -> Result<(), CoreError> {
        Ok(self.client.delete_location(id.get()).await?)
    }

    // ── Racks ────────────────────────────────────────────────────────

    async fn rack_by_name(&self, name: &str, site: ObjectId) -> Result<Option<Rack>, CoreError> {
        Ok(self
            .client
            .get_rack_by_name(name, site.get())
            .await?
            .map(Rack::from))
    }

    async fn rack(&self, id: ObjectId) -> Result<Option<Rack>, CoreError> {
        Ok(self.client.get_rack(id.get()).await?.map(Rack::from))
    }

    async fn create_rack(
        &self,
        name: &str,
        site: ObjectId,
        location: Option<ObjectId>,
    ) -> Result<Rack, CoreError> {
        let body = RackCreate {
            name,
            site: site.get(),
            location: location.map(ObjectId::get),
        };
        Ok(self.client.create_rack(&body).await?.into())
    }

    async fn set_rack_location(
        &self,
        id: ObjectId,
        location: Option<ObjectId>,
    ) -> Result<Rack, CoreError> {
        Ok(self
            .client
            .update_rack_location(id.get(), location.map(ObjectId::get))
            .await?
            .into())
    }

    async fn delete_rack(&self, id: ObjectId) -> Result<(), CoreError> {
        Ok(self.client.delete_rack(id.get()).await?)
    }

    // ── Tenancy ──────────────────────────────────────────────────────

    async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError> {
        Ok(self.client.get_tenant_by_slug(slug).await?.map(Tenant::from))
    }

    // ── Device metadata ──────────────────────────────────────────────

    async fn device_role_by_name(&self, name: &str) -> Result<Option<DeviceRole>, CoreError> {
        Ok(self
            .client
            .get_device_role_by_name(name)
            .await?
            .map(DeviceRole::from))
    }

    async fn create_device_role(
        &self,
        name: &str,
        slug: &str,
        color: &str,
    ) -> Result<DeviceRole, CoreError> {
        let body = DeviceRoleCreate { name, slug, color };
        Ok(self.client.create_device_role(&body).await?.into())
    }

    async fn manufacturer_by_name(&self, name: &str) -> Result<Option<Manufacturer>, CoreError> {
        Ok(self
            .client
            .get_manufacturer_by_name(name)
            .await?
            .map(Manufacturer::from))
    }

    async fn create_manufacturer(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<Manufacturer, CoreError> {
        let body = ManufacturerCreate { name, slug };
        Ok(self.client.create_manufacturer(&body).await?.into())
    }

    async fn device_type_by_model(&self, model: &str) -> Result<Option<DeviceType>, CoreError> {
        Ok(self
            .client
            .get_device_type_by_model(model)
            .await?
            .map(DeviceType::from))
    }

    async fn device_type(&self, id: ObjectId) -> Result<Option<DeviceType>, CoreError> {
        Ok(self
            .client
            .get_device_type(id.get())
            .await?
            .map(DeviceType::from))
    }

    async fn create_device_type(&self, new: &NewDeviceType) -> Result<DeviceType, CoreError> {
        let body = DeviceTypeCreate {
            manufacturer: new.manufacturer.get(),
            model: &new.model,
            slug: &new.slug,
            part_number: &new.part_number,
        };
        Ok(self.client.create_device_type(&body).await?.into())
    }

    async fn set_device_type_height(
        &self,
        id: ObjectId,
        u_height: u32,
    ) -> Result<DeviceType, CoreError> {
        Ok(self
            .client
            .update_device_type_height(id.get(), u_height)
            .await?
            .into())
    }

    async fn platform_by_name(&self, name: &str) -> Result<Option<Platform>, CoreError> {
        Ok(self
            .client
            .get_platform_by_name(name)
            .await?
            .map(Platform::from))
    }

    async fn create_platform(&self, name: &str, slug: &str) -> Result<Platform, CoreError> {
        let body = PlatformCreate { name, slug };
        Ok(self.client.create_platform(&body).await?.into())
    }

    async fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, CoreError> {
        Ok(self.client.get_tag_by_name(name).await?.map(Tag::from))
    }

    async fn create_tag(&self, name: &str, slug: &str) -> Result<Tag, CoreError> {
        let body = TagCreate { name, slug };
        Ok(self.client.create_tag(&body).await?.into())
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn device_by_serial(&self, serial: &str) -> Result<Option<Device>, CoreError> {
        Ok(self
            .client
            .get_device_by_serial(serial)
            .await?
            .map(Device::from))
    }

    async fn device_by_name(&self, name: &str) -> Result<Option<Device>, CoreError> {
        Ok(self.client.get_device_by_name(name).await?.map(Device::from))
    }

    async fn device(&self, id: ObjectId) -> Result<Option<Device>, CoreError> {
        Ok(self.client.get_device(id.get()).await?.map(Device::from))
    }

    async fn create_device(&self, new: &NewDevice) -> Result<Device, CoreError> {
        let body = DeviceCreate::from(new);
        Ok(self.client.create_device(&body).await?.into())
    }

    async fn update_device(
        &self,
        id: ObjectId,
        changes: &DeviceChanges,
    ) -> Result<Device, CoreError> {
        let patch = DevicePatch::from(changes);
        Ok(self.client.update_device(id.get(), &patch).await?.into())
    }

    async fn delete_device(&self, id: ObjectId) -> Result<(), CoreError> {
        Ok(self.client.delete_device(id.get()).await?)
    }

    // ── Device bays ──────────────────────────────────────────────────

    async fn device_bays(
        &self,
        chassis: ObjectId,
        name: &str,
    ) -> Result<Vec<DeviceBay>, CoreError> {
        Ok(self
            .client
            .filter_device_bays(chassis.get(), name)
            .await?
            .into_iter()
            .map(DeviceBay::from)
            .collect())
    }

    async fn set_bay_installed_device(
        &self,
        bay: ObjectId,
        device: Option<ObjectId>,
    ) -> Result<DeviceBay, CoreError> {
        Ok(self
            .client
            .set_device_bay_installed(bay.get(), device.map(ObjectId::get))
            .await?
            .into())
    }
}
