// ── In-process store ──
//
// A `RemoteStore` that keeps every table in memory. Child counts and the
// blade → bay back-reference are derived on read, the way NetBox computes
// them server-side. Deletes are refused while dependents remain, matching
// NetBox's PROTECT foreign keys, so ordering mistakes in cleanup surface as
// errors instead of silently succeeding.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::RemoteStore;
use super::table::Table;
use crate::error::CoreError;
use crate::model::{
    BayRef, Device, DeviceBay, DeviceChanges, DeviceRole, DeviceType, Location, Manufacturer,
    NewDevice, NewDeviceType, ObjectId, Platform, Rack, Site, Tag, Tenant,
};
use crate::naming::slugify;

/// Inventory held entirely in process.
///
/// `seed_*` helpers populate the tables without counting as writes;
/// [`write_count`](Self::write_count) only tracks mutations issued
/// through [`RemoteStore`].
pub struct MemoryStore {
    sites: Table<Site>,
    locations: Table<Location>,
    racks: Table<Rack>,
    tenants: Table<Tenant>,
    roles: Table<DeviceRole>,
    manufacturers: Table<Manufacturer>,
    device_types: Table<DeviceType>,
    platforms: Table<Platform>,
    tags: Table<Tag>,
    devices: Table<Device>,
    bays: Table<DeviceBay>,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(message: impl Into<String>) -> CoreError {
    CoreError::Rejected {
        message: message.into(),
    }
}

fn not_found(entity_type: &str, id: ObjectId) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.into(),
        identifier: id.to_string(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sites: Table::new(),
            locations: Table::new(),
            racks: Table::new(),
            tenants: Table::new(),
            roles: Table::new(),
            manufacturers: Table::new(),
            device_types: Table::new(),
            platforms: Table::new(),
            tags: Table::new(),
            devices: Table::new(),
            bays: Table::new(),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of mutating calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn record_write(&self, what: &str) {
        debug!(what, "memory store write");
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    // ── Seeding ──────────────────────────────────────────────────────

    pub fn seed_site(&self, name: &str, slug: &str) -> Site {
        self.sites.insert_with(|id| Site {
            id,
            name: name.into(),
            slug: slug.into(),
            device_count: 0,
        })
    }

    pub fn seed_location(&self, name: &str, slug: &str, site: ObjectId) -> Location {
        self.locations.insert_with(|id| Location {
            id,
            name: name.into(),
            slug: slug.into(),
            site,
            rack_count: 0,
            device_count: 0,
        })
    }

    pub fn seed_rack(&self, name: &str, site: ObjectId, location: Option<ObjectId>) -> Rack {
        self.racks.insert_with(|id| Rack {
            id,
            name: name.into(),
            site,
            location,
            device_count: 0,
        })
    }

    pub fn seed_tenant(&self, name: &str, slug: &str) -> Tenant {
        self.tenants.insert_with(|id| Tenant {
            id,
            name: name.into(),
            slug: slug.into(),
        })
    }

    pub fn seed_device_role(&self, name: &str) -> DeviceRole {
        self.roles.insert_with(|id| DeviceRole {
            id,
            name: name.into(),
            slug: slugify(name),
        })
    }

    pub fn seed_device_type(&self, model: &str, u_height: Option<u32>) -> DeviceType {
        self.device_types.insert_with(|id| DeviceType {
            id,
            model: model.into(),
            slug: slugify(model),
            u_height,
        })
    }

    pub fn seed_tag(&self, name: &str) -> Tag {
        self.tags.insert_with(|id| Tag {
            id,
            name: name.into(),
            slug: slugify(name),
        })
    }

    pub fn seed_device(&self, new: &NewDevice) -> Result<Device, CoreError> {
        let tags = self.resolve_tags(&new.tags)?;
        let row = self.devices.insert_with(|id| Device {
            id,
            name: Some(new.name.clone()),
            serial: new.serial.clone(),
            device_type: new.device_type,
            role: new.role,
            platform: new.platform,
            site: new.site,
            tenant: new.tenant,
            rack: new.rack,
            location: new.location,
            position: new.position,
            face: new.face,
            tags,
            custom_fields: new.custom_fields.clone(),
            bay: None,
        });
        Ok(self.derive_device(row))
    }

    pub fn seed_device_bay(&self, chassis: ObjectId, name: &str) -> DeviceBay {
        self.bays.insert_with(|id| DeviceBay {
            id,
            name: name.into(),
            device: chassis,
            installed_device: None,
        })
    }

    /// Install a device into a bay without counting a write.
    pub fn seed_installation(&self, bay: ObjectId, device: ObjectId) -> Result<(), CoreError> {
        self.install(bay, Some(device)).map(|_| ())
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn sites(&self) -> Vec<Site> {
        self.sites
            .all()
            .into_iter()
            .map(|s| self.derive_site(s))
            .collect()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.locations
            .all()
            .into_iter()
            .map(|l| self.derive_location(l))
            .collect()
    }

    pub fn racks(&self) -> Vec<Rack> {
        self.racks
            .all()
            .into_iter()
            .map(|r| self.derive_rack(r))
            .collect()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.devices
            .all()
            .into_iter()
            .map(|d| self.derive_device(d))
            .collect()
    }

    pub fn devices_with_serial(&self, serial: &str) -> Vec<Device> {
        self.devices
            .filter(|d| d.serial == serial)
            .into_iter()
            .map(|d| self.derive_device(d))
            .collect()
    }

    pub fn bays(&self) -> Vec<DeviceBay> {
        self.bays.all()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.all()
    }

    pub fn device_types(&self) -> Vec<DeviceType> {
        self.device_types.all()
    }

    // ── Derived fields ───────────────────────────────────────────────

    fn derive_site(&self, mut site: Site) -> Site {
        site.device_count = self.devices.count(|d| d.site == site.id);
        site
    }

    fn derive_location(&self, mut location: Location) -> Location {
        let id = location.id;
        location.device_count = self.devices.count(|d| d.location == Some(id));
        location.rack_count = self.racks.count(|r| r.location == Some(id));
        location
    }

    fn derive_rack(&self, mut rack: Rack) -> Rack {
        let id = rack.id;
        rack.device_count = self.devices.count(|d| d.rack == Some(id));
        rack
    }

    fn derive_device(&self, mut device: Device) -> Device {
        let id = device.id;
        device.bay = self
            .bays
            .find(|b| b.installed_device == Some(id))
            .map(|b| BayRef {
                id: b.id,
                name: b.name,
                chassis: b.device,
            });
        device
    }

    fn resolve_tags(&self, ids: &[ObjectId]) -> Result<Vec<Tag>, CoreError> {
        ids.iter()
            .map(|id| self.tags.get(*id).ok_or_else(|| not_found("tag", *id)))
            .collect()
    }

    fn install(&self, bay: ObjectId, device: Option<ObjectId>) -> Result<DeviceBay, CoreError> {
        if let Some(device) = device {
            if !self.devices.contains(device) {
                return Err(not_found("device", device));
            }
            if let Some(other) = self
                .bays
                .find(|b| b.installed_device == Some(device) && b.id != bay)
            {
                return Err(rejected(format!(
                    "device {device} is already installed in bay {} ({})",
                    other.id, other.name
                )));
            }
        }
        self.bays
            .update(bay, |b| b.installed_device = device)
            .ok_or_else(|| not_found("device bay", bay))
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    // ── Sites ────────────────────────────────────────────────────────

    async fn site_by_slug(&self, slug: &str) -> Result<Option<Site>, CoreError> {
        Ok(self
            .sites
            .find(|s| s.slug == slug)
            .map(|s| self.derive_site(s)))
    }

    async fn site(&self, id: ObjectId) -> Result<Option<Site>, CoreError> {
        Ok(self.sites.get(id).map(|s| self.derive_site(s)))
    }

    async fn create_site(&self, name: &str, slug: &str) -> Result<Site, CoreError> {
        if self.sites.find(|s| s.slug == slug).is_some() {
            return Err(rejected(format!("site with slug {slug:?} already exists")));
        }
        self.record_write("create site");
        Ok(self.seed_site(name, slug))
    }

    async fn delete_site(&self, id: ObjectId) -> Result<(), CoreError> {
        if !self.sites.contains(id) {
            return Err(not_found("site", id));
        }
        let devices = self.devices.count(|d| d.site == id);
        if devices > 0 {
            return Err(rejected(format!("site {id} still holds {devices} devices")));
        }
        self.record_write("delete site");
        // Racks and locations cascade with their site.
        self.racks.remove_where(|r| r.site == id);
        self.locations.remove_where(|l| l.site == id);
        self.sites.remove(id);
        Ok(())
    }

    // ── Locations ────────────────────────────────────────────────────

    async fn location_by_name(
        &self,
        name: &str,
        site: ObjectId,
    ) -> Result<Option<Location>, CoreError> {
        Ok(self
            .locations
            .find(|l| l.name == name && l.site == site)
            .map(|l| self.derive_location(l)))
    }

    async fn location(&self, id: ObjectId) -> Result<Option<Location>, CoreError> {
        Ok(self.locations.get(id).map(|l| self.derive_location(l)))
    }

    async fn create_location(
        &self,
        name: &str,
        slug: &str,
        site: ObjectId,
    ) -> Result<Location, CoreError> {
        if !self.sites.contains(site) {
            return Err(not_found("site", site));
        }
        self.record_write("create location");
        Ok(self.seed_location(name, slug, site))
    }

    async fn delete_location(&self, id: ObjectId) -> Result<(), CoreError> {
        let location = self
            .location(id)
            .await?
            .ok_or_else(|| not_found("location", id))?;
        if !location.is_empty() {
            return Err(rejected(format!(
                "location {id} still holds {} racks and {} devices",
                location.rack_count, location.device_count
            )));
        }
        self.record_write("delete location");
        self.locations.remove(id);
        Ok(())
    }

    // ── Racks ────────────────────────────────────────────────────────

    async fn rack_by_name(&self, name: &str, site: ObjectId) -> Result<Option<Rack>, CoreError> {
        Ok(self
            .racks
            .find(|r| r.name == name && r.site == site)
            .map(|r| self.derive_rack(r)))
    }

    async fn rack(&self, id: ObjectId) -> Result<Option<Rack>, CoreError> {
        Ok(self.racks.get(id).map(|r| self.derive_rack(r)))
    }

    async fn create_rack(
        &self,
        name: &str,
        site: ObjectId,
        location: Option<ObjectId>,
    ) -> Result<Rack, CoreError> {
        if !self.sites.contains(site) {
            return Err(not_found("site", site));
        }
        self.record_write("create rack");
        Ok(self.seed_rack(name, site, location))
    }

    async fn set_rack_location(
        &self,
        id: ObjectId,
        location: Option<ObjectId>,
    ) -> Result<Rack, CoreError> {
        self.record_write("update rack");
        self.racks
            .update(id, |r| r.location = location)
            .map(|r| self.derive_rack(r))
            .ok_or_else(|| not_found("rack", id))
    }

    async fn delete_rack(&self, id: ObjectId) -> Result<(), CoreError> {
        let rack = self.rack(id).await?.ok_or_else(|| not_found("rack", id))?;
        if !rack.is_empty() {
            return Err(rejected(format!(
                "rack {id} still holds {} devices",
                rack.device_count
            )));
        }
        self.record_write("delete rack");
        self.racks.remove(id);
        Ok(())
    }

    // ── Tenancy ──────────────────────────────────────────────────────

    async fn tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError> {
        Ok(self.tenants.find(|t| t.slug == slug))
    }

    // ── Device metadata ──────────────────────────────────────────────

    async fn device_role_by_name(&self, name: &str) -> Result<Option<DeviceRole>, CoreError> {
        Ok(self.roles.find(|r| r.name == name))
    }

    async fn create_device_role(
        &self,
        name: &str,
        slug: &str,
        _color: &str,
    ) -> Result<DeviceRole, CoreError> {
        self.record_write("create device role");
        Ok(self.roles.insert_with(|id| DeviceRole {
            id,
            name: name.into(),
            slug: slug.into(),
        }))
    }

    async fn manufacturer_by_name(&self, name: &str) -> Result<Option<Manufacturer>, CoreError> {
        Ok(self.manufacturers.find(|m| m.name == name))
    }

    async fn create_manufacturer(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<Manufacturer, CoreError> {
        self.record_write("create manufacturer");
        Ok(self.manufacturers.insert_with(|id| Manufacturer {
            id,
            name: name.into(),
            slug: slug.into(),
        }))
    }

    async fn device_type_by_model(&self, model: &str) -> Result<Option<DeviceType>, CoreError> {
        Ok(self.device_types.find(|t| t.model == model))
    }

    async fn device_type(&self, id: ObjectId) -> Result<Option<DeviceType>, CoreError> {
        Ok(self.device_types.get(id))
    }

    async fn create_device_type(&self, new: &NewDeviceType) -> Result<DeviceType, CoreError> {
        if !self.manufacturers.contains(new.manufacturer) {
            return Err(not_found("manufacturer", new.manufacturer));
        }
        self.record_write("create device type");
        Ok(self.device_types.insert_with(|id| DeviceType {
            id,
            model: new.model.clone(),
            slug: new.slug.clone(),
            u_height: Some(1),
        }))
    }

    async fn set_device_type_height(
        &self,
        id: ObjectId,
        u_height: u32,
    ) -> Result<DeviceType, CoreError> {
        self.record_write("update device type");
        self.device_types
            .update(id, |t| t.u_height = Some(u_height))
            .ok_or_else(|| not_found("device type", id))
    }

    async fn platform_by_name(&self, name: &str) -> Result<Option<Platform>, CoreError> {
        Ok(self.platforms.find(|p| p.name == name))
    }

    async fn create_platform(&self, name: &str, slug: &str) -> Result<Platform, CoreError> {
        self.record_write("create platform");
        Ok(self.platforms.insert_with(|id| Platform {
            id,
            name: name.into(),
            slug: slug.into(),
        }))
    }

    async fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, CoreError> {
        Ok(self.tags.find(|t| t.name == name))
    }

    async fn create_tag(&self, name: &str, slug: &str) -> Result<Tag, CoreError> {
        self.record_write("create tag");
        Ok(self.tags.insert_with(|id| Tag {
            id,
            name: name.into(),
            slug: slug.into(),
        }))
    }

    // ── Devices ──────────────────────────────────────────────────────

    async fn device_by_serial(&self, serial: &str) -> Result<Option<Device>, CoreError> {
        let mut hits = self.devices.filter(|d| d.serial == serial);
        if hits.len() > 1 {
            return Err(CoreError::Api {
                message: format!("ambiguous lookup on serial {serial:?}"),
                status: None,
            });
        }
        Ok(hits.pop().map(|d| self.derive_device(d)))
    }

    async fn device_by_name(&self, name: &str) -> Result<Option<Device>, CoreError> {
        Ok(self
            .devices
            .find(|d| d.name.as_deref() == Some(name))
            .map(|d| self.derive_device(d)))
    }

    async fn device(&self, id: ObjectId) -> Result<Option<Device>, CoreError> {
        Ok(self.devices.get(id).map(|d| self.derive_device(d)))
    }

    async fn create_device(&self, new: &NewDevice) -> Result<Device, CoreError> {
        if !self.sites.contains(new.site) {
            return Err(not_found("site", new.site));
        }
        self.record_write("create device");
        self.seed_device(new)
    }

    async fn update_device(
        &self,
        id: ObjectId,
        changes: &DeviceChanges,
    ) -> Result<Device, CoreError> {
        let tags = match &changes.tags {
            Some(ids) => Some(self.resolve_tags(ids)?),
            None => None,
        };
        self.record_write("update device");

        let updated = self.devices.update(id, |d| {
            if let Some(name) = &changes.name {
                d.name = Some(name.clone());
            }
            if let Some(serial) = &changes.serial {
                d.serial.clone_from(serial);
            }
            if let Some(device_type) = changes.device_type {
                d.device_type = device_type;
            }
            if let Some(role) = changes.role {
                d.role = role;
            }
            if let Some(platform) = changes.platform {
                d.platform = platform;
            }
            if let Some(site) = changes.site {
                d.site = site;
            }
            if let Some(tenant) = changes.tenant {
                d.tenant = tenant;
            }
            if let Some(rack) = changes.rack {
                d.rack = rack;
            }
            if let Some(location) = changes.location {
                d.location = location;
            }
            if let Some(position) = changes.position {
                d.position = position;
            }
            if let Some(face) = changes.face {
                d.face = face;
            }
            if let Some(tags) = tags {
                d.tags = tags;
            }
            if let Some(fields) = &changes.custom_fields {
                for (key, value) in fields {
                    match value {
                        Some(v) => {
                            d.custom_fields.insert(key.clone(), v.clone());
                        }
                        None => {
                            d.custom_fields.remove(key);
                        }
                    }
                }
            }
        });

        updated
            .map(|d| self.derive_device(d))
            .ok_or_else(|| not_found("device", id))
    }

    async fn delete_device(&self, id: ObjectId) -> Result<(), CoreError> {
        if self.devices.remove(id).is_none() {
            return Err(not_found("device", id));
        }
        self.record_write("delete device");
        // Bays owned by the device go with it; bays holding it are emptied.
        self.bays.remove_where(|b| b.device == id);
        for bay in self.bays.filter(|b| b.installed_device == Some(id)) {
            self.bays.update(bay.id, |b| b.installed_device = None);
        }
        Ok(())
    }

    // ── Device bays ──────────────────────────────────────────────────

    async fn device_bays(
        &self,
        chassis: ObjectId,
        name: &str,
    ) -> Result<Vec<DeviceBay>, CoreError> {
        Ok(self.bays.filter(|b| b.device == chassis && b.name == name))
    }

    async fn set_bay_installed_device(
        &self,
        bay: ObjectId,
        device: Option<ObjectId>,
    ) -> Result<DeviceBay, CoreError> {
        let updated = self.install(bay, device)?;
        self.record_write("update device bay");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn new_device(site: ObjectId, serial: &str, rack: Option<ObjectId>) -> NewDevice {
        NewDevice {
            name: format!("host-{serial}"),
            serial: serial.into(),
            device_type: ObjectId::new(1),
            role: ObjectId::new(1),
            site,
            platform: None,
            tenant: None,
            rack,
            location: None,
            position: None,
            face: None,
            tags: Vec::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn counts_are_derived() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let location = store.seed_location("room 1", "room-1", site.id);
        let rack = store.seed_rack("R1", site.id, Some(location.id));
        store
            .seed_device(&new_device(site.id, "A", Some(rack.id)))
            .unwrap();

        assert_eq!(store.site(site.id).await.unwrap().unwrap().device_count, 1);
        assert_eq!(store.rack(rack.id).await.unwrap().unwrap().device_count, 1);
        let location = store.location(location.id).await.unwrap().unwrap();
        assert_eq!((location.rack_count, location.device_count), (1, 0));
    }

    #[tokio::test]
    async fn occupied_parents_cannot_be_deleted() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let rack = store.seed_rack("R1", site.id, None);
        store
            .seed_device(&new_device(site.id, "A", Some(rack.id)))
            .unwrap();

        let err = store.delete_rack(rack.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
        assert!(store.delete_site(site.id).await.is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn bay_back_reference_follows_installation() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let chassis = store.seed_device(&new_device(site.id, "C", None)).unwrap();
        let blade = store.seed_device(&new_device(site.id, "B", None)).unwrap();
        let bay = store.seed_device_bay(chassis.id, "Slot 1");

        store
            .set_bay_installed_device(bay.id, Some(blade.id))
            .await
            .unwrap();
        let bay_ref = store.device(blade.id).await.unwrap().unwrap().bay.unwrap();
        assert_eq!(bay_ref.chassis, chassis.id);
        assert_eq!(bay_ref.name, "Slot 1");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn installing_into_a_second_bay_is_refused() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let chassis = store.seed_device(&new_device(site.id, "C", None)).unwrap();
        let blade = store.seed_device(&new_device(site.id, "B", None)).unwrap();
        let first = store.seed_device_bay(chassis.id, "Slot 1");
        let second = store.seed_device_bay(chassis.id, "Slot 2");
        store.seed_installation(first.id, blade.id).unwrap();

        let err = store
            .set_bay_installed_device(second.id, Some(blade.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[tokio::test]
    async fn deleting_a_device_empties_its_bay() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let chassis = store.seed_device(&new_device(site.id, "C", None)).unwrap();
        let blade = store.seed_device(&new_device(site.id, "B", None)).unwrap();
        let bay = store.seed_device_bay(chassis.id, "Slot 1");
        store.seed_installation(bay.id, blade.id).unwrap();

        store.delete_device(blade.id).await.unwrap();
        assert!(store.bays()[0].installed_device.is_none());
    }
}
