// ── NetBox payload → domain conversions ──
//
// Read side: `From<...Response>` impls normalise nested references to bare
// `ObjectId`s. Write side: domain requests become NetBox bodies.

use rackstate_api::types::{
    DeviceBayResponse, DeviceCreate, DevicePatch, DeviceResponse, DeviceRoleResponse,
    DeviceTypeResponse, LocationResponse, ManufacturerResponse, PlatformResponse, RackResponse,
    SiteResponse, TagResponse, TenantResponse,
};
use tracing::warn;

use crate::model::{
    BayRef, Device, DeviceBay, DeviceChanges, DeviceRole, DeviceType, Face, Location,
    Manufacturer, NewDevice, ObjectId, Platform, Rack, Site, Tag, Tenant,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Whole rack units of a possibly fractional height or position.
fn whole_units(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    format!("{:.0}", value.floor()).parse().ok()
}

fn number_to_u32(n: &serde_json::Number) -> Option<u32> {
    n.as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .or_else(|| n.as_f64().and_then(whole_units))
}

fn custom_field_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// ── Read side ───────────────────────────────────────────────────────

impl From<SiteResponse> for Site {
    fn from(r: SiteResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
            device_count: r.device_count,
        }
    }
}

impl From<LocationResponse> for Location {
    fn from(r: LocationResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
            site: r.site.id.into(),
            rack_count: r.rack_count,
            device_count: r.device_count,
        }
    }
}

impl From<RackResponse> for Rack {
    fn from(r: RackResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            site: r.site.id.into(),
            location: r.location.map(|l| l.id.into()),
            device_count: r.device_count,
        }
    }
}

impl From<TenantResponse> for Tenant {
    fn from(r: TenantResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
        }
    }
}

impl From<DeviceRoleResponse> for DeviceRole {
    fn from(r: DeviceRoleResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
        }
    }
}

impl From<ManufacturerResponse> for Manufacturer {
    fn from(r: ManufacturerResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
        }
    }
}

impl From<DeviceTypeResponse> for DeviceType {
    fn from(r: DeviceTypeResponse) -> Self {
        Self {
            id: r.id.into(),
            model: r.model,
            slug: r.slug,
            u_height: r.u_height.and_then(whole_units),
        }
    }
}

impl From<PlatformResponse> for Platform {
    fn from(r: PlatformResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
        }
    }
}

impl From<TagResponse> for Tag {
    fn from(r: TagResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            slug: r.slug,
        }
    }
}

impl From<DeviceBayResponse> for DeviceBay {
    fn from(r: DeviceBayResponse) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            device: r.device.id.into(),
            installed_device: r.installed_device.map(|d| d.id.into()),
        }
    }
}

impl From<DeviceResponse> for Device {
    fn from(r: DeviceResponse) -> Self {
        let face = r.face.and_then(|choice| match choice.value.parse::<Face>() {
            Ok(face) => Some(face),
            Err(_) => {
                warn!(device = r.id, face = %choice.value, "ignoring unknown rack face");
                None
            }
        });

        let bay = r.parent_device.and_then(|parent| {
            parent.device_bay.map(|bay| BayRef {
                id: bay.id.into(),
                name: bay.name.unwrap_or_default(),
                chassis: parent.id.into(),
            })
        });

        Self {
            id: r.id.into(),
            name: r.name.filter(|n| !n.is_empty()),
            serial: r.serial,
            device_type: r.device_type.id.into(),
            role: r.role.id.into(),
            platform: r.platform.map(|p| p.id.into()),
            site: r.site.id.into(),
            tenant: r.tenant.map(|t| t.id.into()),
            rack: r.rack.map(|rk| rk.id.into()),
            location: r.location.map(|l| l.id.into()),
            position: r.position.as_ref().and_then(number_to_u32),
            face,
            tags: r.tags.into_iter().map(Tag::from).collect(),
            custom_fields: r
                .custom_fields
                .into_iter()
                .filter_map(|(k, v)| custom_field_value(v).map(|v| (k, v)))
                .collect(),
            bay,
        }
    }
}

// ── Write side ──────────────────────────────────────────────────────

impl From<&NewDevice> for DeviceCreate {
    fn from(d: &NewDevice) -> Self {
        Self {
            name: d.name.clone(),
            serial: d.serial.clone(),
            device_type: d.device_type.get(),
            role: d.role.get(),
            site: d.site.get(),
            platform: d.platform.map(ObjectId::get),
            tenant: d.tenant.map(ObjectId::get),
            rack: d.rack.map(ObjectId::get),
            location: d.location.map(ObjectId::get),
            position: d.position,
            face: d.face.map(|f| f.to_string()),
            tags: d.tags.iter().map(|t| t.get()).collect(),
            custom_fields: d.custom_fields.clone(),
        }
    }
}

fn nullable_id(field: Option<Option<ObjectId>>) -> Option<Option<u64>> {
    field.map(|inner| inner.map(ObjectId::get))
}

impl From<&DeviceChanges> for DevicePatch {
    fn from(c: &DeviceChanges) -> Self {
        Self {
            name: c.name.clone(),
            serial: c.serial.clone(),
            device_type: c.device_type.map(ObjectId::get),
            role: c.role.map(ObjectId::get),
            platform: nullable_id(c.platform),
            site: c.site.map(ObjectId::get),
            tenant: nullable_id(c.tenant),
            rack: nullable_id(c.rack),
            location: nullable_id(c.location),
            position: c.position,
            face: c.face.map(|inner| inner.map(|f| f.to_string())),
            tags: c
                .tags
                .as_ref()
                .map(|ids| ids.iter().map(|t| t.get()).collect()),
            custom_fields: c.custom_fields.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use serde_json::json;

    fn blade_response() -> DeviceResponse {
        serde_json::from_value(json!({
            "id": 21,
            "name": "blade-03",
            "serial": "BLD003",
            "device_type": { "id": 4, "model": "PowerEdge M640" },
            "role": { "id": 3, "name": "Blade" },
            "site": { "id": 1 },
            "rack": { "id": 8, "name": "R12" },
            "position": 14.0,
            "face": { "value": "rear", "label": "Rear" },
            "parent_device": {
                "id": 20,
                "name": "chassis-01",
                "device_bay": { "id": 301, "name": "Slot 3" }
            },
            "custom_fields": { "owner": "ops", "ticket": null, "weight": 12 }
        }))
        .unwrap()
    }

    #[test]
    fn device_nested_refs_become_ids() {
        let device = Device::from(blade_response());
        assert_eq!(device.site, ObjectId::new(1));
        assert_eq!(device.rack, Some(ObjectId::new(8)));
        assert_eq!(device.position, Some(14));
        assert_eq!(device.face, Some(Face::Rear));
    }

    #[test]
    fn parent_device_becomes_bay_ref() {
        let bay = Device::from(blade_response()).bay.unwrap();
        assert_eq!(bay.id, ObjectId::new(301));
        assert_eq!(bay.name, "Slot 3");
        assert_eq!(bay.chassis, ObjectId::new(20));
    }

    #[test]
    fn null_custom_fields_are_dropped() {
        let fields = Device::from(blade_response()).custom_fields;
        assert_eq!(fields.get("owner").map(String::as_str), Some("ops"));
        assert_eq!(fields.get("weight").map(String::as_str), Some("12"));
        assert!(!fields.contains_key("ticket"));
    }

    #[test]
    fn fractional_height_rounds_down() {
        assert_eq!(whole_units(1.5), Some(1));
        assert_eq!(whole_units(-1.0), None);
    }

    #[test]
    fn changes_map_onto_patch() {
        let changes = DeviceChanges {
            rack: Some(None),
            face: Some(Some(Face::Front)),
            custom_fields: Some(BTreeMap::from([("owner".to_owned(), None)])),
            ..DeviceChanges::default()
        };
        let value = serde_json::to_value(DevicePatch::from(&changes)).unwrap();
        assert_eq!(
            value,
            json!({ "rack": null, "face": "front", "custom_fields": { "owner": null } })
        );
    }
}
