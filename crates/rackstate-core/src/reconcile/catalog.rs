// ── Device metadata lookups ──
//
// Roles, device types, platforms and tags are found by natural key and
// created on first use.

use tracing::debug;

use super::report::ReconcileReport;
use crate::error::CoreError;
use crate::model::{DeviceRole, DeviceType, EntityKind, Manufacturer, NewDeviceType, Platform, Tag};
use crate::naming::slugify;
use crate::store::RemoteStore;

const ROLE_COLOR: &str = "9e9e9e";

pub async fn device_role<S: RemoteStore>(
    store: &S,
    name: &str,
    report: &mut ReconcileReport,
) -> Result<DeviceRole, CoreError> {
    if let Some(role) = store.device_role_by_name(name).await? {
        return Ok(role);
    }
    let role = store
        .create_device_role(name, &slugify(name), ROLE_COLOR)
        .await?;
    report.created(EntityKind::DeviceRole, role.name.clone());
    Ok(role)
}

/// Device type for `model`, created under `manufacturer` when missing.
///
/// Any failure other than losing the connection aborts the pass as
/// [`CoreError::DeviceTypeUnavailable`].
pub async fn device_type<S: RemoteStore>(
    store: &S,
    model: &str,
    manufacturer: &str,
    report: &mut ReconcileReport,
) -> Result<DeviceType, CoreError> {
    find_or_create_device_type(store, model, manufacturer, report)
        .await
        .map_err(|e| match e {
            CoreError::ConnectionFailed { .. }
            | CoreError::AuthenticationFailed { .. }
            | CoreError::Timeout => e,
            other => CoreError::DeviceTypeUnavailable {
                model: model.to_owned(),
                reason: other.to_string(),
            },
        })
}

async fn find_or_create_device_type<S: RemoteStore>(
    store: &S,
    model: &str,
    manufacturer: &str,
    report: &mut ReconcileReport,
) -> Result<DeviceType, CoreError> {
    if model.trim().is_empty() {
        return Err(CoreError::Facts {
            message: "product name is empty".into(),
        });
    }
    if let Some(device_type) = store.device_type_by_model(model).await? {
        return Ok(device_type);
    }

    let manufacturer = self::manufacturer(store, manufacturer, report).await?;
    let device_type = store
        .create_device_type(&NewDeviceType {
            manufacturer: manufacturer.id,
            model: model.to_owned(),
            slug: slugify(model),
            part_number: model.to_owned(),
        })
        .await?;
    report.created(EntityKind::DeviceType, device_type.model.clone());
    Ok(device_type)
}

async fn manufacturer<S: RemoteStore>(
    store: &S,
    name: &str,
    report: &mut ReconcileReport,
) -> Result<Manufacturer, CoreError> {
    if let Some(manufacturer) = store.manufacturer_by_name(name).await? {
        return Ok(manufacturer);
    }
    let manufacturer = store.create_manufacturer(name, &slugify(name)).await?;
    report.created(EntityKind::Manufacturer, manufacturer.name.clone());
    Ok(manufacturer)
}

pub async fn platform<S: RemoteStore>(
    store: &S,
    name: &str,
    report: &mut ReconcileReport,
) -> Result<Platform, CoreError> {
    if let Some(platform) = store.platform_by_name(name).await? {
        return Ok(platform);
    }
    let platform = store.create_platform(name, &slugify(name)).await?;
    report.created(EntityKind::Platform, platform.name.clone());
    Ok(platform)
}

/// Every configured tag, in configuration order.
pub async fn tags<S: RemoteStore>(
    store: &S,
    names: &[String],
    report: &mut ReconcileReport,
) -> Result<Vec<Tag>, CoreError> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag = match store.tag_by_name(name).await? {
            Some(tag) => tag,
            None => {
                let tag = store.create_tag(name, &slugify(name)).await?;
                report.created(EntityKind::Tag, tag.name.clone());
                tag
            }
        };
        tags.push(tag);
    }
    debug!(count = tags.len(), "tags resolved");
    Ok(tags)
}
