// ── Reconciliation pass ──
//
// One pass takes a physical unit's facts and its placement intents and
// drives the remote inventory to match:
//
//   placement → metadata → purge → identify/create → bay → drift → commit
//   → parent cleanup → expansion shadow → device type height
//
// Every remote effect is recorded in the returned `ReconcileReport`.

mod catalog;
mod device;
mod drift;
mod labels;
mod placement;
mod report;
mod slot;
mod topology;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

pub use labels::{parse_custom_fields, parse_tags};
pub use placement::Placement;
pub use report::{Action, ReconcileReport};

use self::drift::{Expected, FullSync, diff_device};
use self::topology::{PreviousParents, cleanup};
use crate::config::ReconcileConfig;
use crate::driver::PlacementIntents;
use crate::error::CoreError;
use crate::facts::{ChassisFacts, PhysicalUnitFacts};
use crate::model::{Device, DeviceRole, DeviceType, EntityKind, Face, NewDevice, ObjectId, Tag};
use crate::store::RemoteStore;

/// Drives one physical unit's records towards its observed state.
pub struct Reconciler<'a, S: RemoteStore> {
    store: &'a S,
    config: &'a ReconcileConfig,
}

/// Everything looked up before the device itself is touched.
struct Context {
    placement: Placement,
    role: DeviceRole,
    device_type: DeviceType,
    platform: Option<ObjectId>,
    tags: Vec<Tag>,
}

impl Context {
    fn tag_ids(&self) -> Vec<ObjectId> {
        self.tags.iter().map(|t| t.id).collect()
    }

    /// Rack position and face are only meaningful inside a rack.
    fn rack_slot(&self, position: Option<u32>, face: Option<Face>) -> (Option<u32>, Option<Face>) {
        if self.placement.rack.is_some() {
            (position, face)
        } else {
            (None, None)
        }
    }
}

impl<'a, S: RemoteStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, config: &'a ReconcileConfig) -> Self {
        Self { store, config }
    }

    /// Run one pass. Fatal errors abort it; whatever was already written
    /// stays written and the next pass converges from there.
    pub async fn reconcile<F>(
        &self,
        facts: &F,
        intents: &PlacementIntents,
    ) -> Result<ReconcileReport, CoreError>
    where
        F: PhysicalUnitFacts + Sync,
    {
        validate(facts)?;
        let store = self.store;
        let mut report = ReconcileReport::default();

        let ctx = self.context(facts, intents, &mut report).await?;

        if self.config.purge_old_devices {
            device::purge_stale(
                store,
                facts.hostname(),
                facts.serial(),
                &ctx.placement.topology(),
                &mut report,
            )
            .await?;
        }

        let (device, chassis) = match facts.chassis() {
            None => (self.standalone(facts, &ctx, &mut report).await?, None),
            Some((chassis_facts, slot)) => {
                let chassis = self
                    .chassis(chassis_facts, facts, &ctx, &mut report)
                    .await?;
                let blade = self.blade(facts, &ctx, &mut report).await?;
                slot::assign(store, &blade, &chassis, slot, &mut report).await?;
                (blade, Some(chassis))
            }
        };

        let device = self.commit(facts, &ctx, device, &mut report).await?;

        self.expansion(facts, &device, chassis.as_ref(), &mut report)
            .await?;

        // A zero height means the driver had nothing useful to say.
        if let Some(height) = intents.height.filter(|h| *h > 0) {
            if self.config.location_sync_enabled() {
                self.height(device.device_type, height, &mut report).await?;
            }
        }

        info!(serial = facts.serial(), %report, "reconciliation finished");
        Ok(report)
    }

    // ── Lookups ──────────────────────────────────────────────────────

    async fn context<F: PhysicalUnitFacts + Sync>(
        &self,
        facts: &F,
        intents: &PlacementIntents,
        report: &mut ReconcileReport,
    ) -> Result<Context, CoreError> {
        let store = self.store;
        let placement = placement::resolve(store, intents, report).await?;

        let role_name = if facts.chassis().is_some() {
            &self.config.roles.blade
        } else {
            &self.config.roles.server
        };
        let role = catalog::device_role(store, role_name, report).await?;
        let device_type = catalog::device_type(
            store,
            facts.product_name(),
            &self.config.manufacturer,
            report,
        )
        .await?;

        let platform = match facts.platform() {
            Some(name) => Some(catalog::platform(store, name, report).await?.id),
            None => {
                debug!("platform not detected; leaving it untouched");
                None
            }
        };
        let tags = catalog::tags(store, &self.config.tags, report).await?;

        Ok(Context {
            placement,
            role,
            device_type,
            platform,
            tags,
        })
    }

    // ── Identify / create ────────────────────────────────────────────

    async fn standalone<F: PhysicalUnitFacts + Sync>(
        &self,
        facts: &F,
        ctx: &Context,
        report: &mut ReconcileReport,
    ) -> Result<Device, CoreError> {
        let (position, face) = ctx.rack_slot(facts.position(), facts.face());
        let new = self.new_device(facts, ctx, position, face);
        let (device, _) = device::find_or_create(self.store, &new, report).await?;
        Ok(device)
    }

    /// The enclosing chassis. It is created when missing and otherwise
    /// left as it is.
    async fn chassis<F: PhysicalUnitFacts + Sync>(
        &self,
        chassis: &ChassisFacts,
        facts: &F,
        ctx: &Context,
        report: &mut ReconcileReport,
    ) -> Result<Device, CoreError> {
        let store = self.store;
        if let Some(device) = store.device_by_serial(&chassis.serial).await? {
            return Ok(device);
        }

        let role = catalog::device_role(store, &self.config.roles.chassis, report).await?;
        let device_type =
            catalog::device_type(store, &chassis.product, &self.config.manufacturer, report)
                .await?;
        let (position, face) = ctx.rack_slot(facts.position(), facts.face());
        let topology = ctx.placement.topology();

        let new = NewDevice {
            name: chassis.name.clone(),
            serial: chassis.serial.clone(),
            device_type: device_type.id,
            role: role.id,
            site: topology.site,
            platform: None,
            tenant: ctx.placement.tenant_id(),
            rack: topology.rack,
            location: topology.location,
            position,
            face,
            tags: ctx.tag_ids(),
            custom_fields: BTreeMap::new(),
        };
        let (device, _) = device::find_or_create(store, &new, report).await?;
        Ok(device)
    }

    async fn blade<F: PhysicalUnitFacts + Sync>(
        &self,
        facts: &F,
        ctx: &Context,
        report: &mut ReconcileReport,
    ) -> Result<Device, CoreError> {
        let new = self.new_device(facts, ctx, None, None);
        let (device, _) = device::find_or_create(self.store, &new, report).await?;
        Ok(device)
    }

    fn new_device<F: PhysicalUnitFacts>(
        &self,
        facts: &F,
        ctx: &Context,
        position: Option<u32>,
        face: Option<Face>,
    ) -> NewDevice {
        let topology = ctx.placement.topology();
        NewDevice {
            name: facts.hostname().to_owned(),
            serial: facts.serial().to_owned(),
            device_type: ctx.device_type.id,
            role: ctx.role.id,
            site: topology.site,
            platform: ctx.platform,
            tenant: ctx.placement.tenant_id(),
            rack: topology.rack,
            location: topology.location,
            position,
            face,
            tags: ctx.tag_ids(),
            custom_fields: self.config.custom_fields.clone(),
        }
    }

    // ── Drift and commit ─────────────────────────────────────────────

    async fn commit<F: PhysicalUnitFacts + Sync>(
        &self,
        facts: &F,
        ctx: &Context,
        device: Device,
        report: &mut ReconcileReport,
    ) -> Result<Device, CoreError> {
        let (position, face) = if facts.chassis().is_some() {
            (None, None)
        } else {
            ctx.rack_slot(facts.position(), facts.face())
        };

        let expected = Expected {
            name: facts.hostname(),
            tags: &ctx.tags,
            preserve_tags: self.config.preserve_tags,
            custom_fields: &self.config.custom_fields,
            platform: ctx.platform,
            topology: self
                .config
                .location_sync_enabled()
                .then(|| ctx.placement.topology()),
            full: self.config.update_all.then(|| FullSync {
                serial: facts.serial().to_owned(),
                device_type: ctx.device_type.id,
                role: ctx.role.id,
                tenant: ctx.placement.tenant_id(),
                position,
                face,
            }),
        };

        let changes = diff_device(&device, &expected);
        if changes.is_empty() {
            debug!(device = device.display_name(), "device in sync");
            return Ok(device);
        }

        let previous = PreviousParents::left_by(&device, &changes);
        let updated = self.store.update_device(device.id, &changes).await?;
        report.updated(
            EntityKind::Device,
            updated.display_name().to_owned(),
            changes.changed_fields(),
        );
        if !previous.is_empty() {
            cleanup(self.store, previous, report).await?;
        }
        Ok(updated)
    }

    // ── Expansion shadow ─────────────────────────────────────────────

    async fn expansion<F: PhysicalUnitFacts + Sync>(
        &self,
        facts: &F,
        primary: &Device,
        chassis: Option<&Device>,
        report: &mut ReconcileReport,
    ) -> Result<(), CoreError> {
        let store = self.store;
        let serial = facts.expansion_serial();
        let name = facts.expansion_name();

        let owned = facts.expansion().filter(|_| self.config.expansion_as_device);
        let (Some(expansion), Some(chassis)) = (owned, chassis) else {
            if owned.is_some() {
                warn!(
                    serial = facts.serial(),
                    "expansion units are only tracked for blades"
                );
                report.skipped(EntityKind::Device, name, "unit has no chassis bay");
            }
            device::remove_shadow(store, &serial, primary, report).await?;
            return Ok(());
        };

        let device_type = catalog::device_type(
            store,
            &expansion.product,
            &self.config.manufacturer,
            report,
        )
        .await?;
        let new = NewDevice {
            name: name.clone(),
            serial,
            device_type: device_type.id,
            role: primary.role,
            site: primary.site,
            platform: None,
            tenant: primary.tenant,
            rack: primary.rack,
            location: primary.location,
            position: None,
            face: None,
            tags: Vec::new(),
            custom_fields: BTreeMap::new(),
        };
        let (shadow, _) = device::find_or_create(store, &new, report).await?;
        slot::assign(store, &shadow, chassis, &expansion.slot, report).await?;
        device::follow_primary(store, &shadow, &name, primary, report).await?;
        Ok(())
    }

    // ── Device type height ───────────────────────────────────────────

    async fn height(
        &self,
        device_type: ObjectId,
        height: u32,
        report: &mut ReconcileReport,
    ) -> Result<(), CoreError> {
        let Some(current) = self.store.device_type(device_type).await? else {
            return Ok(());
        };
        if current.u_height == Some(height) {
            return Ok(());
        }
        let updated = self
            .store
            .set_device_type_height(device_type, height)
            .await?;
        report.updated(EntityKind::DeviceType, updated.model, vec!["u_height"]);
        Ok(())
    }
}

/// Reject facts whose identifiers would turn NetBox lookups into
/// unfiltered queries.
fn validate<F: PhysicalUnitFacts>(facts: &F) -> Result<(), CoreError> {
    require(facts.serial(), "serial number")?;
    require(facts.hostname(), "hostname")?;
    if let Some((chassis, slot)) = facts.chassis() {
        require(&chassis.serial, "chassis serial number")?;
        require(slot, "chassis bay")?;
        if let Some(expansion) = facts.expansion() {
            require(&expansion.slot, "expansion bay")?;
        }
    }
    Ok(())
}

fn require(value: &str, what: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Facts {
            message: format!("{what} is empty"),
        });
    }
    Ok(())
}
