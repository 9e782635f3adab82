// ── Location resolver ──
//
// Maps placement intents to inventory records, creating sites, locations
// and racks the first time they are referenced. Tenants are only looked
// up.

use tracing::{debug, info, warn};

use super::drift::Topology;
use super::report::ReconcileReport;
use super::topology::cleanup_location;
use crate::driver::PlacementIntents;
use crate::error::CoreError;
use crate::model::{EntityKind, Location, ObjectId, Rack, Site, Tenant};
use crate::naming::{display_name, natural_slug};
use crate::store::RemoteStore;

/// Resolved placement of the unit being reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub site: Site,
    pub location: Option<Location>,
    pub rack: Option<Rack>,
    pub tenant: Option<Tenant>,
}

impl Placement {
    /// A racked device lives in its rack's location; otherwise in the
    /// stand-alone location, if any.
    pub fn device_location(&self) -> Option<ObjectId> {
        match &self.rack {
            Some(rack) => rack.location,
            None => self.location.as_ref().map(|l| l.id),
        }
    }

    pub fn rack_id(&self) -> Option<ObjectId> {
        self.rack.as_ref().map(|r| r.id)
    }

    pub fn tenant_id(&self) -> Option<ObjectId> {
        self.tenant.as_ref().map(|t| t.id)
    }

    pub fn topology(&self) -> Topology {
        Topology {
            site: self.site.id,
            rack: self.rack_id(),
            location: self.device_location(),
        }
    }
}

/// Resolve every intent, creating missing parents.
pub async fn resolve<S: RemoteStore>(
    store: &S,
    intents: &PlacementIntents,
    report: &mut ReconcileReport,
) -> Result<Placement, CoreError> {
    let Some(site_value) = intents.site.as_deref() else {
        if intents.location.is_some() {
            return Err(CoreError::MissingParentSite {
                entity: "location".into(),
            });
        }
        if intents.rack.is_some() {
            return Err(CoreError::MissingParentSite {
                entity: "rack".into(),
            });
        }
        return Err(CoreError::MissingSite);
    };

    let site = resolve_site(store, site_value, report).await?;

    let location = match intents.location.as_deref() {
        Some(value) => Some(resolve_location(store, value, &site, report).await?),
        None => None,
    };

    let rack = match intents.rack.as_deref() {
        Some(value) => Some(resolve_rack(store, value, &site, location.as_ref(), report).await?),
        None => None,
    };

    let tenant = match intents.tenant.as_deref() {
        Some(value) => resolve_tenant(store, value).await?,
        None => None,
    };

    Ok(Placement {
        site,
        location,
        rack,
        tenant,
    })
}

async fn resolve_site<S: RemoteStore>(
    store: &S,
    value: &str,
    report: &mut ReconcileReport,
) -> Result<Site, CoreError> {
    let slug = natural_slug(value);
    if let Some(site) = store.site_by_slug(&slug).await? {
        return Ok(site);
    }

    let name = display_name(value);
    warn!(site = %name, "creating site; remember to assign its region");
    let site = store.create_site(&name, &slug).await?;
    report.created(EntityKind::Site, site.name.clone());
    Ok(site)
}

async fn resolve_location<S: RemoteStore>(
    store: &S,
    value: &str,
    site: &Site,
    report: &mut ReconcileReport,
) -> Result<Location, CoreError> {
    let name = display_name(value);
    if let Some(location) = store.location_by_name(&name, site.id).await? {
        return Ok(location);
    }

    let location = store
        .create_location(&name, &natural_slug(value), site.id)
        .await?;
    report.created(EntityKind::Location, location.name.clone());
    Ok(location)
}

async fn resolve_rack<S: RemoteStore>(
    store: &S,
    value: &str,
    site: &Site,
    location: Option<&Location>,
    report: &mut ReconcileReport,
) -> Result<Rack, CoreError> {
    let name = display_name(value);
    let expected_location = location.map(|l| l.id);

    let Some(rack) = store.rack_by_name(&name, site.id).await? else {
        let rack = store.create_rack(&name, site.id, expected_location).await?;
        report.created(EntityKind::Rack, rack.name.clone());
        return Ok(rack);
    };

    // Only an explicit location intent moves an existing rack.
    let Some(target) = expected_location else {
        return Ok(rack);
    };
    if rack.location == Some(target) {
        return Ok(rack);
    }

    info!(rack = %rack.name, "moving rack to its configured location");
    let previous = rack.location;
    let rack = store.set_rack_location(rack.id, Some(target)).await?;
    report.updated(EntityKind::Rack, rack.name.clone(), vec!["location"]);

    if let Some(previous) = previous {
        cleanup_location(store, previous, report).await?;
    }
    Ok(rack)
}

async fn resolve_tenant<S: RemoteStore>(
    store: &S,
    value: &str,
) -> Result<Option<Tenant>, CoreError> {
    let slug = natural_slug(value);
    let tenant = store.tenant_by_slug(&slug).await?;
    if tenant.is_none() {
        warn!(tenant = %slug, "tenant not found; tenants are never created");
    } else {
        debug!(tenant = %slug, "tenant resolved");
    }
    Ok(tenant)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn intents(site: Option<&str>, location: Option<&str>, rack: Option<&str>) -> PlacementIntents {
        PlacementIntents {
            site: site.map(Into::into),
            location: location.map(Into::into),
            rack: rack.map(Into::into),
            ..PlacementIntents::default()
        }
    }

    #[tokio::test]
    async fn site_is_mandatory() {
        let store = MemoryStore::new();
        let mut report = ReconcileReport::default();

        let err = resolve(&store, &intents(None, None, None), &mut report)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingSite));

        let err = resolve(&store, &intents(None, None, Some("R1")), &mut report)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingParentSite { ref entity } if entity == "rack"));
    }

    #[tokio::test]
    async fn missing_parents_are_created() {
        let store = MemoryStore::new();
        let mut report = ReconcileReport::default();

        let placement = resolve(
            &store,
            &intents(Some("paris-dc1"), Some("room-1"), Some("R-12")),
            &mut report,
        )
        .await
        .unwrap();

        assert_eq!(placement.site.name, "paris dc1");
        assert_eq!(placement.site.slug, "paris-dc1");
        assert_eq!(placement.rack.as_ref().unwrap().name, "R 12");
        assert_eq!(
            placement.device_location(),
            placement.location.as_ref().map(|l| l.id)
        );
        assert_eq!(report.created_count(), 3);
    }

    #[tokio::test]
    async fn second_resolution_creates_nothing() {
        let store = MemoryStore::new();
        let wanted = intents(Some("paris"), Some("room-1"), Some("R1"));
        resolve(&store, &wanted, &mut ReconcileReport::default())
            .await
            .unwrap();

        let before = store.write_count();
        let mut report = ReconcileReport::default();
        resolve(&store, &wanted, &mut report).await.unwrap();
        assert_eq!(store.write_count(), before);
        assert_eq!(report.write_count(), 0);
    }

    #[tokio::test]
    async fn rack_follows_configured_location() {
        let store = MemoryStore::new();
        let site = store.seed_site("paris", "paris");
        let old = store.seed_location("room 1", "room-1", site.id);
        store.seed_rack("R1", site.id, Some(old.id));

        let mut report = ReconcileReport::default();
        let placement = resolve(
            &store,
            &intents(Some("paris"), Some("room-2"), Some("R1")),
            &mut report,
        )
        .await
        .unwrap();

        let new_location = placement.location.unwrap().id;
        assert_eq!(placement.rack.unwrap().location, Some(new_location));
        // The abandoned location had nothing else in it.
        assert!(store.location(old.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_created() {
        let store = MemoryStore::new();
        store.seed_tenant("Acme Corp", "acme-corp");
        let mut report = ReconcileReport::default();

        let mut wanted = intents(Some("paris"), None, None);
        wanted.tenant = Some("Acme Corp".into());
        let placement = resolve(&store, &wanted, &mut report).await.unwrap();
        assert_eq!(placement.tenant.unwrap().slug, "acme-corp");

        wanted.tenant = Some("Globex".into());
        let placement = resolve(&store, &wanted, &mut report).await.unwrap();
        assert!(placement.tenant.is_none());
    }
}
