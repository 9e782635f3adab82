//! Reconciliation engine between observed server hardware and NetBox.
//!
//! This crate owns the decision logic of the workspace:
//!
//! - **[`Reconciler`]**: Runs one pass for one physical unit: resolves
//!   placement intents into sites, locations and racks, finds or creates the
//!   device records (standalone server, or chassis + blade + expansion),
//!   computes drift and commits it as a single batched update, then cleans
//!   up parents left empty by a move.
//!
//! - **[`RemoteStore`]**: The seam to the inventory. [`NetboxStore`] talks
//!   to a live NetBox through `rackstate-api`; [`MemoryStore`] keeps every
//!   table in process and is what the reconciliation tests run against.
//!
//! - **[`PhysicalUnitFacts`]**: What the reconciler needs to know about the
//!   hardware. [`StaticFacts`] is the file-backed implementation the CLI uses.
//!
//! - **[`DriverRegistry`]**: Lookup table of [`Resolver`]s that turn
//!   `"<driver>:<value>"` configuration into tenant/site/rack/... strings.

pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod facts;
pub mod model;
pub mod naming;
pub mod reconcile;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DeviceRoles, ReconcileConfig, StoreConfig, TlsVerification};
pub use driver::{DriverRegistry, DriverSpec, PlacementDrivers, PlacementIntents, Resolver};
pub use error::CoreError;
pub use facts::{ChassisFacts, ExpansionFacts, FormFactor, PhysicalUnitFacts, StaticFacts};
pub use reconcile::{Action, ReconcileReport, Reconciler};
pub use store::{MemoryStore, NetboxStore, RemoteStore};

pub use model::{
    BayRef, Device, DeviceBay, DeviceChanges, DeviceRole, DeviceType, EntityKind, Face, Location,
    Manufacturer, NewDevice, NewDeviceType, ObjectId, Platform, Rack, Site, Tag, Tenant,
};
