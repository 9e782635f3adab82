// ── Sites, locations, racks, tenants ──
//
// Child counts are whatever the store reports at fetch time. Cleanup
// decisions always re-fetch before trusting them.

use serde::{Deserialize, Serialize};

use super::object_id::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    pub device_count: u32,
}

impl Site {
    pub fn is_empty(&self) -> bool {
        self.device_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    pub site: ObjectId,
    pub rack_count: u32,
    pub device_count: u32,
}

impl Location {
    /// A location is only disposable once it holds neither racks nor devices.
    pub fn is_empty(&self) -> bool {
        self.device_count == 0 && self.rack_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    pub id: ObjectId,
    pub name: String,
    pub site: ObjectId,
    pub location: Option<ObjectId>,
    pub device_count: u32,
}

impl Rack {
    pub fn is_empty(&self) -> bool {
        self.device_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
}
