// ── Generic in-memory table ──
//
// Concurrent row storage keyed by `ObjectId` with a per-table id sequence,
// mirroring how NetBox numbers each model independently.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::model::ObjectId;

pub(crate) struct Table<T: Clone + Send + Sync + 'static> {
    rows: DashMap<ObjectId, T>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> Table<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate the next id and store the row built from it.
    pub(crate) fn insert_with(&self, build: impl FnOnce(ObjectId) -> T) -> T {
        let id = ObjectId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    pub(crate) fn get(&self, id: ObjectId) -> Option<T> {
        self.rows.get(&id).map(|r| r.value().clone())
    }

    pub(crate) fn contains(&self, id: ObjectId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Mutate a row in place. Returns the updated row, or `None` if absent.
    pub(crate) fn update(&self, id: ObjectId, apply: impl FnOnce(&mut T)) -> Option<T> {
        let mut entry = self.rows.get_mut(&id)?;
        apply(entry.value_mut());
        Some(entry.value().clone())
    }

    pub(crate) fn remove(&self, id: ObjectId) -> Option<T> {
        self.rows.remove(&id).map(|(_, row)| row)
    }

    /// Drop every row matching `pred`.
    pub(crate) fn remove_where(&self, pred: impl Fn(&T) -> bool) {
        self.rows.retain(|_, row| !pred(row));
    }

    /// Rows matching `pred`, in id order.
    pub(crate) fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let mut hits: Vec<(ObjectId, T)> = self
            .rows
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        hits.sort_by_key(|(id, _)| *id);
        hits.into_iter().map(|(_, row)| row).collect()
    }

    /// First row (lowest id) matching `pred`.
    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.filter(pred).into_iter().next()
    }

    pub(crate) fn count(&self, pred: impl Fn(&T) -> bool) -> u32 {
        let n = self.rows.iter().filter(|r| pred(r.value())).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    pub(crate) fn all(&self) -> Vec<T> {
        self.filter(|_| true)
    }
}
