//! Concurrent snapshot store.
//!
//! The store maps [`Identity`] to the latest known item state. It uses
//! `DashMap` for lock-free concurrent access: puts and deletes lock a single
//! shard, and scans take shard read locks one at a time, so a scan may mix
//! states observed at slightly different instants but never a torn entry.

use std::sync::Arc;

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use informer_core::{CachedResource, Identity};
use tracing::trace;

use crate::config::DEFAULT_INITIAL_CAPACITY;
use crate::stats::StoreStats;

/// A concurrent map from item identity to the latest item state.
///
/// Items are held behind `Arc`, so a put replaces the pointer atomically and
/// snapshots returned by [`scan`](Self::scan) are unaffected by later writes.
///
/// ## Important
///
/// No `DashMap` reference is returned to callers or held across an await.
#[derive(Debug)]
pub struct SnapshotStore<T> {
    /// Items keyed by identity.
    items: DashMap<Identity, Arc<T>, FnvBuildHasher>,
    /// Statistics.
    stats: StoreStats,
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotStore<T> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Create a new empty store with a specific initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: DashMap::with_capacity_and_hasher(capacity, FnvBuildHasher::default()),
            stats: StoreStats::new(),
        }
    }

    /// Get store statistics.
    #[inline]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Insert or overwrite the entry for `id`.
    pub fn put(&self, id: Identity, item: Arc<T>) {
        trace!(id = %id, "put");
        self.items.insert(id, item);
        self.stats.record_put();
    }

    /// Remove the entry for `id`. No-op if absent.
    pub fn delete(&self, id: &str) {
        if self.items.remove(id).is_some() {
            self.stats.record_delete();
            trace!(id = %id, "deleted");
        }
    }

    /// Every stored item ordered by identity ascending.
    ///
    /// The returned vector is a copy; later puts and deletes do not affect it.
    pub fn scan(&self) -> Vec<Arc<T>> {
        // Clone out of the shard guards before sorting so no lock outlives
        // the iteration.
        let mut entries: Vec<(Identity, Arc<T>)> = self
            .items
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        self.stats.record_scan();

        entries.into_iter().map(|(_, item)| item).collect()
    }

    /// Get the current state of one item.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Check if an item is present.
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Get the number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: CachedResource> SnapshotStore<T> {
    /// Store an item under its own identity.
    pub fn insert(&self, item: T) {
        self.put(item.identity(), Arc::new(item));
    }
}
