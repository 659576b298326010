//! Store statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for store and synchronizer activity.
///
/// All counters are atomic and can be safely accessed from multiple threads.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Number of put operations.
    puts: AtomicU64,
    /// Number of deletes that removed an entry.
    deletes: AtomicU64,
    /// Number of full scans.
    scans: AtomicU64,
    /// Number of items seeded by the initial listing.
    bootstrap_items: AtomicU64,
    /// Number of change-feed events applied.
    events_applied: AtomicU64,
    /// Number of change-feed events discarded.
    events_discarded: AtomicU64,
}

impl StoreStats {
    /// Create new store statistics.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_bootstrap(&self, count: u64) {
        self.bootstrap_items.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_discarded(&self) {
        self.events_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total put operations.
    #[inline]
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Get total deletes that removed an entry.
    #[inline]
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Get total full scans.
    #[inline]
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Get the number of items seeded by the initial listing.
    #[inline]
    pub fn bootstrap_items(&self) -> u64 {
        self.bootstrap_items.load(Ordering::Relaxed)
    }

    /// Get total change-feed events applied.
    #[inline]
    pub fn events_applied(&self) -> u64 {
        self.events_applied.load(Ordering::Relaxed)
    }

    /// Get total change-feed events discarded.
    #[inline]
    pub fn events_discarded(&self) -> u64 {
        self.events_discarded.load(Ordering::Relaxed)
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.puts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.scans.store(0, Ordering::Relaxed);
        self.bootstrap_items.store(0, Ordering::Relaxed);
        self.events_applied.store(0, Ordering::Relaxed);
        self.events_discarded.store(0, Ordering::Relaxed);
    }
}
