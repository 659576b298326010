//! Cache configuration.

use std::time::Duration;

/// Default provider resync interval.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default initial store capacity.
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

/// Configuration for a namespace cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How often the provider should re-send the full state of every item.
    /// `Duration::ZERO` disables resync.
    pub resync_interval: Duration,
    /// Initial capacity of the snapshot store.
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}
