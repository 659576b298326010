//! # nebucloud-informer
//!
//! In-memory informer caches for namespaced resource collections.
//!
//! A cache lists one namespace from a resource provider, then keeps itself
//! current from the provider's change feed on a background task. Any number of
//! readers can take ordered snapshots without touching the network.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nebucloud_informer::prelude::*;
//!
//! // Any ResourceProvider works; MemoryProvider is in-process
//! let provider = MemoryProvider::new("jx").with_items(activities);
//!
//! let cache = NamespaceCache::builder(provider)
//!     .namespace("jx")
//!     .resync_interval(Duration::from_secs(600))
//!     .start()
//!     .await?;
//!
//! let activities = cache.list();
//! cache.stop();
//! ```
//!
//! ## Architecture
//!
//! This library is organized into several crates:
//!
//! - `informer-core` - Identity, events, provider contract, error handling
//! - `informer-cache` - Snapshot store, synchronizer, cache facade
//!
//! This crate (`nebucloud-informer`) re-exports all public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **Reads never fail** - They return the best known snapshot
//! 2. **No locks held across await points** - DashMap guards are short-lived
//! 3. **Malformed events are values** - Tagged payloads, never failed casts
//! 4. **Observable** - Structured `tracing` events and store statistics

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use informer_cache as cache;
pub use informer_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use nebucloud_informer::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use informer_core::{
        CachedResource, EventKind, EventPayload, Identity, InformerError, InformerResult,
        Namespace, ResourceProvider, Subscription, WatchEvent,
    };

    // Cache types
    pub use informer_cache::{
        CacheConfig, MemoryProvider, NamespaceCache, NamespaceCacheBuilder, SnapshotStore,
        StopSignal, StoreStats, SyncState,
    };
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("nebucloud-informer {} (MSRV {})", VERSION, MSRV)
    }
}
