//! # informer-cache
//!
//! Read-optimized namespace cache kept in sync with a list/watch change feed.
//!
//! This crate provides the caching layer:
//!
//! - [`NamespaceCache`] - Facade: bootstrap, background sync, snapshot reads
//! - [`SnapshotStore`] - DashMap-based concurrent identity → item map
//! - [`Synchronizer`] - Bulk listing followed by change-feed consumption
//! - [`StopSignal`] - One-way stop flag for the background task
//! - [`MemoryProvider`] - In-process provider for tests and demos
//!
//! ## Key Design Decisions
//!
//! - Uses `DashMap` for lock-free concurrent access
//! - Items are stored behind `Arc`, so scans copy pointers, not items
//! - No `DashMap` reference is held across an `.await`
//! - The change feed is opened before the bootstrap listing and consumed after it
//! - Listing failures degrade to an empty cache instead of failing startup
//!
//! ## Example
//!
//! ```rust,ignore
//! use informer_cache::{MemoryProvider, NamespaceCache};
//!
//! let provider = MemoryProvider::new("jx").with_items(activities);
//! let cache = NamespaceCache::start(provider, "jx").await?;
//!
//! for activity in cache.list() {
//!     println!("{activity:?}");
//! }
//!
//! cache.stop();
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod memory;
mod shutdown;
mod stats;
mod store;
mod synchronizer;

pub use cache::{NamespaceCache, NamespaceCacheBuilder};
pub use config::{CacheConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_RESYNC_INTERVAL};
pub use memory::MemoryProvider;
pub use shutdown::{StopListener, StopSignal};
pub use stats::StoreStats;
pub use store::SnapshotStore;
pub use synchronizer::{SyncState, Synchronizer};
