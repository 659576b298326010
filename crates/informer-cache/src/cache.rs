//! The namespace cache facade.
//!
//! [`NamespaceCache`] owns a [`SnapshotStore`] and the background
//! [`Synchronizer`] feeding it. Reads go straight to the store and never wait
//! on the synchronizer or the provider.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use informer_core::{CachedResource, InformerError, Namespace, ResourceProvider, Result};
use tokio::sync::watch;
use tracing::info;

use crate::config::CacheConfig;
use crate::shutdown::StopSignal;
use crate::stats::StoreStats;
use crate::store::SnapshotStore;
use crate::synchronizer::{SyncState, Synchronizer};

/// A read-optimized cache of every item in one namespace.
///
/// Construction lists the namespace into the store before returning, then
/// keeps the store in sync from the provider's change feed until
/// [`stop`](Self::stop) is called or the cache is dropped.
///
/// ## Thread Safety
///
/// All read operations may be called from any number of threads at once.
/// A [`list`](Self::list) is consistent per entry, not across entries.
#[derive(Debug)]
pub struct NamespaceCache<T> {
    namespace: Namespace,
    store: Arc<SnapshotStore<T>>,
    stop: StopSignal,
    state: watch::Receiver<SyncState>,
}

impl<T: CachedResource> NamespaceCache<T> {
    /// Create a builder for a cache backed by `provider`.
    pub fn builder<P: ResourceProvider<T>>(provider: P) -> NamespaceCacheBuilder<T, P> {
        NamespaceCacheBuilder::new(provider)
    }

    /// Start a cache for `namespace` with the default configuration.
    pub async fn start<P: ResourceProvider<T>>(
        provider: P,
        namespace: impl Into<Namespace>,
    ) -> Result<Self> {
        Self::builder(provider).namespace(namespace).start().await
    }

    /// Every cached item, ordered by identity.
    ///
    /// Never fails; returns the best snapshot currently known, which may be
    /// empty or stale.
    pub fn list(&self) -> Vec<Arc<T>> {
        self.store.scan()
    }

    /// Get the current state of one item.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.store.get(id)
    }

    /// Check if an item is cached.
    pub fn contains(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Stop consuming the change feed.
    ///
    /// Returns immediately without waiting for the synchronizer to exit.
    /// Safe to call more than once; cached items remain readable.
    pub fn stop(&self) {
        if self.stop.stop() {
            info!(namespace = %self.namespace, "namespace cache stopping");
        }
    }
}

impl<T> NamespaceCache<T> {
    /// Get the namespace this cache covers.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Get the synchronizer lifecycle state.
    ///
    /// Reports `Stopped` as soon as a stop has been requested.
    pub fn state(&self) -> SyncState {
        if self.stop.is_stopped() {
            SyncState::Stopped
        } else {
            *self.state.borrow()
        }
    }

    /// Check if stop has been requested or the synchronizer has exited.
    pub fn is_stopped(&self) -> bool {
        self.state() == SyncState::Stopped
    }

    /// Wait until the background synchronizer has exited.
    ///
    /// This does not request a stop; pair it with [`stop`](Self::stop).
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        // An error means the task is gone, which is what we are waiting for
        let _ = state.wait_for(|s| *s == SyncState::Stopped).await;
    }

    /// Get the number of cached items.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the cache holds no items.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get store statistics.
    pub fn stats(&self) -> &StoreStats {
        self.store.stats()
    }
}

/// Builder for a [`NamespaceCache`].
#[derive(Debug)]
pub struct NamespaceCacheBuilder<T, P> {
    provider: P,
    namespace: Option<Namespace>,
    config: CacheConfig,
    _item: PhantomData<fn() -> T>,
}

impl<T, P> NamespaceCacheBuilder<T, P>
where
    T: CachedResource,
    P: ResourceProvider<T>,
{
    /// Create a new cache builder.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            namespace: None,
            config: CacheConfig::default(),
            _item: PhantomData,
        }
    }

    /// Set the namespace to cache.
    pub fn namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the provider resync interval. `Duration::ZERO` disables resync.
    pub fn resync_interval(mut self, interval: Duration) -> Self {
        self.config.resync_interval = interval;
        self
    }

    /// Set the initial store capacity.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Open the change feed, bootstrap the store and launch the synchronizer.
    ///
    /// The feed is open before the listing runs and before this returns, so
    /// no change made after the listing is missed. Fails only on invalid
    /// configuration; an unavailable listing yields an empty cache that the
    /// change feed fills in. Must be called from within a tokio runtime.
    pub async fn start(self) -> Result<NamespaceCache<T>> {
        let namespace = match self.namespace {
            Some(namespace) if !namespace.is_empty() => namespace,
            _ => {
                return Err(InformerError::Configuration(
                    "namespace cannot be empty".to_string(),
                ))
            }
        };

        let store = Arc::new(SnapshotStore::with_capacity(self.config.initial_capacity));
        let synchronizer = Synchronizer::new(
            self.provider,
            namespace.clone(),
            Arc::clone(&store),
            self.config.resync_interval,
        );
        let state = synchronizer.state_receiver();

        let subscribed = synchronizer.subscribe().await;
        let seeded = synchronizer.bootstrap().await;

        let stop = StopSignal::new();
        match subscribed {
            // Detached; the task exits when the stop signal fires or is dropped
            Ok(subscription) => drop(synchronizer.spawn(subscription, stop.listener())),
            Err(err) => synchronizer.fail(&err),
        }

        info!(
            namespace = %namespace,
            kind = T::kind(),
            items = seeded,
            resync = ?self.config.resync_interval,
            "namespace cache started"
        );

        Ok(NamespaceCache {
            namespace,
            store,
            stop,
            state,
        })
    }
}
