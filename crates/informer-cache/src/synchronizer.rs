//! Bootstrap and change-feed consumption.
//!
//! The [`Synchronizer`] seeds a [`SnapshotStore`] from a bulk listing and then
//! forwards change-feed events into it until stopped:
//!
//! ```text
//! Created -> Bootstrapping -> Subscribing -> Stopped
//! ```
//!
//! The change feed is opened before the listing runs, so anything the
//! provider emits while bootstrap is in flight waits in the subscription and
//! is applied once the store is seeded. Bootstrap failures are logged and do
//! not block the subscription. Events are applied one at a time in delivery
//! order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use informer_core::{
    CachedResource, EventKind, InformerError, Namespace, ResourceProvider, Result, Subscription,
    WatchEvent,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::shutdown::StopListener;
use crate::store::SnapshotStore;

/// Lifecycle state of a synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Constructed, nothing fetched yet.
    Created,
    /// Running the initial listing.
    Bootstrapping,
    /// Consuming the change feed.
    Subscribing,
    /// No longer applying events.
    Stopped,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Bootstrapping => "bootstrapping",
            Self::Subscribing => "subscribing",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Bridges a [`ResourceProvider`] into a [`SnapshotStore`].
pub struct Synchronizer<T, P> {
    provider: P,
    namespace: Namespace,
    store: Arc<SnapshotStore<T>>,
    resync_interval: Duration,
    state: watch::Sender<SyncState>,
}

impl<T, P> Synchronizer<T, P>
where
    T: CachedResource,
    P: ResourceProvider<T>,
{
    /// Create a synchronizer for `namespace` writing into `store`.
    pub fn new(
        provider: P,
        namespace: Namespace,
        store: Arc<SnapshotStore<T>>,
        resync_interval: Duration,
    ) -> Self {
        let (state, _rx) = watch::channel(SyncState::Created);
        Self {
            provider,
            namespace,
            store,
            resync_interval,
            state,
        }
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Observe lifecycle transitions.
    pub fn state_receiver(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Get the store this synchronizer writes into.
    pub fn store(&self) -> &Arc<SnapshotStore<T>> {
        &self.store
    }

    /// Open the change feed.
    ///
    /// Call this before [`bootstrap`](Self::bootstrap): events emitted while
    /// the listing is in flight are buffered in the returned subscription
    /// rather than lost.
    pub async fn subscribe(&self) -> Result<Subscription<T>> {
        self.transition(SyncState::Bootstrapping);
        let subscription = self
            .provider
            .subscribe(&self.namespace, self.resync_interval)
            .await?;
        info!(
            namespace = %self.namespace,
            subscription = %subscription.id(),
            resync = ?self.resync_interval,
            "subscribed to change feed"
        );
        Ok(subscription)
    }

    /// Seed the store from a bulk listing.
    ///
    /// Returns the number of items stored. A failed listing leaves the store
    /// untouched and returns zero; the change feed is expected to fill it in.
    pub async fn bootstrap(&self) -> usize {
        self.transition(SyncState::Bootstrapping);

        match self.provider.list(&self.namespace).await {
            Ok(items) => {
                let count = items.len();
                for item in items {
                    self.store.insert(item);
                }
                self.store.stats().record_bootstrap(count as u64);
                info!(
                    namespace = %self.namespace,
                    kind = T::kind(),
                    items = count,
                    "bootstrap complete"
                );
                count
            }
            Err(err) => {
                warn!(
                    namespace = %self.namespace,
                    kind = T::kind(),
                    error = %err,
                    "initial listing failed, starting with an empty cache"
                );
                0
            }
        }
    }

    /// Apply a single change-feed event to the store.
    ///
    /// Returns `false` if the event was discarded because its payload is not
    /// of the cached kind.
    pub fn apply(&self, event: WatchEvent<T>) -> bool {
        let (kind, item) = match event.into_item() {
            Ok(parts) => parts,
            Err(err) => {
                warn!(
                    namespace = %self.namespace,
                    error = %err,
                    expected = T::kind(),
                    "discarding event"
                );
                self.store.stats().record_discarded();
                return false;
            }
        };

        let id = item.identity();
        debug!(namespace = %self.namespace, %kind, id = %id, "applying event");
        match kind {
            EventKind::Added | EventKind::Updated => self.store.put(id, Arc::new(item)),
            EventKind::Deleted => self.store.delete(id.as_str()),
        }
        self.store.stats().record_applied();
        true
    }

    /// Consume an open change feed on a background task.
    ///
    /// Moves the state to `Subscribing` before returning. Must be called
    /// from within a tokio runtime.
    pub fn spawn(self, subscription: Subscription<T>, stop: StopListener) -> JoinHandle<()> {
        self.transition(SyncState::Subscribing);
        let span = info_span!("synchronizer", namespace = %self.namespace);
        tokio::spawn(self.run(subscription, stop).instrument(span))
    }

    /// Apply events from `subscription` until stopped or the feed ends.
    ///
    /// Releases the subscription on exit.
    pub async fn run(self, mut subscription: Subscription<T>, mut stop: StopListener) {
        self.transition(SyncState::Subscribing);

        let reason = loop {
            tokio::select! {
                biased;
                _ = stop.wait() => break "stop requested",
                event = subscription.next() => match event {
                    // Buffered events that race a stop are dropped
                    Some(_) if stop.is_stopped() => break "stop requested",
                    Some(event) => {
                        self.apply(event);
                    }
                    None => {
                        let closed = InformerError::StreamClosed {
                            reason: format!("subscription {} ended", subscription.id()),
                        };
                        warn!(error = %closed, "change feed ended, cache will no longer update");
                        break "change feed closed";
                    }
                },
            }
        };

        subscription.unsubscribe();
        self.finish(reason);
    }

    /// Give up after the change feed could not be opened.
    ///
    /// The store keeps whatever bootstrap seeded.
    pub fn fail(&self, err: &InformerError) {
        warn!(namespace = %self.namespace, error = %err, "subscription failed");
        self.finish("subscription failed");
    }

    fn transition(&self, next: SyncState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == SyncState::Stopped || *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(namespace = %self.namespace, state = %next, "synchronizer state changed");
        }
    }

    fn finish(&self, reason: &str) {
        self.state.send_replace(SyncState::Stopped);
        info!(
            namespace = %self.namespace,
            reason,
            items = self.store.len(),
            "synchronizer stopped"
        );
    }
}

impl<T, P> fmt::Debug for Synchronizer<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("namespace", &self.namespace)
            .field("resync_interval", &self.resync_interval)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
