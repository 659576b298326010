//! In-process resource provider.
//!
//! [`MemoryProvider`] is an authoritative store for a single namespace that
//! implements [`ResourceProvider`]. Mutations are broadcast to every open
//! subscription as change-feed events. It backs the tests and demos and can
//! stand in for a remote store wherever one is not available.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use fnv::FnvBuildHasher;
use informer_core::{
    CachedResource, EventKind, Identity, InformerError, Namespace, ResourceProvider, Result,
    Subscription, SubscriptionId, WatchEvent,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace, warn};

/// Default per-subscription channel buffer.
const DEFAULT_BUFFER_SIZE: usize = 1024;

type Senders<T> = HashMap<SubscriptionId, mpsc::Sender<WatchEvent<T>>>;

/// State shared with subscriptions and resync tasks.
struct Shared<T> {
    items: DashMap<Identity, T, FnvBuildHasher>,
    senders: Mutex<Senders<T>>,
}

impl<T> Shared<T> {
    fn senders(&self) -> MutexGuard<'_, Senders<T>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An in-memory, single-namespace resource provider.
///
/// # Example
///
/// ```rust
/// use informer_cache::MemoryProvider;
/// use informer_core::{CachedResource, Identity};
///
/// #[derive(Debug, Clone)]
/// struct Job(String);
///
/// impl CachedResource for Job {
///     fn identity(&self) -> Identity {
///         Identity::new(&self.0)
///     }
/// }
///
/// let provider = MemoryProvider::new("jx");
/// provider.add(Job("release".to_string()));
/// assert_eq!(provider.len(), 1);
/// ```
pub struct MemoryProvider<T> {
    namespace: Namespace,
    shared: Arc<Shared<T>>,
    buffer_size: usize,
    fail_list: AtomicBool,
    fail_subscribe: AtomicBool,
    list_calls: AtomicU64,
}

impl<T: CachedResource + Clone> MemoryProvider<T> {
    /// Create an empty provider serving `namespace`.
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self::with_buffer_size(namespace, DEFAULT_BUFFER_SIZE)
    }

    /// Create an empty provider with a custom per-subscription buffer size.
    ///
    /// Events sent to a subscription whose buffer is full are dropped.
    pub fn with_buffer_size(namespace: impl Into<Namespace>, buffer_size: usize) -> Self {
        Self {
            namespace: namespace.into(),
            shared: Arc::new(Shared {
                items: DashMap::default(),
                senders: Mutex::new(HashMap::new()),
            }),
            buffer_size: buffer_size.max(1),
            fail_list: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            list_calls: AtomicU64::new(0),
        }
    }

    /// Seed items without emitting events.
    pub fn with_items(self, items: impl IntoIterator<Item = T>) -> Self {
        for item in items {
            self.shared.items.insert(item.identity(), item);
        }
        self
    }

    /// Get the namespace this provider serves.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Create an item and emit `Added`.
    pub fn add(&self, item: T) {
        self.shared.items.insert(item.identity(), item.clone());
        self.broadcast(WatchEvent::added(item));
    }

    /// Replace an item and emit `Updated`.
    pub fn update(&self, item: T) {
        self.shared.items.insert(item.identity(), item.clone());
        self.broadcast(WatchEvent::updated(item));
    }

    /// Remove an item and emit `Deleted`. Returns `false` if it was absent.
    pub fn delete(&self, id: &str) -> bool {
        match self.shared.items.remove(id) {
            Some((_, item)) => {
                self.broadcast(WatchEvent::deleted(item));
                true
            }
            None => false,
        }
    }

    /// Emit an event whose payload is not of the served kind.
    pub fn send_unrecognized<U: fmt::Debug + ?Sized>(&self, kind: EventKind, value: &U) {
        self.broadcast(WatchEvent::unrecognized(kind, value));
    }

    /// Make subsequent `list` calls fail.
    pub fn set_list_failure(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `subscribe` calls fail.
    pub fn set_subscribe_failure(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// End every open change feed.
    pub fn close_streams(&self) {
        let closed = {
            let mut senders = self.shared.senders();
            let count = senders.len();
            senders.clear();
            count
        };
        debug!(namespace = %self.namespace, count = closed, "closed change feeds");
    }

    /// Get the current state of an item.
    pub fn get(&self, id: &str) -> Option<T> {
        self.shared.items.get(id).map(|r| r.value().clone())
    }

    /// Get the number of stored items.
    pub fn len(&self) -> usize {
        self.shared.items.len()
    }

    /// Check if the provider holds no items.
    pub fn is_empty(&self) -> bool {
        self.shared.items.is_empty()
    }

    /// Get the number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.senders().len()
    }

    /// Get the number of `list` calls served, including failed ones.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Send an event to every subscription.
    ///
    /// Uses `try_send` so mutations never block. Closed subscriptions are
    /// removed automatically.
    fn broadcast(&self, event: WatchEvent<T>) {
        // Clone senders while holding lock briefly
        let senders: Vec<(SubscriptionId, mpsc::Sender<WatchEvent<T>>)> = self
            .shared
            .senders()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        if senders.is_empty() {
            return;
        }

        let mut closed_ids = Vec::new();
        for (id, sender) in &senders {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        subscription = %id,
                        kind = %event.kind,
                        "subscription lagging, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed_ids.push(*id),
            }
        }

        if !closed_ids.is_empty() {
            let mut current = self.shared.senders();
            current.retain(|id, _| !closed_ids.contains(id));
            debug!(count = closed_ids.len(), "removed closed subscriptions");
        }

        trace!(
            kind = %event.kind,
            subscribers = senders.len() - closed_ids.len(),
            "broadcast event"
        );
    }

    fn check_namespace(&self, namespace: &Namespace) -> std::result::Result<(), String> {
        if *namespace == self.namespace {
            Ok(())
        } else {
            Err(format!(
                "namespace {} is not served by this provider (serving {})",
                namespace, self.namespace
            ))
        }
    }
}

/// Periodically re-send every stored item as `Updated`.
///
/// Holds only a weak sender so it never keeps a closed feed alive.
async fn resync_loop<T: CachedResource + Clone>(
    shared: Arc<Shared<T>>,
    sender: mpsc::WeakSender<WatchEvent<T>>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(sender) = sender.upgrade() else {
            return;
        };

        let items: Vec<T> = shared.items.iter().map(|r| r.value().clone()).collect();
        trace!(items = items.len(), "resync");
        for item in items {
            match sender.try_send(WatchEvent::updated(item)) {
                Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
    }
}

#[async_trait]
impl<T: CachedResource + Clone> ResourceProvider<T> for MemoryProvider<T> {
    async fn list(&self, namespace: &Namespace) -> Result<Vec<T>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        self.check_namespace(namespace)
            .map_err(|reason| InformerError::list_failed(namespace.as_str(), reason))?;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(InformerError::list_failed(
                namespace.as_str(),
                "listing unavailable",
            ));
        }

        Ok(self.shared.items.iter().map(|r| r.value().clone()).collect())
    }

    async fn subscribe(
        &self,
        namespace: &Namespace,
        resync_interval: Duration,
    ) -> Result<Subscription<T>> {
        self.check_namespace(namespace)
            .map_err(|reason| InformerError::subscribe_failed(namespace.as_str(), reason))?;
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(InformerError::subscribe_failed(
                namespace.as_str(),
                "watch unavailable",
            ));
        }

        let (sender, receiver) = mpsc::channel(self.buffer_size);
        if !resync_interval.is_zero() {
            tokio::spawn(resync_loop(
                Arc::clone(&self.shared),
                sender.downgrade(),
                resync_interval,
            ));
        }

        let shared = Arc::clone(&self.shared);
        let subscription = Subscription::new(namespace.clone(), ReceiverStream::new(receiver));
        let id = subscription.id();
        self.shared.senders().insert(id, sender);
        debug!(subscription = %id, namespace = %namespace, "opened change feed");

        Ok(subscription.on_release(move || {
            shared.senders().remove(&id);
        }))
    }
}

impl<T> fmt::Debug for MemoryProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryProvider")
            .field("namespace", &self.namespace)
            .field("items", &self.shared.items.len())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
