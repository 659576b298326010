//! Resource provider contract and change-feed subscriptions.
//!
//! A [`ResourceProvider`] is the authoritative store the cache mirrors. It
//! supplies a bulk listing and a [`Subscription`] yielding [`WatchEvent`]s
//! until the subscriber unsubscribes.

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::{CachedResource, Namespace, Result, WatchEvent};

/// Boxed stream of change-feed events.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = WatchEvent<T>> + Send>>;

/// Source of truth for a namespaced resource collection.
#[async_trait]
pub trait ResourceProvider<T: CachedResource>: Send + Sync + 'static {
    /// List every item currently in the namespace.
    async fn list(&self, namespace: &Namespace) -> Result<Vec<T>>;

    /// Open a change feed for the namespace.
    ///
    /// A non-zero `resync_interval` asks the provider to periodically re-send
    /// the current state of every item as `Updated` events.
    async fn subscribe(
        &self,
        namespace: &Namespace,
        resync_interval: Duration,
    ) -> Result<Subscription<T>>;
}

#[async_trait]
impl<T, P> ResourceProvider<T> for Arc<P>
where
    T: CachedResource,
    P: ResourceProvider<T> + ?Sized,
{
    async fn list(&self, namespace: &Namespace) -> Result<Vec<T>> {
        (**self).list(namespace).await
    }

    async fn subscribe(
        &self,
        namespace: &Namespace,
        resync_interval: Duration,
    ) -> Result<Subscription<T>> {
        (**self).subscribe(namespace, resync_interval).await
    }
}

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric value of this subscription ID.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// An open change feed.
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription<T> {
    id: SubscriptionId,
    namespace: Namespace,
    stream: Option<EventStream<T>>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Subscription<T> {
    /// Wrap an event stream for the given namespace.
    pub fn new<S>(namespace: Namespace, stream: S) -> Self
    where
        S: Stream<Item = WatchEvent<T>> + Send + 'static,
    {
        Self {
            id: SubscriptionId::next(),
            namespace,
            stream: Some(Box::pin(stream)),
            on_release: None,
        }
    }

    /// Run `release` once when the subscription is released.
    #[must_use]
    pub fn on_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(release));
        self
    }

    /// Get the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Get the namespace being watched.
    #[inline]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Whether the feed is still held open.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the feed has ended or been released.
    pub async fn next(&mut self) -> Option<WatchEvent<T>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    /// Release the underlying feed. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if self.stream.take().is_none() {
            return;
        }
        if let Some(release) = self.on_release.take() {
            release();
        }
        debug!(subscription = %self.id, namespace = %self.namespace, "unsubscribed");
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("active", &self.is_active())
            .finish()
    }
}
