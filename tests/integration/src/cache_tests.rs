//! Cache integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use integration_tests::{activity, snapshot, wait_for, PipelineActivity};
use nebucloud_informer::prelude::*;

async fn start(
    provider: &Arc<MemoryProvider<PipelineActivity>>,
) -> NamespaceCache<PipelineActivity> {
    NamespaceCache::builder(Arc::clone(provider))
        .namespace("jx")
        .resync_interval(Duration::ZERO)
        .start()
        .await
        .expect("cache should start")
}

#[tokio::test]
async fn bootstrap_without_events() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([
        activity("C", "running"),
        activity("A", "running"),
        activity("B", "running"),
    ]));
    let cache = start(&provider).await;

    let names: Vec<_> = snapshot(&cache).into_iter().map(|a| a.name).collect();
    assert_eq!(names, ["A", "B", "C"]);
    assert_eq!(cache.stats().bootstrap_items(), 3);
    assert_eq!(provider.list_calls(), 1);
}

#[tokio::test]
async fn build_status_scenario() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("build-1", "running")]));
    let cache = start(&provider).await;

    provider.update(activity("build-1", "success"));
    provider.add(activity("build-2", "pending"));

    wait_for(&cache, |items| items.len() == 2).await;
    assert_eq!(
        snapshot(&cache),
        vec![activity("build-1", "success"), activity("build-2", "pending")]
    );
}

#[tokio::test]
async fn changes_right_after_start_are_not_lost() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("build-1", "running")]));
    let cache = start(&provider).await;

    // No wait for the synchronizer task before changing the provider
    provider.update(activity("build-1", "success"));
    provider.add(activity("build-2", "pending"));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        snapshot(&cache),
        vec![activity("build-1", "success"), activity("build-2", "pending")]
    );
    cache.stop();
}

#[tokio::test]
async fn events_queued_before_stop_are_dropped() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("a", "running")]));
    let cache = start(&provider).await;

    provider.update(activity("a", "success"));
    provider.add(activity("b", "pending"));
    provider.delete("a");
    cache.stop();
    tokio::task::yield_now().await;
    cache.stopped().await;

    assert_eq!(snapshot(&cache), vec![activity("a", "running")]);
    assert_eq!(cache.stats().events_applied(), 0);
    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test]
async fn add_update_delete_removes_identity() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("other", "success")]));
    let cache = start(&provider).await;

    provider.add(activity("K", "v1"));
    provider.update(activity("K", "v2"));
    provider.delete("K");
    provider.add(activity("marker", "done"));

    wait_for(&cache, |items| items.iter().any(|a| a.name == "marker")).await;
    assert!(!cache.contains("K"));
    assert_eq!(
        snapshot(&cache),
        vec![activity("marker", "done"), activity("other", "success")]
    );
}

#[tokio::test]
async fn duplicate_added_is_idempotent() {
    let provider = Arc::new(MemoryProvider::new("jx"));
    let cache = start(&provider).await;

    provider.add(activity("K", "v1"));
    provider.add(activity("K", "v1"));
    provider.add(activity("marker", "done"));

    wait_for(&cache, |items| items.len() == 2).await;
    assert_eq!(cache.get("K").as_deref(), Some(&activity("K", "v1")));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn malformed_events_interleaved_with_valid() {
    let provider = Arc::new(MemoryProvider::new("jx"));
    let cache = start(&provider).await;

    provider.add(activity("a", "pending"));
    provider.send_unrecognized(EventKind::Added, &"a pod, not an activity");
    provider.update(activity("a", "running"));
    provider.send_unrecognized(EventKind::Deleted, &42_u32);
    provider.add(activity("b", "pending"));

    wait_for(&cache, |items| items.len() == 2).await;
    assert_eq!(
        snapshot(&cache),
        vec![activity("a", "running"), activity("b", "pending")]
    );
    assert_eq!(cache.stats().events_discarded(), 2);

    // Still consuming after the malformed events
    provider.delete("a");
    wait_for(&cache, |items| items.len() == 1).await;
    assert_eq!(cache.state(), SyncState::Subscribing);
}

#[tokio::test]
async fn no_mutation_after_stop() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("a", "running")]));
    let cache = start(&provider).await;

    cache.stop();
    let before = snapshot(&cache);

    provider.add(activity("b", "pending"));
    provider.update(activity("a", "success"));
    provider.delete("a");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(snapshot(&cache), before);
    assert_eq!(snapshot(&cache), vec![activity("a", "running")]);

    cache.stop();
    cache.stopped().await;
    assert!(cache.is_stopped());
    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test]
async fn listing_failure_degrades_to_live_feed() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("a", "running")]));
    provider.set_list_failure(true);
    let cache = start(&provider).await;

    assert!(cache.is_empty());
    assert_eq!(cache.state(), SyncState::Subscribing);

    provider.update(activity("a", "success"));
    wait_for(&cache, |items| items.len() == 1).await;
    assert_eq!(snapshot(&cache), vec![activity("a", "success")]);
}

#[tokio::test]
async fn resync_heals_empty_bootstrap() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([
        activity("a", "running"),
        activity("b", "success"),
    ]));
    provider.set_list_failure(true);

    let cache = NamespaceCache::builder(Arc::clone(&provider))
        .namespace("jx")
        .resync_interval(Duration::from_millis(20))
        .start()
        .await
        .expect("cache should start");
    assert!(cache.is_empty());

    wait_for(&cache, |items| items.len() == 2).await;
    assert_eq!(
        snapshot(&cache),
        vec![activity("a", "running"), activity("b", "success")]
    );
    cache.stop();
}

#[tokio::test]
async fn subscribe_failure_keeps_bootstrap_snapshot() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("a", "running")]));
    provider.set_subscribe_failure(true);

    let cache = NamespaceCache::start(Arc::clone(&provider), "jx")
        .await
        .expect("cache should start");
    tokio::time::timeout(Duration::from_secs(2), cache.stopped())
        .await
        .expect("synchronizer should exit");

    assert!(cache.is_stopped());
    assert_eq!(snapshot(&cache), vec![activity("a", "running")]);
}

#[tokio::test]
async fn closed_feed_ends_synchronizer() {
    let provider = Arc::new(MemoryProvider::new("jx").with_items([activity("a", "running")]));
    let cache = start(&provider).await;

    provider.close_streams();
    tokio::time::timeout(Duration::from_secs(2), cache.stopped())
        .await
        .expect("synchronizer should exit");

    assert_eq!(cache.state(), SyncState::Stopped);
    assert_eq!(snapshot(&cache), vec![activity("a", "running")]);
}

#[tokio::test]
async fn wrong_namespace_yields_empty_stopped_cache() {
    let provider = Arc::new(MemoryProvider::<PipelineActivity>::new("jx"));
    let cache = NamespaceCache::start(Arc::clone(&provider), "jx-staging")
        .await
        .expect("cache should start");

    tokio::time::timeout(Duration::from_secs(2), cache.stopped())
        .await
        .expect("synchronizer should exit");
    assert!(cache.is_empty());
    assert_eq!(cache.namespace().as_str(), "jx-staging");
}

/// Provider with a fixed listing and a fixed, finite change feed.
struct ScriptedProvider {
    listing: Vec<PipelineActivity>,
    events: Vec<WatchEvent<PipelineActivity>>,
}

#[async_trait]
impl ResourceProvider<PipelineActivity> for ScriptedProvider {
    async fn list(&self, _namespace: &Namespace) -> InformerResult<Vec<PipelineActivity>> {
        Ok(self.listing.clone())
    }

    async fn subscribe(
        &self,
        namespace: &Namespace,
        _resync_interval: Duration,
    ) -> InformerResult<Subscription<PipelineActivity>> {
        Ok(Subscription::new(
            namespace.clone(),
            futures::stream::iter(self.events.clone()),
        ))
    }
}

#[tokio::test]
async fn events_apply_in_delivery_order_after_bootstrap() {
    let provider = ScriptedProvider {
        listing: vec![activity("a", "running"), activity("b", "running")],
        events: vec![
            WatchEvent::updated(activity("a", "success")),
            WatchEvent::deleted(activity("b", "running")),
            WatchEvent::added(activity("b", "pending")),
            WatchEvent::updated(activity("c", "running")),
            // Provider-side reordering is not detected
            WatchEvent::updated(activity("a", "running")),
        ],
    };

    let cache = NamespaceCache::start(provider, "jx").await.expect("cache should start");
    tokio::time::timeout(Duration::from_secs(2), cache.stopped())
        .await
        .expect("finite feed should end");

    assert_eq!(
        snapshot(&cache),
        vec![
            activity("a", "running"),
            activity("b", "pending"),
            activity("c", "running"),
        ]
    );
    assert_eq!(cache.stats().events_applied(), 5);
}

#[tokio::test]
async fn empty_namespace_rejected() {
    let provider = MemoryProvider::<PipelineActivity>::new("jx");
    let result = NamespaceCache::<PipelineActivity>::builder(provider)
        .namespace("")
        .start()
        .await;
    assert!(matches!(result, Err(InformerError::Configuration(_))));
}
