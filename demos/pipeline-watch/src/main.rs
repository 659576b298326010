//! Pipeline Watch Demo
//!
//! This demo shows a namespace cache of pipeline activities that:
//! - Bootstraps from an in-memory provider
//! - Follows simulated build progress through the change feed
//! - Prints the ordered snapshot a dashboard would render
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p pipeline-watch
//! ```

use std::sync::Arc;
use std::time::Duration;

use nebucloud_informer::prelude::*;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// A build pipeline run.
#[derive(Debug, Clone)]
struct PipelineActivity {
    name: String,
    status: &'static str,
}

impl CachedResource for PipelineActivity {
    fn identity(&self) -> Identity {
        Identity::new(&self.name)
    }

    fn kind() -> &'static str {
        "PipelineActivity"
    }
}

fn activity(name: impl Into<String>, status: &'static str) -> PipelineActivity {
    PipelineActivity {
        name: name.into(),
        status,
    }
}

/// Move builds through their lifecycle.
async fn simulate_builds(provider: Arc<MemoryProvider<PipelineActivity>>) {
    let mut interval = tokio::time::interval(Duration::from_secs(2));
    let mut build = 3_u32;

    loop {
        interval.tick().await;
        build += 1;

        let name = format!("jx-demo/master #{build}");
        provider.add(activity(name.as_str(), "pending"));
        provider.update(activity(name.as_str(), "running"));

        let finished = format!("jx-demo/master #{}", build - 1);
        let status = if build % 4 == 0 { "failed" } else { "succeeded" };
        provider.update(activity(finished, status));

        // Keep a rolling window of recent builds
        if build > 6 {
            provider.delete(&format!("jx-demo/master #{}", build - 6));
        }
    }
}

fn print_snapshot(cache: &NamespaceCache<PipelineActivity>) {
    info!(namespace = %cache.namespace(), items = cache.len(), state = %cache.state(), "snapshot");
    for activity in cache.list() {
        info!("  {:<28} {}", activity.name, activity.status);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pipeline watch demo");
    info!("{}", nebucloud_informer::version::version_string());

    let provider = Arc::new(MemoryProvider::new("jx").with_items([
        activity("jx-demo/master #1", "succeeded"),
        activity("jx-demo/master #2", "succeeded"),
        activity("jx-demo/master #3", "running"),
    ]));

    let cache = NamespaceCache::builder(Arc::clone(&provider))
        .namespace("jx")
        .resync_interval(Duration::from_secs(30))
        .start()
        .await?;
    print_snapshot(&cache);

    tokio::spawn(simulate_builds(Arc::clone(&provider)));

    info!("Press Ctrl+C to shutdown");
    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = ticker.tick() => print_snapshot(&cache),
            _ = signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    cache.stop();
    cache.stopped().await;

    let stats = cache.stats();
    info!(
        applied = stats.events_applied(),
        discarded = stats.events_discarded(),
        scans = stats.scans(),
        "final snapshot"
    );
    print_snapshot(&cache);

    Ok(())
}
