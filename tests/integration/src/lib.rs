//! Shared fixtures for the integration tests.
//!
//! The tests cache `PipelineActivity` resources: one record per build
//! pipeline run, keyed by name.

use std::time::Duration;

use nebucloud_informer::prelude::*;

/// Upper bound for any wait on the background synchronizer.
pub const CONVERGE_TIMEOUT: Duration = Duration::from_secs(2);

/// A build pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineActivity {
    /// Unique name within the namespace.
    pub name: String,
    /// Build status, e.g. `running` or `success`.
    pub status: String,
}

impl CachedResource for PipelineActivity {
    fn identity(&self) -> Identity {
        Identity::new(&self.name)
    }

    fn kind() -> &'static str {
        "PipelineActivity"
    }
}

/// Build an activity.
pub fn activity(name: &str, status: &str) -> PipelineActivity {
    PipelineActivity {
        name: name.to_string(),
        status: status.to_string(),
    }
}

/// Current cache contents as owned values.
pub fn snapshot(cache: &NamespaceCache<PipelineActivity>) -> Vec<PipelineActivity> {
    cache.list().iter().map(|a| (**a).clone()).collect()
}

/// Wait until `check` holds for the cache contents.
///
/// Panics after [`CONVERGE_TIMEOUT`].
pub async fn wait_for(
    cache: &NamespaceCache<PipelineActivity>,
    check: impl Fn(&[PipelineActivity]) -> bool,
) {
    let converged = tokio::time::timeout(CONVERGE_TIMEOUT, async {
        while !check(&snapshot(cache)) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(converged.is_ok(), "cache did not converge: {:?}", snapshot(cache));
}
