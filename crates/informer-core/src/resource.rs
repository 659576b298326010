//! The [`CachedResource`] trait implemented by cached item types.

use std::fmt;

use crate::Identity;

/// An item that can be held in a namespace cache.
///
/// The cache makes no structural assumptions beyond a stable identity that is
/// unique within the namespace.
///
/// # Example
///
/// ```rust
/// use informer_core::{CachedResource, Identity};
///
/// #[derive(Debug, Clone)]
/// struct PipelineActivity {
///     name: String,
///     status: String,
/// }
///
/// impl CachedResource for PipelineActivity {
///     fn identity(&self) -> Identity {
///         Identity::new(&self.name)
///     }
///
///     fn kind() -> &'static str {
///         "PipelineActivity"
///     }
/// }
///
/// let activity = PipelineActivity {
///     name: "build-1".to_string(),
///     status: "running".to_string(),
/// };
/// assert_eq!(activity.identity().as_str(), "build-1");
/// ```
pub trait CachedResource: Send + Sync + fmt::Debug + 'static {
    /// The key this item is stored under.
    fn identity(&self) -> Identity;

    /// Human-readable kind name, used in log fields.
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}
