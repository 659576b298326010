//! Error types for informer operations.
//!
//! This module provides [`InformerError`], the error type shared by resource
//! providers and the cache. None of these errors reach readers of the cache:
//! reads always return the best snapshot currently known.

/// Boxed error source carried by provider failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for informer operations.
///
/// Providers return it from `list` and `subscribe`; the cache returns it only
/// from configuration and startup paths.
///
/// # Example
///
/// ```rust
/// use informer_core::{InformerError, Namespace};
///
/// fn check(namespace: &Namespace) -> Result<(), InformerError> {
///     if namespace.is_empty() {
///         return Err(InformerError::Configuration(
///             "namespace cannot be empty".to_string(),
///         ));
///     }
///     Ok(())
/// }
///
/// assert!(check(&Namespace::new("jx")).is_ok());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum InformerError {
    /// The initial bulk listing failed.
    #[error("failed to list resources in namespace {namespace}")]
    ListFailed {
        /// The namespace being listed.
        namespace: String,
        /// Underlying provider error.
        #[source]
        source: BoxError,
    },

    /// The provider could not open a change feed.
    #[error("failed to subscribe to namespace {namespace}")]
    SubscribeFailed {
        /// The namespace being watched.
        namespace: String,
        /// Underlying provider error.
        #[source]
        source: BoxError,
    },

    /// The change feed ended.
    #[error("stream closed: {reason}")]
    StreamClosed {
        /// Reason for stream closure.
        reason: String,
    },

    /// An event carried something other than the cached resource kind.
    #[error("unrecognized payload of type {type_name}: {detail}")]
    UnrecognizedPayload {
        /// Name of the type that was delivered.
        type_name: String,
        /// Debug rendering of the delivered value.
        detail: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl InformerError {
    /// Create a listing error from any error type.
    pub fn list_failed<E>(namespace: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::ListFailed {
            namespace: namespace.into(),
            source: source.into(),
        }
    }

    /// Create a subscription error from any error type.
    pub fn subscribe_failed<E>(namespace: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::SubscribeFailed {
            namespace: namespace.into(),
            source: source.into(),
        }
    }
}
