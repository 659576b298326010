//! # informer-core
//!
//! Core types, traits, and error handling for namespaced informer caches.
//!
//! This crate provides the foundational types used across the other crates:
//!
//! - [`InformerError`] - Error type for provider and startup failures
//! - [`Identity`] / [`Namespace`] - Item keys and namespace names
//! - [`CachedResource`] - Trait for item types held in a cache
//! - [`WatchEvent`] - Tagged change-feed events
//! - [`ResourceProvider`] / [`Subscription`] - The list/subscribe contract
//!
//! ## Example
//!
//! ```rust
//! use informer_core::{EventKind, Identity, Namespace, WatchEvent};
//!
//! let namespace = Namespace::new("jx");
//! let event = WatchEvent::updated(Identity::new("build-1"));
//!
//! assert!(!namespace.is_empty());
//! assert_eq!(event.kind, EventKind::Updated);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod event;
mod identity;
mod provider;
mod resource;

pub use error::{BoxError, InformerError};
pub use event::{EventKind, EventPayload, WatchEvent};
pub use identity::{Identity, Namespace};
pub use provider::{EventStream, ResourceProvider, Subscription, SubscriptionId};
pub use resource::CachedResource;

/// Result type alias using [`InformerError`].
pub type Result<T> = std::result::Result<T, InformerError>;

/// Alias for Result, matching the naming used across the workspace.
pub type InformerResult<T> = Result<T>;
