//! Change-feed events.
//!
//! A [`WatchEvent`] pairs an [`EventKind`] with an [`EventPayload`]. The
//! payload is tagged so that a provider delivering something other than the
//! cached kind produces a checkable variant instead of a failed cast.

use std::fmt;

use crate::InformerError;

/// What happened to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The item was created, or re-sent by a resync.
    Added,
    /// The item changed, or was re-sent by a resync.
    Updated,
    /// The item was removed.
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Body of a change-feed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload<T> {
    /// An item of the cached kind.
    Item(T),
    /// Something that is not the cached kind.
    Unrecognized {
        /// Type name of the delivered value.
        type_name: String,
        /// Debug rendering of the delivered value.
        detail: String,
    },
}

/// A single `(kind, payload)` notification from a change feed.
///
/// # Example
///
/// ```rust
/// use informer_core::{EventKind, WatchEvent};
///
/// let event = WatchEvent::added("build-1".to_string());
/// assert_eq!(event.kind, EventKind::Added);
///
/// let foreign = WatchEvent::<String>::unrecognized(EventKind::Updated, &42_u32);
/// assert!(foreign.into_item().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent<T> {
    /// What happened.
    pub kind: EventKind,
    /// The item it happened to.
    pub payload: EventPayload<T>,
}

impl<T> WatchEvent<T> {
    /// Create an event carrying an item.
    pub fn new(kind: EventKind, item: T) -> Self {
        Self {
            kind,
            payload: EventPayload::Item(item),
        }
    }

    /// An `Added` event.
    pub fn added(item: T) -> Self {
        Self::new(EventKind::Added, item)
    }

    /// An `Updated` event.
    pub fn updated(item: T) -> Self {
        Self::new(EventKind::Updated, item)
    }

    /// A `Deleted` event.
    pub fn deleted(item: T) -> Self {
        Self::new(EventKind::Deleted, item)
    }

    /// An event whose payload is some other type.
    pub fn unrecognized<U: fmt::Debug + ?Sized>(kind: EventKind, value: &U) -> Self {
        Self {
            kind,
            payload: EventPayload::Unrecognized {
                type_name: std::any::type_name::<U>().to_string(),
                detail: format!("{value:?}"),
            },
        }
    }

    /// Split into kind and item, or report the foreign payload.
    pub fn into_item(self) -> Result<(EventKind, T), InformerError> {
        match self.payload {
            EventPayload::Item(item) => Ok((self.kind, item)),
            EventPayload::Unrecognized { type_name, detail } => {
                Err(InformerError::UnrecognizedPayload { type_name, detail })
            }
        }
    }
}
