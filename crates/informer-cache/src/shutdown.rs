//! Stop signalling for the synchronizer.
//!
//! [`StopSignal`] is the cache's liveness flag. It moves from active to
//! stopped exactly once; [`StopListener`] is the synchronizer's view of it.
//! Dropping every `StopSignal` counts as a stop, so a cache that goes out of
//! scope takes its background task with it.
//!
//! # Example
//!
//! ```rust
//! use informer_cache::StopSignal;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let signal = StopSignal::new();
//! let mut listener = signal.listener();
//!
//! assert!(signal.stop());
//! assert!(!signal.stop());
//! listener.wait().await;
//! assert!(listener.is_stopped());
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// One-way stop flag shared between a cache and its synchronizer.
///
/// The flag lives in the watch channel itself; `true` means stop requested.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    /// Create a new, active stop signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a listener that observes this signal.
    pub fn listener(&self) -> StopListener {
        StopListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Check if stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Request a stop.
    ///
    /// Never blocks. Returns `true` if this call performed the transition and
    /// `false` if the signal was already stopped.
    pub fn stop(&self) -> bool {
        // The value is stored even when no listener is alive
        let fired = self.tx.send_if_modified(|stopped| {
            if *stopped {
                return false;
            }
            *stopped = true;
            true
        });
        if fired {
            debug!(listeners = self.tx.receiver_count(), "stop signalled");
        }
        fired
    }
}

/// Receiving side of a [`StopSignal`].
#[derive(Debug, Clone)]
pub struct StopListener {
    rx: watch::Receiver<bool>,
}

impl StopListener {
    /// Check if stop has been requested or every signal has been dropped.
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Wait for the stop signal.
    ///
    /// Cancel safe: dropping the future loses nothing.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // All signals dropped, treat as stop
                return;
            }
        }
    }
}
