//! Per-path debouncing
//!
//! Collapses bursts of change events into one analysis request per quiet
//! period. Each pending path keeps only its most recent timestamp, so every
//! new event re-arms the window for that path.
//!
//! The tracker is shared between the notification thread (which calls
//! [`ChangeTracker::record`]) and the monitor loop (which calls
//! [`ChangeTracker::flush_ready`]). Both take the same lock, so the
//! eligibility check and the removal in a flush happen as one step: an event
//! that arrives before the flush takes the lock re-arms its path and keeps it
//! out of that flush.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Default debounce window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(2);

/// Pending change set keyed by path
pub struct ChangeTracker {
    /// path -> last-seen timestamp
    pending: Mutex<HashMap<PathBuf, Instant>>,

    /// Quiet period required before a path is flushed
    window: Duration,
}

impl ChangeTracker {
    /// Create a tracker with the given debounce window
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Record a change, resetting the timer for `path`
    pub fn record(&self, path: PathBuf, now: Instant) {
        let mut pending = self.pending.lock();
        if pending.insert(path, now).is_none() {
            tracing::trace!("Tracking new change ({} pending)", pending.len());
        }
    }

    /// Remove and return every path that has been quiet for the full window
    ///
    /// Paths still inside their window are left untouched. The result is
    /// sorted so callers get a stable order.
    pub fn flush_ready(&self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut ready = Vec::new();

        self.pending.lock().retain(|path, last_seen| {
            // `checked_duration_since` is None when `now` predates the event
            let settled = now
                .checked_duration_since(*last_seen)
                .map_or(false, |quiet| quiet >= window);
            if settled {
                ready.push(path.clone());
            }
            !settled
        });

        ready.sort();
        ready
    }

    /// Number of paths awaiting their window
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
