//! Shared state between the upstream tracker and the loop closer.
//!
//! The `SharedState` struct holds the latest stitched track set and the
//! shutdown flag, protected by appropriate synchronization primitives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::tracks::TrackSet;

use super::messages::StitchedFrame;

/// Shared state accessible by the tracker and the loop closing thread.
pub struct SharedState {
    /// Most recent loop closer output.
    /// Protected by RwLock: the loop closer writes, everyone else reads.
    latest: RwLock<Option<StitchedFrame>>,

    /// Request the loop closer to finish processing and exit.
    shutdown_requested: AtomicBool,
}

impl SharedState {
    /// Create a new SharedState with nothing published yet.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publish the output for a frame, replacing the previous one.
    pub fn publish(&self, stitched: StitchedFrame) {
        *self.latest.write() = Some(stitched);
    }

    /// Latest published frame output.
    pub fn latest(&self) -> Option<StitchedFrame> {
        self.latest.read().clone()
    }

    /// Latest published track set.
    pub fn latest_tracks(&self) -> Option<Arc<TrackSet>> {
        self.latest.read().as_ref().map(|s| Arc::clone(&s.tracks))
    }

    /// Request shutdown of the loop closing thread.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown was requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            latest: RwLock::new(None),
            shutdown_requested: AtomicBool::new(false),
        }
    }
}
