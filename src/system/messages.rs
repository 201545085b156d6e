//! Inter-thread message types.
//!
//! These types are sent between the upstream tracker and the loop closer
//! via channels, or published through [`SharedState`](super::SharedState).

use std::sync::Arc;

use crate::loop_closing::StitchOutcome;
use crate::tracks::{FrameId, TrackSet};

/// Message sent from the upstream tracker after each processed frame.
#[derive(Debug, Clone)]
pub struct FrameTracksMsg {
    /// The frame that was just tracked.
    pub frame: FrameId,

    /// All tracks up to and including `frame`.
    pub tracks: Arc<TrackSet>,
}

/// Output of the loop closer for one frame.
#[derive(Debug, Clone)]
pub struct StitchedFrame {
    pub frame: FrameId,

    /// Tracks after stitching. The same `Arc` as the input when nothing
    /// was stitched.
    pub tracks: Arc<TrackSet>,

    pub outcome: StitchOutcome,
}
