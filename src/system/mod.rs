//! Thread plumbing for running the stitcher alongside a tracker.
//!
//! This module contains the shared state the loop closing thread publishes
//! into, along with the inter-thread message types.

pub mod messages;
pub mod shared_state;

pub use messages::{FrameTracksMsg, StitchedFrame};
pub use shared_state::SharedState;
