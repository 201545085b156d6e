//! Loop closing across bad frames.
//!
//! This module implements recovery from "bad frames": frame transitions on
//! which tracking collapses (a cut, motion blur, an occlusion) and a new
//! shot starts with fresh tracks. Once the new shot is stable, its first
//! frame is matched against recent frames of the previous shot and the
//! matching tracks are joined, restoring continuity across the gap.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. **Configuration** (`config.rs`): typed parameters with YAML overlay
//! 2. **Detection** (`detector.rs`): gap followed by a stable new shot
//! 3. **Search** (`search.rs`): nearest-first backward matching with an
//!    acceptance threshold
//! 4. **Merge** (`merge.rs`): copy-on-write track joining
//! 5. **Stitcher** (`stitcher.rs`): the per-frame entry point
//! 6. **Thread** (`loop_closer.rs`): optional background loop closing thread

pub mod config;
pub mod detector;
pub mod loop_closer;
pub mod merge;
pub mod search;
pub mod stitcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{CloseLoopsConfig, ConfigEntry, FEATURE_MATCHER_KEY};
pub use detector::{detect_shot_boundary, ShotBoundary};
pub use loop_closer::{spawn_loop_closer, LoopCloser, LoopCloserStats};
pub use merge::{merge_tracks, MergeSummary};
pub use search::{is_acceptable, search_backward, search_window, SearchResult, StitchCandidate};
pub use stitcher::{CloseLoopsBadFramesOnly, StitchOutcome, StitchReport};
