//! Bad-frame detection: decides whether a stitch should be attempted.
//!
//! A stitch is only attempted when, looking back from the current frame,
//! there is exactly one poorly tracked transition (the gap) followed by a
//! new shot that has been tracked well for `new_shot_length` frames:
//!
//! ```text
//!   ... prev shot ... | gap | anchor ... current
//!                     ^ percentage_tracked < req
//!                             ^ every step after the anchor >= req
//! ```

use crate::tracks::{FrameId, TrackSet};

use super::config::CloseLoopsConfig;

/// Result of examining the track history ending at the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotBoundary {
    /// Detection is switched off.
    Disabled,
    /// Not enough frames yet to judge a new shot.
    InsufficientHistory,
    /// The transition into the candidate anchor frame was tracked well.
    NoGap {
        frame_to_stitch: FrameId,
        percent_tracked: f64,
    },
    /// The gap exists, but the new shot drops below the requirement again
    /// at `frame`.
    UnstableShot { frame_to_stitch: FrameId, frame: FrameId },
    /// A gap followed by a stable shot starting at `frame_to_stitch`.
    Stitchable { frame_to_stitch: FrameId },
}

impl ShotBoundary {
    /// Anchor frame to stitch at, if a stitch should be attempted.
    pub fn frame_to_stitch(&self) -> Option<FrameId> {
        match self {
            ShotBoundary::Stitchable { frame_to_stitch } => Some(*frame_to_stitch),
            _ => None,
        }
    }
}

/// Examine the transitions ending at `frame` and decide whether the start of
/// the current shot should be stitched to an earlier one.
pub fn detect_shot_boundary<C>(
    frame: FrameId,
    tracks: &TrackSet,
    config: &CloseLoopsConfig<C>,
) -> ShotBoundary {
    let new_shot_length = FrameId::from(config.new_shot_length());
    let required = config.bf_detection_percent_match_req;

    if !config.bf_detection_enabled {
        return ShotBoundary::Disabled;
    }
    if frame <= new_shot_length {
        return ShotBoundary::InsufficientHistory;
    }

    // frame > new_shot_length >= 1, so frame_to_stitch >= 2
    let frame_to_stitch = frame - new_shot_length + 1;
    let percent_tracked = tracks.percentage_tracked(frame_to_stitch - 1, frame_to_stitch);
    if percent_tracked >= required {
        return ShotBoundary::NoGap {
            frame_to_stitch,
            percent_tracked,
        };
    }

    for test in frame_to_stitch + 1..=frame {
        if tracks.percentage_tracked(test - 1, test) < required {
            return ShotBoundary::UnstableShot {
                frame_to_stitch,
                frame: test,
            };
        }
    }

    ShotBoundary::Stitchable { frame_to_stitch }
}
