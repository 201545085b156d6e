//! Backward search for a past frame that matches the anchor of a new shot.
//!
//! Candidate frames are visited nearest first, starting two frames before
//! the anchor (the frame right before it is the bad one) and going back at
//! most `max_search_length` frames. The first acceptable candidate wins.

use std::ops::RangeInclusive;

use crate::matching::{MatchFeatures, MatchSet};
use crate::tracks::{FrameId, TrackSet};

/// Candidate frames for `frame_to_stitch`, in the order they are visited
/// (strictly decreasing). Never includes frame 0.
pub fn search_window(
    frame_to_stitch: FrameId,
    max_search_length: u32,
) -> std::iter::Rev<RangeInclusive<FrameId>> {
    let first = frame_to_stitch.saturating_sub(2);
    let max_search_length = FrameId::from(max_search_length);
    let last_excluded = if first > max_search_length {
        first - max_search_length
    } else {
        0
    };
    (last_excluded + 1..=first).rev()
}

/// Acceptance rule for a candidate frame.
///
/// Twice the match count must reach `ratio` of the combined feature count of
/// both frames, truncated to an integer: `2 * m >= floor(ratio * (a + b))`.
pub fn is_acceptable(match_count: usize, test_size: usize, stitch_size: usize, ratio: f64) -> bool {
    let total_features = (test_size + stitch_size) as f64;
    // `as` saturates: negative requirements become 0.
    let required = (ratio * total_features) as usize;
    2 * match_count >= required
}

/// An accepted past frame together with everything the merge step needs.
#[derive(Debug, Clone)]
pub struct StitchCandidate {
    /// The past frame that matched.
    pub frame: FrameId,
    /// Matches between `test_tracks` (index a) and `stitch_tracks` (index b).
    pub matches: MatchSet,
    /// Tracks active at `frame`, index-aligned with the matcher's A side.
    pub test_tracks: TrackSet,
    /// Tracks active at the anchor frame, index-aligned with the B side.
    pub stitch_tracks: TrackSet,
}

/// Outcome of a backward search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The accepted candidate, if any.
    pub candidate: Option<StitchCandidate>,
    /// Number of frames that were matched against the anchor.
    pub frames_searched: usize,
}

/// Search past frames for one whose features match the anchor frame's.
pub fn search_backward<M: MatchFeatures>(
    frame_to_stitch: FrameId,
    tracks: &TrackSet,
    matcher: &M,
    percent_match_req: f64,
    max_search_length: u32,
) -> SearchResult {
    let stitch_tracks = tracks.active_tracks(frame_to_stitch);
    let stitch_features = stitch_tracks.frame_features(frame_to_stitch);
    let stitch_descriptors = stitch_tracks.frame_descriptors(frame_to_stitch);

    let mut frames_searched = 0;

    for frame in search_window(frame_to_stitch, max_search_length) {
        let test_tracks = tracks.active_tracks(frame);
        frames_searched += 1;

        let matches = matcher.match_features(
            &test_tracks.frame_features(frame),
            &test_tracks.frame_descriptors(frame),
            &stitch_features,
            &stitch_descriptors,
        );

        let accepted = is_acceptable(
            matches.size(),
            test_tracks.size(),
            stitch_tracks.size(),
            percent_match_req,
        );

        tracing::debug!(
            "Stitch candidate frame {} for anchor {}: {} matches ({} + {} features), {}",
            frame,
            frame_to_stitch,
            matches.size(),
            test_tracks.size(),
            stitch_tracks.size(),
            if accepted { "accepted" } else { "rejected" }
        );

        if accepted {
            return SearchResult {
                candidate: Some(StitchCandidate {
                    frame,
                    matches,
                    test_tracks,
                    stitch_tracks,
                }),
                frames_searched,
            };
        }
    }

    SearchResult {
        candidate: None,
        frames_searched,
    }
}
