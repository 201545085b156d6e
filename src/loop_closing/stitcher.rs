//! Bad-frame-only loop closing.
//!
//! [`CloseLoopsBadFramesOnly`] runs once per processed frame:
//! 1. **Detect** (`detector.rs`): is there a single bad transition followed by
//!    a stable new shot?
//! 2. **Search** (`search.rs`): match the new shot's first frame against
//!    recent past frames, nearest first.
//! 3. **Merge** (`merge.rs`): extend the matched old tracks with the new
//!    ones and drop the absorbed tracks.
//!
//! If any step declines, the input track set is returned as is (same `Arc`).

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_yaml::Value;

use crate::matching::MatchFeatures;
use crate::tracks::{FrameId, TrackSet};

use super::config::CloseLoopsConfig;
use super::detector::{detect_shot_boundary, ShotBoundary};
use super::merge::merge_tracks;
use super::search::search_backward;

/// What happened during one call to [`CloseLoopsBadFramesOnly::stitch_with_report`].
#[derive(Debug, Clone, PartialEq)]
pub enum StitchOutcome {
    /// Bad-frame detection is switched off.
    Disabled,
    /// Current frame is within the first `new_shot_length` frames.
    InsufficientHistory,
    /// No gap before the anchor frame.
    NoGap { frame_to_stitch: FrameId },
    /// Gap found but the new shot is not yet stable.
    UnstableShot {
        frame_to_stitch: FrameId,
        frame: FrameId,
    },
    /// Searched, but no past frame matched well enough.
    NoMatch {
        frame_to_stitch: FrameId,
        frames_searched: usize,
    },
    /// Tracks were stitched.
    Stitched {
        frame_to_stitch: FrameId,
        matched_frame: FrameId,
        matches: usize,
        merged: usize,
        failed_appends: usize,
    },
}

impl StitchOutcome {
    /// Whether a backward search was run.
    pub fn searched(&self) -> bool {
        matches!(
            self,
            StitchOutcome::NoMatch { .. } | StitchOutcome::Stitched { .. }
        )
    }

    pub fn is_stitched(&self) -> bool {
        matches!(self, StitchOutcome::Stitched { .. })
    }
}

/// Output track set of one stitch call with what happened.
#[derive(Debug, Clone)]
pub struct StitchReport {
    pub outcome: StitchOutcome,
    pub tracks: Arc<TrackSet>,
}

/// Loop closing that only bridges bad frames.
pub struct CloseLoopsBadFramesOnly<M: MatchFeatures> {
    /// Configuration. `feature_matcher` mirrors the matcher's own settings.
    config: CloseLoopsConfig<M::Config>,

    /// Feature matcher used to compare past frames with the anchor frame.
    matcher: M,
}

impl<M: MatchFeatures> CloseLoopsBadFramesOnly<M> {
    /// Create with default settings, keeping the matcher's current configuration.
    pub fn new(matcher: M) -> Self {
        let config = CloseLoopsConfig {
            feature_matcher: matcher.configuration(),
            ..CloseLoopsConfig::default()
        };
        Self { config, matcher }
    }

    /// Create with an explicit configuration, which is validated and applied
    /// to the matcher.
    pub fn with_config(matcher: M, config: CloseLoopsConfig<M::Config>) -> Result<Self> {
        let mut stitcher = Self::new(matcher);
        stitcher.set_configuration(config)?;
        Ok(stitcher)
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Current configuration, including the matcher's nested block.
    pub fn get_configuration(&self) -> CloseLoopsConfig<M::Config> {
        CloseLoopsConfig {
            feature_matcher: self.matcher.configuration(),
            ..self.config.clone()
        }
    }

    /// Apply a complete configuration.
    ///
    /// Invalid configurations are rejected and the current one is kept.
    /// `bf_detection_new_shot_length` is coerced to at least 1.
    pub fn set_configuration(&mut self, config: CloseLoopsConfig<M::Config>) -> Result<()> {
        if let Err(e) = Self::validate_configuration(&config) {
            tracing::warn!("Rejected bad-frame stitching configuration: {:#}", e);
            return Err(e);
        }
        let config = config.normalized();
        self.matcher.set_configuration(&config.feature_matcher);
        self.config = config;
        Ok(())
    }

    /// Overlay the explicit keys of `overrides` on the defaults and apply
    /// the result. Keys that are not given keep their default values.
    pub fn configure_from_yaml(&mut self, overrides: &Value) -> Result<()> {
        let config = CloseLoopsConfig::<M::Config>::default()
            .merged_with(overrides)
            .context("Failed to apply configuration overrides")?;
        self.set_configuration(config)
    }

    /// Validate a configuration without applying it.
    pub fn validate_configuration(config: &CloseLoopsConfig<M::Config>) -> Result<()> {
        config.validate_with(M::check_configuration(&config.feature_matcher))
    }

    /// Whether `config` is valid: the nested matcher configuration passes the
    /// matcher's own check and the match ratio is within [-1, 1].
    pub fn check_configuration(config: &CloseLoopsConfig<M::Config>) -> bool {
        Self::validate_configuration(config).is_ok()
    }

    /// Stitch the current shot to a prior one if a bad frame was detected at
    /// `frame`. Returns `input` itself when nothing was stitched.
    pub fn stitch(&self, frame: FrameId, input: &Arc<TrackSet>) -> Arc<TrackSet> {
        self.stitch_with_report(frame, input).tracks
    }

    /// Like [`stitch`](Self::stitch), also reporting what happened.
    pub fn stitch_with_report(&self, frame: FrameId, input: &Arc<TrackSet>) -> StitchReport {
        let unchanged = |outcome| StitchReport {
            outcome,
            tracks: Arc::clone(input),
        };

        let frame_to_stitch = match detect_shot_boundary(frame, input, &self.config) {
            ShotBoundary::Stitchable { frame_to_stitch } => frame_to_stitch,
            ShotBoundary::Disabled => return unchanged(StitchOutcome::Disabled),
            ShotBoundary::InsufficientHistory => {
                return unchanged(StitchOutcome::InsufficientHistory)
            }
            ShotBoundary::NoGap {
                frame_to_stitch, ..
            } => return unchanged(StitchOutcome::NoGap { frame_to_stitch }),
            ShotBoundary::UnstableShot {
                frame_to_stitch,
                frame,
            } => {
                tracing::debug!(
                    "Gap before frame {} but new shot unstable at frame {}",
                    frame_to_stitch,
                    frame
                );
                return unchanged(StitchOutcome::UnstableShot {
                    frame_to_stitch,
                    frame,
                });
            }
        };

        let search = search_backward(
            frame_to_stitch,
            input,
            &self.matcher,
            self.config.bf_detection_percent_match_req,
            self.config.bf_detection_max_search_length,
        );

        let Some(candidate) = search.candidate else {
            tracing::debug!(
                "Bad frame detection failed at frame {}: no match for anchor {} in {} frames",
                frame,
                frame_to_stitch,
                search.frames_searched
            );
            return unchanged(StitchOutcome::NoMatch {
                frame_to_stitch,
                frames_searched: search.frames_searched,
            });
        };

        let (merged, summary) = merge_tracks(
            &candidate.matches,
            &candidate.test_tracks,
            &candidate.stitch_tracks,
            input,
        );

        tracing::info!(
            "Stitched frame {} to frame {}: {} matches, {} tracks merged, {} appends failed",
            frame_to_stitch,
            candidate.frame,
            candidate.matches.size(),
            summary.removed.len(),
            summary.failed_appends
        );

        StitchReport {
            outcome: StitchOutcome::Stitched {
                frame_to_stitch,
                matched_frame: candidate.frame,
                matches: candidate.matches.size(),
                merged: summary.removed.len(),
                failed_appends: summary.failed_appends,
            },
            tracks: Arc::new(merged),
        }
    }
}
