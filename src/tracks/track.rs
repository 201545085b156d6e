//! Track - the frame-ordered observation history of one feature.
//!
//! A track is append-only: observations can only be added after the current
//! last frame, either one at a time ([`Track::push`]) or by absorbing another
//! track's whole history ([`Track::append`]). The latter is what stitching
//! uses to bridge a bad-frame gap.

use super::feature::{Descriptor, Feature};
use super::types::{FrameId, TrackId};

/// A single observation of a track at one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    pub frame: FrameId,
    pub feature: Feature,
    pub descriptor: Descriptor,
}

impl TrackState {
    pub fn new(frame: FrameId, feature: Feature, descriptor: Descriptor) -> Self {
        Self {
            frame,
            feature,
            descriptor,
        }
    }
}

/// The observation history of one tracked feature.
///
/// Invariant: `history` is sorted by strictly increasing frame number.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    id: TrackId,
    history: Vec<TrackState>,
}

impl Track {
    /// Create an empty track.
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            history: Vec::new(),
        }
    }

    /// Create a track with a single initial observation.
    pub fn with_state(id: TrackId, state: TrackState) -> Self {
        Self {
            id,
            history: vec![state],
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn history(&self) -> &[TrackState] {
        &self.history
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn first_frame(&self) -> Option<FrameId> {
        self.history.first().map(|s| s.frame)
    }

    pub fn last_frame(&self) -> Option<FrameId> {
        self.history.last().map(|s| s.frame)
    }

    /// Frames on which this track has an observation, in increasing order.
    pub fn frames(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.history.iter().map(|s| s.frame)
    }

    /// Observation at the given frame, if any.
    pub fn state_at(&self, frame: FrameId) -> Option<&TrackState> {
        self.history
            .binary_search_by_key(&frame, |s| s.frame)
            .ok()
            .map(|idx| &self.history[idx])
    }

    /// Whether the track has an observation at `frame`.
    pub fn is_active_at(&self, frame: FrameId) -> bool {
        self.state_at(frame).is_some()
    }

    /// Add one observation at the end of the history.
    ///
    /// Returns false (and leaves the track unchanged) if `state.frame` is not
    /// strictly after the current last frame.
    pub fn push(&mut self, state: TrackState) -> bool {
        if let Some(last) = self.last_frame() {
            if state.frame <= last {
                return false;
            }
        }
        self.history.push(state);
        true
    }

    /// Extend this track with every observation of `other`.
    ///
    /// Fails when the histories overlap in time, i.e. when `other` does not
    /// start strictly after this track ends. On failure the track is left
    /// unchanged. The id of `other` is not carried over.
    pub fn append(&mut self, other: &Track) -> bool {
        if let (Some(last), Some(first)) = (self.last_frame(), other.first_frame()) {
            if last >= first {
                return false;
            }
        }
        self.history.extend(other.history.iter().cloned());
        true
    }
}
