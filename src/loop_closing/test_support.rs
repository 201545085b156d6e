//! Synthetic track sequences and a scripted matcher for tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;

use crate::matching::{Match, MatchFeatures, MatchSet, MatcherConfig};
use crate::tracks::{Descriptor, Feature, FrameId, Track, TrackId, TrackSet, TrackState};

/// Deterministic 32-byte descriptor for a scene landmark (splitmix64).
pub(crate) fn landmark_descriptor(landmark: u64) -> Descriptor {
    let mut state = landmark.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut bytes = Vec::with_capacity(32);
    for _ in 0..4 {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        bytes.extend_from_slice(&z.to_le_bytes());
    }
    Descriptor::new(bytes)
}

/// Builds track sets shot by shot. Each track observes one landmark; tracks
/// that observe the same landmark carry the same descriptor.
pub(crate) struct SequenceBuilder {
    next_track: u64,
    next_landmark: u64,
    tracks: Vec<Track>,
}

impl SequenceBuilder {
    pub(crate) fn new() -> Self {
        Self {
            next_track: 0,
            next_landmark: 1000,
            tracks: Vec::new(),
        }
    }

    /// `count` tracks of fresh landmarks spanning `first..=last`.
    pub(crate) fn shot(&mut self, first: FrameId, last: FrameId, count: usize) -> Vec<TrackId> {
        let start = self.next_landmark;
        self.next_landmark += count as u64;
        self.shot_of_landmarks(first, last, start..start + count as u64)
    }

    /// One track per landmark in `landmarks`, spanning `first..=last`.
    pub(crate) fn shot_of_landmarks(
        &mut self,
        first: FrameId,
        last: FrameId,
        landmarks: Range<u64>,
    ) -> Vec<TrackId> {
        landmarks
            .map(|landmark| self.track_of(landmark, first, last))
            .collect()
    }

    /// A single track of a fresh landmark spanning `first..=last`.
    pub(crate) fn span(&mut self, first: FrameId, last: FrameId) -> TrackId {
        let landmark = self.next_landmark;
        self.next_landmark += 1;
        self.track_of(landmark, first, last)
    }

    fn track_of(&mut self, landmark: u64, first: FrameId, last: FrameId) -> TrackId {
        let id = TrackId::new(self.next_track);
        self.next_track += 1;
        let descriptor = landmark_descriptor(landmark);
        let mut track = Track::new(id);
        for frame in first..=last {
            track.push(TrackState::new(
                frame,
                Feature::at(landmark as f64, frame as f64),
                descriptor.clone(),
            ));
        }
        self.tracks.push(track);
        id
    }

    pub(crate) fn build(&self) -> TrackSet {
        TrackSet::new(self.tracks.clone()).unwrap()
    }
}

/// Matcher double that returns canned results keyed by the size of the
/// first feature list and records every call.
///
/// Tests make the frames distinguishable by giving each a different
/// number of active tracks.
#[derive(Default)]
pub(crate) struct ScriptedMatcher {
    responses: HashMap<usize, Vec<(usize, usize)>>,
    calls: RefCell<Vec<(usize, usize)>>,
    config: MatcherConfig,
}

impl ScriptedMatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Respond with `matches` when frame A has `size_a` features.
    pub(crate) fn respond(mut self, size_a: usize, matches: Vec<(usize, usize)>) -> Self {
        self.responses.insert(size_a, matches);
        self
    }

    /// (size of A, size of B) for every call, in call order.
    pub(crate) fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.borrow().clone()
    }
}

impl MatchFeatures for ScriptedMatcher {
    type Config = MatcherConfig;

    fn match_features(
        &self,
        features_a: &[Feature],
        descriptors_a: &[Descriptor],
        features_b: &[Feature],
        descriptors_b: &[Descriptor],
    ) -> MatchSet {
        assert_eq!(features_a.len(), descriptors_a.len());
        assert_eq!(features_b.len(), descriptors_b.len());
        self.calls
            .borrow_mut()
            .push((features_a.len(), features_b.len()));
        self.responses
            .get(&features_a.len())
            .map(|pairs| pairs.iter().copied().map(Match::from).collect())
            .unwrap_or_default()
    }

    fn configuration(&self) -> MatcherConfig {
        self.config.clone()
    }

    fn set_configuration(&mut self, config: &MatcherConfig) {
        self.config = config.clone();
    }

    fn check_configuration(config: &MatcherConfig) -> bool {
        config.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_descriptors_distinct() {
        let a = landmark_descriptor(1);
        let b = landmark_descriptor(2);
        assert_eq!(a.len(), 32);
        assert_eq!(a, landmark_descriptor(1));
        assert!(a.distance(&b) > 50);
    }

    #[test]
    fn test_sequence_builder() {
        let mut seq = SequenceBuilder::new();
        let a = seq.shot(1, 3, 4);
        let b = seq.span(3, 5);
        let set = seq.build();

        assert_eq!(a.len(), 4);
        assert_eq!(set.size(), 5);
        assert_eq!(set.active_tracks(3).size(), 5);
        assert_eq!(set.get(b).unwrap().first_frame(), Some(3));
    }
}
