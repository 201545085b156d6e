//! TrackSet - an immutable collection of tracks with per-frame queries.
//!
//! Tracks are stored behind `Arc` so that subsets (e.g. the tracks active at
//! one frame) and rebuilt sets share unchanged tracks with their source.
//! Nothing here mutates a set in place; stitching produces a new set.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use anyhow::{bail, Result};

use super::feature::{Descriptor, Feature};
use super::track::Track;
use super::types::{FrameId, TrackId};

/// An unordered collection of tracks with unique ids.
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    tracks: Vec<Arc<Track>>,
}

impl TrackSet {
    /// Build a set from owned tracks.
    ///
    /// Fails if two tracks share an id.
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        Self::from_shared(tracks.into_iter().map(Arc::new).collect())
    }

    /// Build a set from shared tracks.
    ///
    /// Fails if two tracks share an id.
    pub fn from_shared(tracks: Vec<Arc<Track>>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(tracks.len());
        for t in &tracks {
            if !seen.insert(t.id()) {
                bail!("Duplicate track id {} in track set", t.id());
            }
        }
        Ok(Self { tracks })
    }

    /// Build a set from tracks already known to have unique ids
    /// (e.g. a subset of an existing set).
    pub(crate) fn from_unique(tracks: Vec<Arc<Track>>) -> Self {
        debug_assert_eq!(
            tracks.iter().map(|t| t.id()).collect::<HashSet<_>>().len(),
            tracks.len()
        );
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Number of tracks.
    pub fn size(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: TrackId) -> Option<&Arc<Track>> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of all tracks in the set.
    pub fn ids(&self) -> HashSet<TrackId> {
        self.tracks.iter().map(|t| t.id()).collect()
    }

    /// Every frame on which at least one track has an observation.
    pub fn all_frame_ids(&self) -> BTreeSet<FrameId> {
        self.tracks.iter().flat_map(|t| t.frames()).collect()
    }

    pub fn first_frame(&self) -> Option<FrameId> {
        self.tracks.iter().filter_map(|t| t.first_frame()).min()
    }

    pub fn last_frame(&self) -> Option<FrameId> {
        self.tracks.iter().filter_map(|t| t.last_frame()).max()
    }

    /// Tracks that have an observation at `frame`.
    pub fn active_tracks(&self, frame: FrameId) -> TrackSet {
        self.filtered(|t| t.is_active_at(frame))
    }

    /// Tracks whose first observation is at `frame`.
    pub fn new_tracks(&self, frame: FrameId) -> TrackSet {
        self.filtered(|t| t.first_frame() == Some(frame))
    }

    /// Tracks whose last observation is at `frame`.
    pub fn terminated_tracks(&self, frame: FrameId) -> TrackSet {
        self.filtered(|t| t.last_frame() == Some(frame))
    }

    /// Features observed at `frame`, index-aligned with `active_tracks(frame)`.
    pub fn frame_features(&self, frame: FrameId) -> Vec<Feature> {
        self.tracks
            .iter()
            .filter_map(|t| t.state_at(frame))
            .map(|s| s.feature)
            .collect()
    }

    /// Descriptors observed at `frame`, index-aligned with `active_tracks(frame)`.
    pub fn frame_descriptors(&self, frame: FrameId) -> Vec<Descriptor> {
        self.tracks
            .iter()
            .filter_map(|t| t.state_at(frame))
            .map(|s| s.descriptor.clone())
            .collect()
    }

    /// Fraction of the tracks present at `frame_a` that are still present at
    /// `frame_b`, in [0, 1]. Returns 0.0 when no track is present at `frame_a`.
    pub fn percentage_tracked(&self, frame_a: FrameId, frame_b: FrameId) -> f64 {
        let mut present_a = 0usize;
        let mut present_both = 0usize;
        for t in &self.tracks {
            if t.is_active_at(frame_a) {
                present_a += 1;
                if t.is_active_at(frame_b) {
                    present_both += 1;
                }
            }
        }
        if present_a == 0 {
            return 0.0;
        }
        present_both as f64 / present_a as f64
    }

    /// Rebuild this set without the tracks in `removed`, substituting any
    /// track whose id appears in `replaced`.
    ///
    /// Replacement tracks must keep the id they are keyed under. Order of the
    /// surviving tracks is preserved.
    pub fn rebuilt(&self, removed: &HashSet<TrackId>, mut replaced: HashMap<TrackId, Track>) -> TrackSet {
        let tracks = self
            .tracks
            .iter()
            .filter(|t| !removed.contains(&t.id()))
            .map(|t| match replaced.remove(&t.id()) {
                Some(updated) => Arc::new(updated),
                None => Arc::clone(t),
            })
            .collect();
        Self::from_unique(tracks)
    }

    fn filtered(&self, keep: impl Fn(&Track) -> bool) -> TrackSet {
        Self::from_unique(
            self.tracks
                .iter()
                .filter(|t| keep(t))
                .cloned()
                .collect(),
        )
    }
}
