//! Core ID types for tracks and frames.

/// Frame number within a sequence.
///
/// Frames are numbered monotonically by the upstream tracker; the first
/// processed frame is usually 0 or 1.
pub type FrameId = u64;

/// Unique identifier for a Track within a TrackSet.
///
/// TrackIds are stable for the lifetime of a track and are what the merge
/// step uses to decide which tracks survive a stitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl TrackId {
    /// Create a new TrackId with the given value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}
