//! Track data structures consumed and produced by the stitcher.
//!
//! - [`Track`] - ordered, append-only history of one feature's observations
//! - [`TrackSet`] - immutable set of tracks with per-frame queries
//! - [`Feature`] / [`Descriptor`] - what a single observation carries
//!
//! # Example
//!
//! ```
//! use shot_stitch::tracks::{Descriptor, Feature, Track, TrackId, TrackSet, TrackState};
//!
//! let mut track = Track::new(TrackId::new(0));
//! track.push(TrackState::new(1, Feature::at(10.0, 20.0), Descriptor::new(vec![0u8; 32])));
//! track.push(TrackState::new(2, Feature::at(11.0, 20.5), Descriptor::new(vec![0u8; 32])));
//!
//! let set = TrackSet::new(vec![track]).unwrap();
//! assert_eq!(set.percentage_tracked(1, 2), 1.0);
//! ```

pub mod feature;
pub mod track;
pub mod track_set;
pub mod types;

pub use feature::{hamming_distance, Descriptor, Feature};
pub use track::{Track, TrackState};
pub use track_set::TrackSet;
pub use types::{FrameId, TrackId};
