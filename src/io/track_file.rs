//! CSV track files.
//!
//! One row per observation:
//!
//! ```text
//! track_id,frame_id,x,y,magnitude,scale,angle,descriptor
//! 0,1,12.5,40.0,0.8,1.0,0.0,9f03a1...
//! ```
//!
//! The descriptor column is lower-case hex. Rows may appear in any order;
//! lines starting with `#` are ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::tracks::{Descriptor, Feature, Track, TrackId, TrackSet, TrackState};

#[derive(Debug, Serialize, Deserialize)]
struct ObservationRecord {
    track_id: u64,
    frame_id: u64,
    x: f64,
    y: f64,
    magnitude: f64,
    scale: f64,
    angle: f64,
    descriptor: String,
}

/// Read a track set from CSV data.
pub fn read_tracks<R: Read>(reader: R) -> Result<TrackSet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut by_track: BTreeMap<u64, Vec<TrackState>> = BTreeMap::new();
    for (row, rec) in rdr.deserialize::<ObservationRecord>().enumerate() {
        let rec = rec.with_context(|| format!("Malformed track record at row {}", row + 1))?;
        let descriptor = Descriptor::from_hex(&rec.descriptor)
            .with_context(|| format!("Bad descriptor for track {} frame {}", rec.track_id, rec.frame_id))?;
        by_track.entry(rec.track_id).or_default().push(TrackState::new(
            rec.frame_id,
            Feature {
                location: Vector2::new(rec.x, rec.y),
                magnitude: rec.magnitude,
                scale: rec.scale,
                angle: rec.angle,
            },
            descriptor,
        ));
    }

    let mut tracks = Vec::with_capacity(by_track.len());
    for (id, mut states) in by_track {
        states.sort_by_key(|s| s.frame);
        let mut track = Track::new(TrackId::new(id));
        for state in states {
            let frame = state.frame;
            if !track.push(state) {
                bail!("Track {} has more than one observation at frame {}", id, frame);
            }
        }
        tracks.push(track);
    }

    TrackSet::new(tracks)
}

/// Read a track set from a CSV file.
pub fn read_track_file(path: impl AsRef<Path>) -> Result<TrackSet> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_tracks(file).with_context(|| format!("Failed to read tracks from {}", path.display()))
}

/// Write a track set as CSV, ordered by track id then frame.
pub fn write_tracks<W: Write>(writer: W, tracks: &TrackSet) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);

    let mut sorted: Vec<_> = tracks.tracks().iter().collect();
    sorted.sort_by_key(|t| t.id());

    for track in sorted {
        for state in track.history() {
            wtr.serialize(ObservationRecord {
                track_id: track.id().0,
                frame_id: state.frame,
                x: state.feature.location.x,
                y: state.feature.location.y,
                magnitude: state.feature.magnitude,
                scale: state.feature.scale,
                angle: state.feature.angle,
                descriptor: state.descriptor.to_hex(),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Write a track set to a CSV file, replacing it if it exists.
pub fn write_track_file(path: impl AsRef<Path>, tracks: &TrackSet) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_tracks(file, tracks).with_context(|| format!("Failed to write tracks to {}", path.display()))
}
