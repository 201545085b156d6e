//! File input/output for track sets and configuration.

pub mod config_file;
pub mod track_file;

pub use config_file::{load_config, save_config};
pub use track_file::{read_track_file, read_tracks, write_track_file, write_tracks};
