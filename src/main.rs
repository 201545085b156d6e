//! `shot-stitch` binary: stitch every frame of a track file across bad frames.
//!
//! # Usage
//!
//! ```bash
//! shot-stitch tracks.csv stitched.csv
//! shot-stitch tracks.csv stitched.csv config.yaml
//! shot-stitch --help-config
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;

use shot_stitch::io::{load_config, read_track_file, write_track_file};
use shot_stitch::loop_closing::{CloseLoopsBadFramesOnly, CloseLoopsConfig, LoopCloserStats};
use shot_stitch::matching::{BruteForceMatcher, MatcherConfig};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "shot-stitch",
    version,
    about = "Stitch feature tracks across bad frames",
    long_about = None
)]
struct Args {
    /// Input track file (CSV).
    #[arg(value_name = "TRACKS", required_unless_present = "help_config")]
    input: Option<PathBuf>,

    /// Output track file (CSV), replaced if it exists.
    #[arg(value_name = "OUTPUT", required_unless_present = "help_config")]
    output: Option<PathBuf>,

    /// YAML configuration overlaid on the defaults.
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the configuration keys with their defaults and exit.
    #[arg(long, default_value_t = false)]
    help_config: bool,
}

fn init_logging() {
    let level = std::env::var("SHOT_STITCH_LOG")
        .ok()
        .and_then(|s| s.parse::<tracing_subscriber::filter::LevelFilter>().ok())
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn print_config_help() -> Result<()> {
    let config = CloseLoopsConfig::<MatcherConfig>::default();
    for entry in config.describe() {
        println!("{} (default: {})", entry.key, entry.value);
        println!("    {}", entry.help);
    }
    println!("feature_matcher:");
    for line in serde_yaml::to_string(&config.feature_matcher)?.lines() {
        println!("    {}", line);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.help_config {
        return print_config_help();
    }
    let (Some(input_path), Some(output_path)) = (args.input, args.output) else {
        bail!("Both TRACKS and OUTPUT are required");
    };

    init_logging();

    let mut stitcher = CloseLoopsBadFramesOnly::new(BruteForceMatcher::default());
    if let Some(path) = &args.config {
        tracing::info!("Loading configuration from {}", path.display());
        stitcher.set_configuration(load_config::<BruteForceMatcher>(path)?)?;
    }

    tracing::info!("Loading tracks from {}", input_path.display());
    let mut tracks = Arc::new(read_track_file(&input_path)?);
    let (Some(first), Some(last)) = (tracks.first_frame(), tracks.last_frame()) else {
        tracing::warn!("No observations in {}; writing empty output", input_path.display());
        write_track_file(&output_path, &tracks)?;
        return Ok(());
    };
    tracing::info!(
        "Loaded {} tracks on frames {}..={}",
        tracks.size(),
        first,
        last
    );

    let initial_tracks = tracks.size();
    let mut stats = LoopCloserStats::default();
    for frame in first + 1..=last {
        let report = stitcher.stitch_with_report(frame, &tracks);
        stats.record(&report.outcome);
        tracks = report.tracks;
    }

    write_track_file(&output_path, &tracks)?;
    tracing::info!(
        "Done. frames={}, searches={}, stitches={}, tracks {} -> {}",
        stats.frames_processed,
        stats.searches_attempted,
        stats.stitches_performed,
        initial_tracks,
        tracks.size()
    );
    tracing::info!("Wrote {}", output_path.display());

    Ok(())
}
