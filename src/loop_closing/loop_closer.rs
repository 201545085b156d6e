//! LoopCloser - background loop closing thread.
//!
//! This module runs the stitcher on its own thread:
//! 1. Receives per-frame track sets from the upstream tracker
//! 2. Runs bad-frame detection and stitching
//! 3. Publishes the resulting track set to the shared state

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::matching::MatchFeatures;
use crate::system::{FrameTracksMsg, SharedState, StitchedFrame};

use super::stitcher::{CloseLoopsBadFramesOnly, StitchOutcome, StitchReport};

/// Timeout for receiving frames from the channel.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Statistics for the loop closer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoopCloserStats {
    /// Number of frames processed.
    pub frames_processed: usize,

    /// Number of frames on which a backward search was run.
    pub searches_attempted: usize,

    /// Number of successful stitches.
    pub stitches_performed: usize,

    /// Number of tracks absorbed by stitches.
    pub tracks_merged: usize,
}

impl LoopCloserStats {
    /// Account for one stitch outcome.
    pub fn record(&mut self, outcome: &StitchOutcome) {
        self.frames_processed += 1;
        if outcome.searched() {
            self.searches_attempted += 1;
        }
        if let StitchOutcome::Stitched { merged, .. } = outcome {
            self.stitches_performed += 1;
            self.tracks_merged += merged;
        }
    }
}

/// The LoopCloser thread handler.
pub struct LoopCloser<M: MatchFeatures> {
    /// Shared state with other threads.
    shared: Arc<SharedState>,

    /// Stitcher, configured before the thread starts.
    stitcher: CloseLoopsBadFramesOnly<M>,

    /// Statistics.
    stats: LoopCloserStats,
}

impl<M: MatchFeatures> LoopCloser<M> {
    /// Create a new LoopCloser.
    pub fn new(shared: Arc<SharedState>, stitcher: CloseLoopsBadFramesOnly<M>) -> Self {
        Self {
            shared,
            stitcher,
            stats: LoopCloserStats::default(),
        }
    }

    /// Run the main loop closing thread.
    ///
    /// This function blocks and processes frames until the channel is closed
    /// or shutdown is requested.
    pub fn run(&mut self, receiver: Receiver<FrameTracksMsg>) {
        tracing::info!("LoopCloser thread started");

        loop {
            if self.shared.is_shutdown_requested() {
                break;
            }

            match receiver.recv_timeout(RECV_TIMEOUT) {
                Ok(msg) => {
                    self.process_frame(msg);
                }
                Err(RecvTimeoutError::Timeout) => {
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("LoopCloser channel disconnected");
                    break;
                }
            }
        }

        tracing::info!(
            "LoopCloser thread exiting. Stats: processed={}, searched={}, stitched={}, merged={}",
            self.stats.frames_processed,
            self.stats.searches_attempted,
            self.stats.stitches_performed,
            self.stats.tracks_merged
        );
    }

    /// Stitch a single frame and publish the result.
    pub fn process_frame(&mut self, msg: FrameTracksMsg) -> StitchReport {
        let report = self.stitcher.stitch_with_report(msg.frame, &msg.tracks);
        self.stats.record(&report.outcome);

        self.shared.publish(StitchedFrame {
            frame: msg.frame,
            tracks: Arc::clone(&report.tracks),
            outcome: report.outcome.clone(),
        });

        report
    }

    /// Get current statistics.
    pub fn stats(&self) -> &LoopCloserStats {
        &self.stats
    }
}

/// Spawn the loop closer thread.
///
/// Returns a handle to the spawned thread, which yields the final statistics.
pub fn spawn_loop_closer<M>(
    shared: Arc<SharedState>,
    receiver: Receiver<FrameTracksMsg>,
    stitcher: CloseLoopsBadFramesOnly<M>,
) -> thread::JoinHandle<LoopCloserStats>
where
    M: MatchFeatures + Send + 'static,
    M::Config: Send,
{
    thread::spawn(move || {
        let mut loop_closer = LoopCloser::new(shared, stitcher);
        loop_closer.run(receiver);
        loop_closer.stats
    })
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;

    use super::*;
    use crate::loop_closing::test_support::SequenceBuilder;
    use crate::matching::{BruteForceMatcher, MatcherConfig, TH_LOW};
    use crate::tracks::TrackSet;

    fn revisit_scene() -> Arc<TrackSet> {
        let mut seq = SequenceBuilder::new();
        seq.shot_of_landmarks(1, 6, 0..20);
        seq.shot_of_landmarks(7, 10, 0..10);
        seq.shot_of_landmarks(7, 10, 500..510);
        Arc::new(seq.build())
    }

    fn stitcher() -> CloseLoopsBadFramesOnly<BruteForceMatcher> {
        CloseLoopsBadFramesOnly::new(BruteForceMatcher::new(MatcherConfig {
            max_distance: TH_LOW,
            ..Default::default()
        }))
    }

    #[test]
    fn test_loop_closer_stats_default() {
        let stats = LoopCloserStats::default();
        assert_eq!(stats.frames_processed, 0);
        assert_eq!(stats.stitches_performed, 0);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = LoopCloserStats::default();
        stats.record(&StitchOutcome::InsufficientHistory);
        stats.record(&StitchOutcome::NoMatch {
            frame_to_stitch: 4,
            frames_searched: 2,
        });
        stats.record(&StitchOutcome::Stitched {
            frame_to_stitch: 9,
            matched_frame: 7,
            matches: 5,
            merged: 4,
            failed_appends: 1,
        });

        assert_eq!(
            stats,
            LoopCloserStats {
                frames_processed: 3,
                searches_attempted: 2,
                stitches_performed: 1,
                tracks_merged: 4,
            }
        );
    }

    #[test]
    fn test_process_frame_publishes() {
        let shared = SharedState::new();
        let mut closer = LoopCloser::new(Arc::clone(&shared), stitcher());
        let tracks = revisit_scene();

        let report = closer.process_frame(FrameTracksMsg {
            frame: 8,
            tracks: Arc::clone(&tracks),
        });

        assert!(report.outcome.is_stitched());
        let latest = shared.latest().unwrap();
        assert_eq!(latest.frame, 8);
        assert!(Arc::ptr_eq(&latest.tracks, &report.tracks));
        assert_eq!(closer.stats().stitches_performed, 1);
        assert_eq!(closer.stats().tracks_merged, 10);
    }

    #[test]
    fn test_thread_exits_on_disconnect() {
        let shared = SharedState::new();
        let (sender, receiver) = unbounded();
        let handle = spawn_loop_closer(Arc::clone(&shared), receiver, stitcher());

        let tracks = revisit_scene();
        for frame in 1..=10 {
            sender
                .send(FrameTracksMsg {
                    frame,
                    tracks: Arc::clone(&tracks),
                })
                .unwrap();
        }
        drop(sender);

        let stats = handle.join().unwrap();
        assert_eq!(stats.frames_processed, 10);
        // Only frame 8 sees the gap at 6 -> 7 followed by a stable frame.
        assert_eq!(stats.stitches_performed, 1);
        assert_eq!(shared.latest().unwrap().frame, 10);
    }

    #[test]
    fn test_thread_exits_on_shutdown() {
        let shared = SharedState::new();
        let (sender, receiver) = unbounded::<FrameTracksMsg>();
        let handle = spawn_loop_closer(Arc::clone(&shared), receiver, stitcher());

        shared.request_shutdown();
        let stats = handle.join().unwrap();

        assert_eq!(stats.frames_processed, 0);
        drop(sender);
    }
}
