//! Brute-force Hamming matcher for binary descriptors.

use serde::{Deserialize, Serialize};

use super::match_set::{Match, MatchSet};
use super::MatchFeatures;
use crate::tracks::{Descriptor, Feature};

/// Hamming distance thresholds for 256-bit binary descriptors
pub const TH_HIGH: u32 = 100; // Max descriptor distance for acceptance
pub const TH_LOW: u32 = 50; // Stricter threshold
pub const NN_RATIO: f32 = 0.75; // Ratio test threshold (best/second_best)

/// Configuration for [`BruteForceMatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum Hamming distance for a match to be accepted.
    pub max_distance: u32,

    /// Lowe ratio test: best distance must be below `nn_ratio` times the
    /// second best. 1.0 disables the test.
    pub nn_ratio: f32,

    /// Keep only mutual nearest neighbours.
    pub cross_check: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_distance: TH_HIGH,
            nn_ratio: NN_RATIO,
            cross_check: true,
        }
    }
}

impl MatcherConfig {
    pub fn is_valid(&self) -> bool {
        self.nn_ratio > 0.0 && self.nn_ratio <= 1.0
    }
}

/// Exhaustive nearest-neighbour matcher over Hamming distance.
#[derive(Debug, Clone, Default)]
pub struct BruteForceMatcher {
    config: MatcherConfig,
}

/// Best and second-best candidate for one query descriptor.
#[derive(Debug, Clone, Copy)]
struct Nearest {
    index: usize,
    distance: u32,
    second_distance: Option<u32>,
}

impl BruteForceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    fn nearest(query: &Descriptor, train: &[Descriptor]) -> Option<Nearest> {
        let mut best: Option<Nearest> = None;
        for (index, candidate) in train.iter().enumerate() {
            let distance = query.distance(candidate);
            best = match best {
                None => Some(Nearest {
                    index,
                    distance,
                    second_distance: None,
                }),
                Some(b) if distance < b.distance => Some(Nearest {
                    index,
                    distance,
                    second_distance: Some(b.distance),
                }),
                Some(b) => Some(Nearest {
                    second_distance: Some(b.second_distance.map_or(distance, |s| s.min(distance))),
                    ..b
                }),
            };
        }
        best
    }

    fn passes_ratio_test(&self, nearest: &Nearest) -> bool {
        if self.config.nn_ratio >= 1.0 {
            return true;
        }
        match nearest.second_distance {
            Some(second) => (nearest.distance as f32) < self.config.nn_ratio * second as f32,
            None => true,
        }
    }
}

impl MatchFeatures for BruteForceMatcher {
    type Config = MatcherConfig;

    fn match_features(
        &self,
        _features_a: &[Feature],
        descriptors_a: &[Descriptor],
        _features_b: &[Feature],
        descriptors_b: &[Descriptor],
    ) -> MatchSet {
        let reverse: Vec<Option<usize>> = if self.config.cross_check {
            descriptors_b
                .iter()
                .map(|d| Self::nearest(d, descriptors_a).map(|n| n.index))
                .collect()
        } else {
            Vec::new()
        };

        descriptors_a
            .iter()
            .enumerate()
            .filter_map(|(index_a, desc)| {
                let nearest = Self::nearest(desc, descriptors_b)?;
                if nearest.distance > self.config.max_distance {
                    return None;
                }
                if !self.passes_ratio_test(&nearest) {
                    return None;
                }
                if self.config.cross_check && reverse[nearest.index] != Some(index_a) {
                    return None;
                }
                Some(Match::new(index_a, nearest.index))
            })
            .collect()
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
