//! Feature matching between two frames.
//!
//! The stitcher only depends on the [`MatchFeatures`] trait; any matching
//! strategy can be plugged in. [`BruteForceMatcher`] is the default
//! implementation for binary descriptors.

pub mod brute_force;
pub mod match_set;

pub use brute_force::{BruteForceMatcher, MatcherConfig, NN_RATIO, TH_HIGH, TH_LOW};
pub use match_set::{Match, MatchSet};

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::tracks::{Descriptor, Feature};

/// Computes correspondences between the features of two frames.
///
/// Indices in the returned [`MatchSet`] refer to positions in the slices
/// passed in: `index_a` into `features_a`/`descriptors_a`, `index_b` into
/// `features_b`/`descriptors_b`.
pub trait MatchFeatures {
    /// Matcher-specific configuration, nested under `feature_matcher`.
    type Config: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned;

    fn match_features(
        &self,
        features_a: &[Feature],
        descriptors_a: &[Descriptor],
        features_b: &[Feature],
        descriptors_b: &[Descriptor],
    ) -> MatchSet;

    /// Current configuration.
    fn configuration(&self) -> Self::Config;

    /// Replace the configuration. Callers validate with
    /// [`MatchFeatures::check_configuration`] first.
    fn set_configuration(&mut self, config: &Self::Config);

    /// Whether `config` is usable by this matcher.
    fn check_configuration(config: &Self::Config) -> bool
    where
        Self: Sized;
}
