//! Configuration for bad-frame loop closing.
//!
//! The configuration is a typed struct whose serialized form uses the
//! documented `bf_detection_*` keys plus a nested `feature_matcher` block.
//! Partial configurations are applied as an overlay on top of the defaults,
//! so keys that are not given keep their documented default values.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::matching::MatcherConfig;

/// Key of the nested matcher configuration block.
pub const FEATURE_MATCHER_KEY: &str = "feature_matcher";

/// Configuration for bad-frame detection and stitching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    bound(
        serialize = "C: Serialize",
        deserialize = "C: DeserializeOwned + Default"
    )
)]
pub struct CloseLoopsConfig<C = MatcherConfig> {
    /// Master switch for the whole stitching procedure.
    pub bf_detection_enabled: bool,

    /// Minimum fraction of tracked/matched features. Below this a frame
    /// transition is a gap; at or above it a new shot is stable and a
    /// stitch candidate is accepted.
    pub bf_detection_percent_match_req: f64,

    /// Number of consecutive frames a new shot must span before stitching
    /// it to a prior shot. Values below 1 are treated as 1.
    pub bf_detection_new_shot_length: u32,

    /// Maximum number of past frames to search for a stitch candidate.
    pub bf_detection_max_search_length: u32,

    /// Nested configuration of the feature matcher.
    pub feature_matcher: C,
}

impl<C: Default> Default for CloseLoopsConfig<C> {
    fn default() -> Self {
        Self {
            bf_detection_enabled: true,
            bf_detection_percent_match_req: 0.2,
            bf_detection_new_shot_length: 2,
            bf_detection_max_search_length: 5,
            feature_matcher: C::default(),
        }
    }
}

/// One documented configuration key with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub help: &'static str,
}

impl<C> CloseLoopsConfig<C> {
    /// New-shot length with the minimum of 1 applied.
    pub fn new_shot_length(&self) -> u32 {
        self.bf_detection_new_shot_length.max(1)
    }

    /// Copy with `bf_detection_new_shot_length` coerced to at least 1.
    pub fn normalized(mut self) -> Self {
        self.bf_detection_new_shot_length = self.new_shot_length();
        self
    }

    /// Validate the fields owned by the stitcher. `matcher_ok` is the result
    /// of the nested matcher's own check.
    pub fn validate_with(&self, matcher_ok: bool) -> Result<()> {
        if !matcher_ok {
            bail!("Invalid nested '{}' configuration", FEATURE_MATCHER_KEY);
        }
        let ratio = self.bf_detection_percent_match_req;
        if !(ratio.abs() <= 1.0) {
            bail!(
                "bf_detection_percent_match_req must be within [-1.0, 1.0], got {}",
                ratio
            );
        }
        Ok(())
    }

    /// Documented keys with their current values, in declaration order.
    /// The nested matcher block is not included.
    pub fn describe(&self) -> Vec<ConfigEntry> {
        vec![
            ConfigEntry {
                key: "bf_detection_enabled",
                value: self.bf_detection_enabled.to_string(),
                help: "Should bad frame detection be enabled? This option will attempt to \
                       bridge the gap between frames which don't meet certain criteria \
                       (percentage of feature points tracked) and will instead attempt \
                       to match features on the current frame against past frames to \
                       meet this criteria. This is useful when there can be bad frames.",
            },
            ConfigEntry {
                key: "bf_detection_percent_match_req",
                value: self.bf_detection_percent_match_req.to_string(),
                help: "The required percentage of features needed to be matched for a \
                       stitch to be considered successful (value must be between 0.0 and \
                       1.0).",
            },
            ConfigEntry {
                key: "bf_detection_new_shot_length",
                value: self.bf_detection_new_shot_length.to_string(),
                help: "Number of frames for a new shot to be considered valid before \
                       attempting to stitch to prior shots.",
            },
            ConfigEntry {
                key: "bf_detection_max_search_length",
                value: self.bf_detection_max_search_length.to_string(),
                help: "Maximum number of frames to search in the past for matching to \
                       the end of the last shot.",
            },
        ]
    }
}

impl<C> CloseLoopsConfig<C>
where
    C: Serialize + DeserializeOwned + Default,
{
    /// Overlay the explicit keys of `overrides` (a YAML mapping) on top of
    /// this configuration. Nested mappings are merged key by key.
    pub fn merged_with(&self, overrides: &Value) -> Result<Self> {
        let mut base = serde_yaml::to_value(self).context("Failed to serialize configuration")?;
        match overrides {
            Value::Null => {}
            Value::Mapping(_) => merge_values(&mut base, overrides),
            other => bail!("Configuration overrides must be a mapping, got {:?}", other),
        }
        serde_yaml::from_value(base).context("Invalid configuration value")
    }

    /// Defaults overlaid with a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let overrides: Value = serde_yaml::from_str(yaml).context("Failed to parse YAML")?;
        Self::default().merged_with(&overrides)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration")
    }
}

/// Recursively merge `overlay` into `base`. Mappings are merged per key;
/// any other value in `overlay` replaces the one in `base`.
fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
