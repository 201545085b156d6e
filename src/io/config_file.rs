//! YAML configuration files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::loop_closing::{CloseLoopsBadFramesOnly, CloseLoopsConfig};
use crate::matching::MatchFeatures;

/// Load a configuration file for a stitcher using matcher `M`.
///
/// Keys missing from the file keep their defaults. The result is validated
/// but not yet coerced; apply it with `set_configuration`.
pub fn load_config<M: MatchFeatures>(path: impl AsRef<Path>) -> Result<CloseLoopsConfig<M::Config>> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let config = CloseLoopsConfig::<M::Config>::from_yaml_str(&yaml)
        .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
    CloseLoopsBadFramesOnly::<M>::validate_configuration(&config)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Write a complete configuration file.
pub fn save_config<C>(path: impl AsRef<Path>, config: &CloseLoopsConfig<C>) -> Result<()>
where
    C: serde::Serialize + serde::de::DeserializeOwned + Default,
{
    let path = path.as_ref();
    let yaml = config.to_yaml_string()?;
    fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))
}
