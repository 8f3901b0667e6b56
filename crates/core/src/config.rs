//! Target descriptions: a memory map plus rule thresholds.
//!
//! The built-in target is the RP2040. Other targets (or tuned thresholds) are
//! read from a YAML or JSON file:
//!
//! ```yaml
//! name: rp2040-custom
//! regions:
//!   - { name: flash, start: 0x10000000, end: 0x10200000, access: read_only }
//!   - { name: ram, start: 0x20000000, end: 0x20040000, access: read_write }
//! rules:
//!   heap_proximity: 512
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::memory_map::{MapError, MemoryMap, MemoryRegion};
use crate::rules::RuleSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read target file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported target file extension for {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("Failed to parse YAML target description: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON target description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid memory map: {0}")]
    Map(#[from] MapError),
}

/// Serialization format of a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TargetFile {
    name: String,
    regions: Vec<MemoryRegion>,
    #[serde(default)]
    rules: RuleSettings,
}

/// A validated memory map together with its rule settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub map: MemoryMap,
    pub rules: RuleSettings,
}

impl TargetConfig {
    /// Built-in RP2040 target with default thresholds.
    pub fn rp2040() -> Self {
        Self { map: MemoryMap::rp2040(), rules: RuleSettings::default() }
    }

    /// Parse and validate a target description.
    pub fn parse(body: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let file: TargetFile = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(body)?,
            ConfigFormat::Json => serde_json::from_str(body)?,
        };
        let map = MemoryMap::new(file.name, file.regions)?;
        Ok(Self { map, rules: file.rules })
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::rp2040()
    }
}

/// Load a target description, picking the format from the file extension.
pub fn load_target_config(path: &Path) -> Result<TargetConfig, ConfigError> {
    let format =
        ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.into()))?;
    let body = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let config = TargetConfig::parse(&body, format)?;
    debug!(
        target = config.map.name(),
        regions = config.map.regions().len(),
        "loaded target description from {}",
        path.display()
    );
    Ok(config)
}
