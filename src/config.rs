//! Resizer configuration.
//!
//! Handles loading, validating, and merging `resize.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "scaled"     # Where scaled copies are written
//! prefix = "scaled_"        # Prepended to the source file name
//!
//! [images]
//! default_quality = 100     # JPEG quality when only a size hint is given (1-100)
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [exif]
//! copy = true               # Carry whitelisted EXIF fields onto scaled copies
//! tags = ["Make", "Model", "Orientation", ...]
//!
//! [cache]
//! enabled = true            # Reuse scaled copies when source and parameters match
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Filter;
use crate::metadata::{self, DEFAULT_TAGS};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the config directory.
pub const CONFIG_FILENAME: &str = "resize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resizer configuration loaded from `resize.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Directory scaled copies are written to. Created on demand.
    pub output_dir: String,
    /// Prefix prepended to the source file name.
    pub prefix: String,
    /// Encoding settings.
    pub images: ImagesConfig,
    /// EXIF carry-over settings.
    pub exif: ExifConfig,
    /// Scaled-output cache settings.
    pub cache: CacheConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            output_dir: "scaled".to_string(),
            prefix: naming::DEFAULT_PREFIX.to_string(),
            images: ImagesConfig::default(),
            exif: ExifConfig::default(),
            cache: CacheConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ResizeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.default_quality) {
            return Err(ConfigError::Validation(
                "images.default_quality must be 1-100".into(),
            ));
        }
        if !naming::is_valid_prefix(&self.prefix) {
            return Err(ConfigError::Validation(format!(
                "prefix {:?} must be non-empty and contain no path separators",
                self.prefix
            )));
        }
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        if let Some(unknown) = self
            .exif
            .tags
            .iter()
            .find(|t| metadata::tag_by_name(t).is_none())
        {
            return Err(ConfigError::Validation(format!(
                "exif.tags: unknown tag {unknown:?}"
            )));
        }
        Ok(())
    }
}

/// Encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG quality used when a resize is triggered by a size hint alone.
    pub default_quality: u32,
    /// Resampling filter for the final resize.
    pub filter: Filter,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            default_quality: 100,
            filter: Filter::default(),
        }
    }
}

/// EXIF carry-over settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExifConfig {
    /// Copy whitelisted EXIF fields onto scaled copies.
    pub copy: bool,
    /// Tag names to copy.
    pub tags: Vec<String>,
}

impl Default for ExifConfig {
    fn default() -> Self {
        Self {
            copy: true,
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Scaled-output cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ResizeConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `resize.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResizeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `resize.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<ResizeConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `resize.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# picker-resize configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Directory scaled copies are written to. Created if missing.
output_dir = "scaled"

# Prefix prepended to the source file name: photo.jpg -> scaled_photo.jpg
prefix = "scaled_"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[images]
# JPEG quality (1-100) used when a resize is requested by size alone.
# Images with transparency are always written as lossless PNG.
default_quality = 100

# Resampling filter: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# ---------------------------------------------------------------------------
# EXIF
# ---------------------------------------------------------------------------
[exif]
# Carry EXIF fields from the source onto the scaled copy.
copy = true

# Fields to carry. Size-related fields are never copied.
tags = [
    "FNumber",
    "ExposureTime",
    "ISOSpeedRatings",
    "GPSAltitude",
    "GPSAltitudeRef",
    "FocalLength",
    "GPSDateStamp",
    "WhiteBalance",
    "GPSProcessingMethod",
    "GPSTimeStamp",
    "DateTime",
    "Flash",
    "GPSLatitude",
    "GPSLatitudeRef",
    "GPSLongitude",
    "GPSLongitudeRef",
    "Make",
    "Model",
    "Orientation",
]

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
[cache]
# Reuse scaled copies when neither the source nor the parameters changed.
enabled = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
