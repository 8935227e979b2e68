//! Upload processing configuration.
//!
//! Handles loading, validating, and merging `tribe-images.toml`. Stock
//! defaults are the values the upload forms have always used; a config file
//! only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [validation]
//! max_size_mb = 10          # Largest accepted upload, in MB
//!
//! [resize]                  # Plain resize: one encode, no size budget
//! max_width = 800
//! max_height = 600
//! quality = 0.8             # JPEG quality factor (0.1 - 1.0)
//!
//! [compress]                # Resize + quality search against a budget
//! max_width = 1200
//! max_height = 800
//! quality = 0.8             # Starting quality for the search
//! max_size_kb = 500         # Target size of the output
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! decode_timeout_ms = 30000 # Async API: give up on a pipeline after this long
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Bounds, CompressOptions, Quality, ResizeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tribe-images.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Upload configuration loaded from `tribe-images.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Validator policy.
    pub validation: ValidationConfig,
    /// Plain resize path.
    pub resize: ResizeConfig,
    /// Compression path.
    pub compress: CompressConfig,
    /// Parallelism and timeouts.
    pub processing: ProcessingConfig,
}

impl UploadConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_mb = self.validation.max_size_mb;
        if !max_mb.is_finite() || max_mb <= 0.0 {
            return Err(ConfigError::Validation(
                "validation.max_size_mb must be a finite number greater than 0".into(),
            ));
        }
        check_bounds("resize", self.resize.max_width, self.resize.max_height)?;
        check_bounds("compress", self.compress.max_width, self.compress.max_height)?;
        check_quality("resize", self.resize.quality)?;
        check_quality("compress", self.compress.quality)?;
        if self.compress.max_size_kb == 0 {
            return Err(ConfigError::Validation(
                "compress.max_size_kb must be greater than 0".into(),
            ));
        }
        if self.processing.decode_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "processing.decode_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn check_bounds(section: &str, max_width: u32, max_height: u32) -> Result<(), ConfigError> {
    if max_width == 0 || max_height == 0 {
        return Err(ConfigError::Validation(format!(
            "{section}.max_width and {section}.max_height must be non-zero"
        )));
    }
    Ok(())
}

fn check_quality(section: &str, quality: f64) -> Result<(), ConfigError> {
    if !(0.1..=1.0).contains(&quality) {
        return Err(ConfigError::Validation(format!(
            "{section}.quality must be between 0.1 and 1.0"
        )));
    }
    Ok(())
}

/// Validator policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Largest accepted upload in megabytes.
    pub max_size_mb: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: crate::validate::DEFAULT_MAX_SIZE_MB,
        }
    }
}

/// Plain resize settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality factor, 0.1 (worst) to 1.0 (best).
    pub quality: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        let options = ResizeOptions::default();
        Self {
            max_width: options.bounds.max_width,
            max_height: options.bounds.max_height,
            quality: options.quality.factor(),
        }
    }
}

impl ResizeConfig {
    pub fn to_options(&self) -> ResizeOptions {
        ResizeOptions {
            bounds: Bounds::new(self.max_width, self.max_height),
            quality: Quality::from_factor(self.quality),
        }
    }
}

/// Compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Starting JPEG quality factor for the search.
    pub quality: f64,
    /// Target output size in KB.
    pub max_size_kb: u32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        let options = CompressOptions::default();
        Self {
            max_width: options.bounds.max_width,
            max_height: options.bounds.max_height,
            quality: options.quality.factor(),
            max_size_kb: options.max_size_kb,
        }
    }
}

impl CompressConfig {
    pub fn to_options(&self) -> CompressOptions {
        CompressOptions {
            bounds: Bounds::new(self.max_width, self.max_height),
            quality: Quality::from_factor(self.quality),
            max_size_kb: self.max_size_kb,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel pipelines for batch runs.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Upper bound on one async pipeline run, in milliseconds.
    pub decode_timeout_ms: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: None,
            decode_timeout_ms: 30_000,
        }
    }
}

impl ProcessingConfig {
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.decode_timeout_ms)
    }
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
    // A struct of plain numbers always serializes.
    toml::Value::try_from(UploadConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<UploadConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: UploadConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the stock defaults; a file that exists but does
/// not parse or validate is an error.
pub fn load_config(path: &Path) -> Result<UploadConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `tribe-images.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tribe-images configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Validation (runs before any decoding)
# ---------------------------------------------------------------------------
[validation]
# Largest accepted upload, in megabytes.
max_size_mb = 10.0

# ---------------------------------------------------------------------------
# Plain resize: fit within the box, encode once as JPEG
# ---------------------------------------------------------------------------
[resize]
max_width = 800
max_height = 600
# JPEG quality factor, 0.1 (smallest) to 1.0 (best).
quality = 0.8

# ---------------------------------------------------------------------------
# Compression: fit within the box, then lower quality by 0.1 per attempt
# until the data URL fits max_size_kb (or quality reaches 0.1)
# ---------------------------------------------------------------------------
[compress]
max_width = 1200
max_height = 800
quality = 0.8
max_size_kb = 500

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel pipelines for batch runs.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Async callers give up on a single pipeline after this many milliseconds.
decode_timeout_ms = 30000
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_upload_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.validation.max_size_mb, 10.0);
        assert_eq!((config.resize.max_width, config.resize.max_height), (800, 600));
        assert_eq!(config.resize.quality, 0.8);
        assert_eq!(
            (config.compress.max_width, config.compress.max_height),
            (1200, 800)
        );
        assert_eq!(config.compress.max_size_kb, 500);
        assert_eq!(config.processing.max_processes, None);
        assert_eq!(config.processing.decode_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn default_config_is_valid() {
        UploadConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let config: UploadConfig = toml::from_str(
            r#"
[compress]
max_size_kb = 200
"#,
        )
        .unwrap();
        assert_eq!(config.compress.max_size_kb, 200);
        // Defaults preserved
        assert_eq!(config.compress.max_width, 1200);
        assert_eq!(config.resize.max_width, 800);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<UploadConfig, _> = toml::from_str(
            r#"
[compress]
max_size = 200
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn options_conversion() {
        let config = UploadConfig::default();
        assert_eq!(config.resize.to_options(), ResizeOptions::default());
        assert_eq!(config.compress.to_options(), CompressOptions::default());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: UploadConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, UploadConfig::default());
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut config = UploadConfig::default();
        config.compress.quality = 0.05;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = UploadConfig::default();
        config.resize.quality = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_bounds_and_budget() {
        let mut config = UploadConfig::default();
        config.resize.max_height = 0;
        assert!(config.validate().is_err());

        let mut config = UploadConfig::default();
        config.compress.max_size_kb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_size_ceiling() {
        let mut config = UploadConfig::default();
        config.validation.max_size_mb = 0.0;
        assert!(config.validate().is_err());

        config.validation.max_size_mb = f64::NAN;
        assert!(config.validate().is_err());

        config.validation.max_size_mb = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = effective_threads(&ProcessingConfig::default());
        assert!(cores >= 1);
        let one = ProcessingConfig {
            max_processes: Some(1),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&one), 1);
        let many = ProcessingConfig {
            max_processes: Some(10_000),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&many), cores);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, UploadConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[validation]
max_size_mb = 5

[resize]
quality = 0.6
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.validation.max_size_mb, 5.0);
        assert_eq!(config.resize.quality, 0.6);
        assert_eq!(config.resize.max_width, 800);
    }

    #[test]
    fn load_config_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[resize\nmax_width = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_rejects_infinite_size_ceiling() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[validation]\nmax_size_mb = inf\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_invalid_value_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[compress]\nquality = 2.0\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }
}
