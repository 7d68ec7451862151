//! Session configuration.
//!
//! Handles loading and validating an optional `rasterfit.toml`. Every field has
//! a default, so a missing file or an empty file both yield the stock
//! configuration.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! background = [255, 255, 255]  # Canvas fill color (r, g, b)
//! quality = 90                  # JPEG quality for save() (1-100)
//! filter = "catmullrom"         # nearest | triangle | catmullrom | gaussian | lanczos3
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! In-memory and streamed output ([`to_bytes`](crate::ImageSession::to_bytes),
//! [`show`](crate::ImageSession::show)) always encode at quality 100 and are
//! not affected by `quality`.

use crate::imaging::{Color, Quality};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Session configuration loaded from TOML.
///
/// All fields have sensible defaults. Config files need only specify the
/// values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Canvas fill color as `[r, g, b]`.
    pub background: [u8; 3],
    /// JPEG quality used by `save`.
    pub quality: u32,
    /// Resampling filter for scaled copies.
    pub filter: ResampleFilter,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
            quality: Quality::default().value(),
            filter: ResampleFilter::default(),
        }
    }
}

impl SessionConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        Ok(())
    }

    pub fn background_color(&self) -> Color {
        Color::from(self.background)
    }

    pub fn save_quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

/// Resampling filter names accepted in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(f: ResampleFilter) -> Self {
        match f {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<SessionConfig, ConfigError> {
    let config: SessionConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// A documented config file with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# rasterfit configuration
# All options are optional. Values below are the defaults.

# Fill color for new canvases (letterboxing in fit mode, corners uncovered by
# free rotation), as [r, g, b].
background = [255, 255, 255]

# JPEG quality used when saving (1-100). In-memory output always uses 100.
quality = 90

# Resampling filter for scaled copies:
# nearest | triangle | catmullrom | gaussian | lanczos3
filter = "catmullrom"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SessionConfig::default();
        assert_eq!(config.background, [255, 255, 255]);
        assert_eq!(config.quality, 90);
        assert_eq!(config.filter, ResampleFilter::CatmullRom);
        assert_eq!(config.background_color(), Color::WHITE);
    }

    #[test]
    fn parse_partial_config() {
        let config = parse_config("background = [0, 0, 0]").unwrap();
        assert_eq!(config.background_color(), Color::new(0, 0, 0));
        assert_eq!(config.quality, 90);
    }

    #[test]
    fn parse_filter_names() {
        let config = parse_config(r#"filter = "lanczos3""#).unwrap();
        assert_eq!(FilterType::from(config.filter), FilterType::Lanczos3);
        let config = parse_config(r#"filter = "nearest""#).unwrap();
        assert_eq!(FilterType::from(config.filter), FilterType::Nearest);
    }

    #[test]
    fn stock_config_matches_defaults() {
        let config = parse_config(stock_config_toml()).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn unknown_key_rejected() {
        let result = parse_config("backgroud = [1, 2, 3]");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_filter_rejected() {
        assert!(parse_config(r#"filter = "bicubic""#).is_err());
    }

    #[test]
    fn validate_quality_boundaries() {
        assert!(parse_config("quality = 1").is_ok());
        assert!(parse_config("quality = 100").is_ok());
        assert!(matches!(
            parse_config("quality = 0"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("quality = 101"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn out_of_range_color_component_is_parse_error() {
        assert!(matches!(
            parse_config("background = [256, 0, 0]"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("rasterfit.toml")).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rasterfit.toml");
        fs::write(&path, "quality = 75\nbackground = [10, 20, 30]\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.save_quality().value(), 75);
        assert_eq!(config.background_color(), Color::new(10, 20, 30));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rasterfit.toml");
        fs::write(&path, "quality = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }
}
