//! Config file for the `drizzle` binary.

use anyhow::{Context, Result};
use drizzle::{Overflow, config::PipelineConfig, droplet::GRAVITY};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub rain: RainConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    #[serde(default = "PipelineSection::default_frame_rate")]
    pub frame_rate: f64,
    #[serde(default = "PipelineSection::default_max_drops")]
    pub max_drops: usize,
    #[serde(default = "PipelineSection::default_gravity")]
    pub gravity: f64,
    #[serde(default)]
    pub overflow: OverflowSetting,
}

impl PipelineSection {
    fn default_frame_rate() -> f64 {
        25.0
    }
    fn default_max_drops() -> usize {
        1000
    }
    fn default_gravity() -> f64 {
        GRAVITY
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            frame_rate: Self::default_frame_rate(),
            max_drops: Self::default_max_drops(),
            gravity: Self::default_gravity(),
            overflow: OverflowSetting::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowSetting {
    #[default]
    DropOldest,
    Reject,
}

impl From<OverflowSetting> for Overflow {
    fn from(setting: OverflowSetting) -> Self {
        match setting {
            OverflowSetting::DropOldest => Overflow::DropOldest,
            OverflowSetting::Reject => Overflow::Reject,
        }
    }
}

/// How new droplets are made.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RainConfig {
    #[serde(default = "RainConfig::default_min_radius")]
    pub min_radius: u32,
    #[serde(default = "RainConfig::default_max_radius")]
    pub max_radius: u32,
    /// Delay between droplets is a random multiple of this.
    #[serde(default = "RainConfig::default_interval_step_ms")]
    pub interval_step_ms: u64,
    /// Number of possible multiples, starting from zero.
    #[serde(default = "RainConfig::default_interval_steps")]
    pub interval_steps: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RainConfig {
    fn default_min_radius() -> u32 {
        2
    }
    fn default_max_radius() -> u32 {
        7
    }
    fn default_interval_step_ms() -> u64 {
        20
    }
    fn default_interval_steps() -> u32 {
        10
    }
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            min_radius: Self::default_min_radius(),
            max_radius: Self::default_max_radius(),
            interval_step_ms: Self::default_interval_step_ms(),
            interval_steps: Self::default_interval_steps(),
            seed: None,
        }
    }
}

/// The pane droplets run down, in pixels, and the terminal grid it is shown on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "DisplayConfig::default_width")]
    pub width: f64,
    #[serde(default = "DisplayConfig::default_height")]
    pub height: f64,
    #[serde(default = "DisplayConfig::default_columns")]
    pub columns: usize,
    #[serde(default = "DisplayConfig::default_rows")]
    pub rows: usize,
    #[serde(default)]
    pub headless: bool,
}

impl DisplayConfig {
    fn default_width() -> f64 {
        800.0
    }
    fn default_height() -> f64 {
        480.0
    }
    fn default_columns() -> usize {
        100
    }
    fn default_rows() -> usize {
        30
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            columns: Self::default_columns(),
            rows: Self::default_rows(),
            headless: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Pipeline(#[from] drizzle::error::ConfigError),
    #[error("rain radius range {min}..={max} is empty or starts at zero")]
    RadiusRange { min: u32, max: u32 },
    #[error("rain delay of {steps} steps of {step_ms}ms is always zero")]
    ZeroDelay { step_ms: u64, steps: u32 },
    #[error("display size {width}x{height} must be positive and finite")]
    DisplaySize { width: f64, height: f64 },
    #[error("display grid {columns}x{rows} must be non-empty")]
    DisplayGrid { columns: usize, rows: usize },
}

impl Config {
    /// Load from a TOML file, or use defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline_config().validate()?;

        let rain = &self.rain;
        if rain.min_radius == 0 || rain.min_radius > rain.max_radius {
            return Err(ConfigError::RadiusRange { min: rain.min_radius, max: rain.max_radius });
        }
        if rain.interval_step_ms == 0 || rain.interval_steps < 2 {
            return Err(ConfigError::ZeroDelay {
                step_ms: rain.interval_step_ms,
                steps: rain.interval_steps,
            });
        }

        let display = &self.display;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(display.width) && positive(display.height)) {
            return Err(ConfigError::DisplaySize { width: display.width, height: display.height });
        }
        if display.columns == 0 || display.rows == 0 {
            return Err(ConfigError::DisplayGrid { columns: display.columns, rows: display.rows });
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            frame_rate: self.pipeline.frame_rate,
            max_drops: self.pipeline.max_drops,
            gravity: self.pipeline.gravity,
            overflow: self.pipeline.overflow.into(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
            [pipeline]
            frame_rate = 60.0
            overflow = "reject"

            [rain]
            max_radius = 4
            seed = 7

            [display]
            headless = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.pipeline.frame_rate, 60.0);
        assert_eq!(config.pipeline.max_drops, 1000);
        assert_eq!(config.pipeline_config().overflow, Overflow::Reject);
        assert_eq!(config.rain.min_radius, 2);
        assert_eq!(config.rain.max_radius, 4);
        assert_eq!(config.rain.seed, Some(7));
        assert!(config.display.headless);
        assert_eq!(config.display.columns, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        config.rain.min_radius = 9;
        assert_eq!(config.validate(), Err(ConfigError::RadiusRange { min: 9, max: 7 }));

        let mut config = Config::default();
        config.pipeline.max_drops = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Pipeline(_))));

        let mut config = Config::default();
        config.rain.interval_steps = 1;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDelay { step_ms: 20, steps: 1 }));

        let mut config = Config::default();
        config.rain.interval_step_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDelay { .. })));

        let mut config = Config::default();
        config.display.width = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::DisplaySize { .. })));

        let config: Config = toml::from_str("[display]\nheight = inf\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::DisplaySize { .. })));

        let mut config = Config::default();
        config.display.rows = 0;
        assert!(matches!(config.validate(), Err(ConfigError::DisplayGrid { .. })));
    }

    #[test]
    fn unknown_overflow_fails_to_parse() {
        let result: Result<Config, _> = toml::from_str("[pipeline]\noverflow = \"block\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_file_or_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());

        let path = dir.path().join("drizzle.toml");
        fs::write(&path, "[display]\nrows = 12\n").unwrap();
        assert_eq!(Config::load_or_default(&path).unwrap().display.rows, 12);

        fs::write(&path, "[display\n").unwrap();
        let err = Config::load_or_default(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }
}
