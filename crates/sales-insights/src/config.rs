//! Configuration types for the sales insights pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory reports and charts land in unless configured otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = "./outputs";

/// Which artefacts a pipeline run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Text report only
    Report,
    /// One PNG per chart view
    Charts,
    /// All chart views combined on a single grid image
    Dashboard,
    /// Report, individual charts and dashboard
    #[default]
    All,
}

impl OutputMode {
    pub fn wants_report(&self) -> bool {
        matches!(self, Self::Report | Self::All)
    }

    pub fn wants_charts(&self) -> bool {
        matches!(self, Self::Charts | Self::All)
    }

    pub fn wants_dashboard(&self) -> bool {
        matches!(self, Self::Dashboard | Self::All)
    }
}

/// Configuration for the sales pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_insights::config::{OutputMode, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .target_year(2023)
///     .output_mode(OutputMode::Report)
///     .output_dir("reports")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Calendar year the aggregates are computed for.
    /// Default: 2023
    pub target_year: i32,

    /// Artefacts to produce.
    /// Default: All
    pub output_mode: OutputMode,

    /// Output directory for reports and charts.
    /// Default: "./outputs"
    pub output_dir: PathBuf,

    /// Custom base name for the text report (without extension).
    /// If None, uses "sales_report_{year}".
    /// Default: None
    pub output_name: Option<String>,

    /// Field delimiter of the input file.
    /// Default: b'\t'
    pub delimiter: u8,

    /// Whether to run the non-fatal data quality checks.
    /// Default: true
    pub check_data_quality: bool,

    /// Allowed absolute difference between total_price and
    /// quantity * price_per_unit before a record is flagged.
    /// Default: 0.01
    pub total_price_tolerance: f64,

    /// Width in pixels of an individual chart. The dashboard is three times wider.
    /// Default: 1000
    pub chart_width: u32,

    /// Height in pixels of an individual chart. The dashboard is three times taller.
    /// Default: 600
    pub chart_height: u32,

    /// Whether to write the report and charts to disk.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_year: 2023,
            output_mode: OutputMode::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_name: None,
            delimiter: b'\t',
            check_data_quality: true,
            total_price_tolerance: 0.01,
            chart_width: 1000,
            chart_height: 600,
            save_to_disk: true,
        }
    }
}

/// Smallest accepted chart dimension in pixels.
const MIN_CHART_DIMENSION: u32 = 200;

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Base name (without extension) of the text report.
    pub fn report_name(&self) -> String {
        self.output_name
            .clone()
            .unwrap_or_else(|| format!("sales_report_{}", self.target_year))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(1..=9999).contains(&self.target_year) {
            return Err(ConfigValidationError::InvalidYear(self.target_year));
        }

        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(ConfigValidationError::InvalidDelimiter(self.delimiter));
        }

        if !self.total_price_tolerance.is_finite() || self.total_price_tolerance < 0.0 {
            return Err(ConfigValidationError::InvalidTolerance(
                self.total_price_tolerance,
            ));
        }

        if self.chart_width < MIN_CHART_DIMENSION || self.chart_height < MIN_CHART_DIMENSION {
            return Err(ConfigValidationError::InvalidChartSize {
                width: self.chart_width,
                height: self.chart_height,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid target year: {0} (must be between 1 and 9999)")]
    InvalidYear(i32),

    #[error("Invalid delimiter byte {0:#04x} (must be ASCII and not a quote or line break)")]
    InvalidDelimiter(u8),

    #[error("Invalid total price tolerance: {0} (must be finite and >= 0)")]
    InvalidTolerance(f64),

    #[error("Invalid chart size {width}x{height} (each side must be at least 200 pixels)")]
    InvalidChartSize { width: u32, height: u32 },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    target_year: Option<i32>,
    output_mode: Option<OutputMode>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    delimiter: Option<u8>,
    check_data_quality: Option<bool>,
    total_price_tolerance: Option<f64>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the calendar year to analyze.
    pub fn target_year(mut self, year: i32) -> Self {
        self.target_year = Some(year);
        self
    }

    /// Set which artefacts the pipeline produces.
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = Some(mode);
        self
    }

    /// Set the output directory for reports and charts.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set a custom base name for the text report.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Set the field delimiter of the input file.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Enable or disable the data quality checks.
    pub fn check_data_quality(mut self, enable: bool) -> Self {
        self.check_data_quality = Some(enable);
        self
    }

    /// Set the tolerance used by the total price consistency check.
    ///
    /// # Arguments
    /// * `tolerance` - Absolute amount, e.g. 0.01 for one cent
    pub fn total_price_tolerance(mut self, tolerance: f64) -> Self {
        self.total_price_tolerance = Some(tolerance);
        self
    }

    /// Set the size of an individual chart in pixels.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Enable or disable writing outputs to disk.
    ///
    /// When false, the pipeline keeps results in memory only and skips
    /// all file I/O.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            target_year: self.target_year.unwrap_or(defaults.target_year),
            output_mode: self.output_mode.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
            check_data_quality: self.check_data_quality.unwrap_or(true),
            total_price_tolerance: self
                .total_price_tolerance
                .unwrap_or(defaults.total_price_tolerance),
            chart_width: self.chart_width.unwrap_or(defaults.chart_width),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
            save_to_disk: self.save_to_disk.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_year, 2023);
        assert_eq!(config.output_mode, OutputMode::All);
        assert_eq!(config.delimiter, b'\t');
        assert_eq!(config.total_price_tolerance, 0.01);
        assert!(config.check_data_quality);
        assert!(config.save_to_disk);
        assert_eq!(config.output_dir, PathBuf::from("./outputs"));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .target_year(2022)
            .output_mode(OutputMode::Charts)
            .output_dir("charts_out")
            .output_name("q4")
            .delimiter(b',')
            .check_data_quality(false)
            .chart_size(800, 400)
            .save_to_disk(false)
            .build()
            .unwrap();

        assert_eq!(config.target_year, 2022);
        assert_eq!(config.output_mode, OutputMode::Charts);
        assert_eq!(config.output_dir, PathBuf::from("charts_out"));
        assert_eq!(config.report_name(), "q4");
        assert_eq!(config.delimiter, b',');
        assert!(!config.check_data_quality);
        assert_eq!((config.chart_width, config.chart_height), (800, 400));
        assert!(!config.save_to_disk);
    }

    #[test]
    fn test_report_name_defaults_to_year() {
        let config = PipelineConfig::builder().target_year(2021).build().unwrap();
        assert_eq!(config.report_name(), "sales_report_2021");
    }

    #[test]
    fn test_output_mode_selection() {
        assert!(OutputMode::Report.wants_report());
        assert!(!OutputMode::Report.wants_charts());
        assert!(OutputMode::Charts.wants_charts());
        assert!(!OutputMode::Charts.wants_dashboard());
        assert!(OutputMode::Dashboard.wants_dashboard());
        assert!(!OutputMode::Dashboard.wants_report());
        let all = OutputMode::All;
        assert!(all.wants_report() && all.wants_charts() && all.wants_dashboard());
    }

    #[test]
    fn test_validation_invalid_year() {
        let result = PipelineConfig::builder().target_year(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidYear(0)
        ));
    }

    #[test]
    fn test_validation_invalid_delimiter() {
        let result = PipelineConfig::builder().delimiter(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDelimiter(b'"')
        ));
    }

    #[test]
    fn test_validation_invalid_tolerance() {
        let result = PipelineConfig::builder()
            .total_price_tolerance(-1.0)
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTolerance(_)
        ));

        let result = PipelineConfig::builder()
            .total_price_tolerance(f64::NAN)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_invalid_chart_size() {
        let result = PipelineConfig::builder().chart_size(100, 600).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidChartSize {
                width: 100,
                height: 600
            }
        ));
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "target_year": 2024,
            "output_mode": "Dashboard",
            "output_dir": "custom_output",
            "output_name": "yearly",
            "delimiter": 44,
            "check_data_quality": false,
            "total_price_tolerance": 0.5,
            "chart_width": 1200,
            "chart_height": 800,
            "save_to_disk": false
        }"#;

        let config: PipelineConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.target_year, 2024);
        assert_eq!(config.output_mode, OutputMode::Dashboard);
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
        assert_eq!(config.output_name, Some("yearly".to_string()));
        assert_eq!(config.delimiter, b',');
        assert!(!config.check_data_quality);
        assert_eq!(config.total_price_tolerance, 0.5);
        assert!(config.validate().is_ok());
    }
}
