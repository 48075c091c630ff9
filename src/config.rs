//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesreport.toml` files. Every field defaults to the built-in
//! constants, so running without a file reproduces the stock report.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".salesreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Chart output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Per-chart styling.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// Input table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path of the sales CSV file.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("sales_data.csv")
}

/// Chart output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the chart images are written to. Must already exist.
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Visualization")
}

fn default_width() -> u32 {
    1500
}

fn default_height() -> u32 {
    900
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of records in the most-profitable view.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Number of bins in the age histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_histogram_bins() -> usize {
    20
}

/// Chart geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Histogram,
    Heatmap,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::HorizontalBar => write!(f, "horizontal_bar"),
            ChartKind::Line => write!(f, "line"),
            ChartKind::Histogram => write!(f, "histogram"),
            ChartKind::Heatmap => write!(f, "heatmap"),
        }
    }
}

/// Named colour palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    GnBu,
    Viridis,
    Set3,
    Deep,
    Coolwarm,
}

/// Styling of a single chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub palette: Palette,
    /// File name inside the output directory.
    pub filename: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartSpec {
    fn new(
        kind: ChartKind,
        palette: Palette,
        filename: &str,
        title: &str,
        x_label: &str,
        y_label: &str,
    ) -> Self {
        Self {
            kind,
            palette,
            filename: filename.to_string(),
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
        }
    }
}

/// Styling for each of the six rendered views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default = "default_category_chart")]
    pub category: ChartSpec,

    #[serde(default = "default_monthly_chart")]
    pub monthly: ChartSpec,

    #[serde(default = "default_top_profit_chart")]
    pub top_profit: ChartSpec,

    #[serde(default = "default_age_chart")]
    pub age: ChartSpec,

    #[serde(default = "default_region_chart")]
    pub region: ChartSpec,

    #[serde(default = "default_correlation_chart")]
    pub correlation: ChartSpec,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            category: default_category_chart(),
            monthly: default_monthly_chart(),
            top_profit: default_top_profit_chart(),
            age: default_age_chart(),
            region: default_region_chart(),
            correlation: default_correlation_chart(),
        }
    }
}

fn default_category_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::Bar,
        Palette::GnBu,
        "sales_by_category_seaborn.png",
        "Total Sales by Product Category",
        "Product Category",
        "Total Sales ($)",
    )
}

fn default_monthly_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::Line,
        Palette::Viridis,
        "monthly_sales_trend_seaborn.png",
        "Monthly Sales Trend",
        "Months",
        "Total Sales ($)",
    )
}

fn default_top_profit_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::HorizontalBar,
        Palette::Viridis,
        "top_5_profitable_product_seaborn.png",
        "Top 5 Most Profitable Products",
        "Profit",
        "Order ID",
    )
}

fn default_age_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::Histogram,
        Palette::Deep,
        "age_distribution_seaborn.png",
        "Customer Age Distribution",
        "Customer Age (years)",
        "Count",
    )
}

fn default_region_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::Bar,
        Palette::Set3,
        "sales_by_region_seaborn.png",
        "Best Performing Region by Sales",
        "Region",
        "Total Sales ($)",
    )
}

fn default_correlation_chart() -> ChartSpec {
    ChartSpec::new(
        ChartKind::Heatmap,
        Palette::Coolwarm,
        "correlation_analysis_seaborn.png",
        "Sales-Profit-Rating Correlation Analysis",
        "Business Metrics",
        "Business Metrics",
    )
}

impl ChartsConfig {
    /// Every chart paired with its view name.
    pub fn all(&self) -> [(&'static str, &ChartSpec); 6] {
        [
            ("category", &self.category),
            ("monthly", &self.monthly),
            ("top_profit", &self.top_profit),
            ("age", &self.age),
            ("region", &self.region),
            ("correlation", &self.correlation),
        ]
    }
}

/// Geometries each view can be drawn with.
fn allowed_kinds(view: &str) -> &'static [ChartKind] {
    match view {
        "category" | "monthly" | "region" => &[ChartKind::Bar, ChartKind::Line],
        "top_profit" => &[ChartKind::HorizontalBar],
        "age" => &[ChartKind::Histogram],
        "correlation" => &[ChartKind::Heatmap],
        _ => &[],
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.output.directory = dir.clone();
        }
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.top_n == 0 {
            bail!("analysis.top_n must be at least 1");
        }
        if self.analysis.histogram_bins == 0 {
            bail!("analysis.histogram_bins must be at least 1");
        }
        if self.output.width == 0 || self.output.height == 0 {
            bail!("output.width and output.height must be non-zero");
        }

        for (view, spec) in self.charts.all() {
            if !allowed_kinds(view).contains(&spec.kind) {
                bail!("charts.{} cannot be drawn as a {} chart", view, spec.kind);
            }
            if spec.filename.trim().is_empty() {
                bail!("charts.{}.filename must not be empty", view);
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.path, PathBuf::from("sales_data.csv"));
        assert_eq!(config.output.directory, PathBuf::from("Visualization"));
        assert_eq!(config.analysis.top_n, 5);
        assert_eq!(config.analysis.histogram_bins, 20);
        assert_eq!(config.charts.category.palette, Palette::GnBu);
        assert_eq!(config.charts.correlation.kind, ChartKind::Heatmap);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
path = "data/q3.csv"

[analysis]
top_n = 10

[charts.monthly]
kind = "bar"
palette = "set3"
filename = "months.png"
title = "Sales per Month"
x_label = "Month"
y_label = "USD"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.path, PathBuf::from("data/q3.csv"));
        assert_eq!(config.analysis.top_n, 10);
        assert_eq!(config.analysis.histogram_bins, 20);
        assert_eq!(config.charts.monthly.kind, ChartKind::Bar);
        assert_eq!(config.charts.monthly.palette, Palette::Set3);
        assert_eq!(config.charts.monthly.filename, "months.png");
        // Untouched sections keep their defaults.
        assert_eq!(config.output.directory, PathBuf::from("Visualization"));
        assert_eq!(config.charts.age, default_age_chart());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_mismatched_kind() {
        let mut config = Config::default();
        config.charts.correlation.kind = ChartKind::Line;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.charts.region.kind = ChartKind::Line;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_settings() {
        let mut config = Config::default();
        config.analysis.top_n = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.histogram_bins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[output]\ndirectory = \"charts\"\nwidth = 800\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output.directory, PathBuf::from("charts"));
        assert_eq!(config.output.width, 800);
        assert_eq!(config.output.height, 900);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("filename = \"sales_by_category_seaborn.png\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.charts.top_profit,
            Config::default().charts.top_profit
        );
    }
}
