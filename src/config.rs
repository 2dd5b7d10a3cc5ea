//! Configuration file handling.
//!
//! Settings come from `.noshow.toml` (or `--config`), then CLI arguments
//! override individual values.

use crate::charts::ChartOptions;
use crate::stats::SIGNIFICANCE_THRESHOLD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".noshow.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Chart output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Appointments CSV.
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
    PathBuf::from("noshowappointments-kagglev2-may-2016.csv")
}

/// Chart output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the PNG files.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Chart width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Render charts at all.
    #[serde(default = "default_true")]
    pub charts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            width: default_width(),
            height: default_height(),
            charts: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("charts")
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    500
}

fn default_true() -> bool {
    true
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Histogram bin count (pandas default is 10).
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Threshold for the Welch t-test p-value.
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
            significance_level: default_significance_level(),
        }
    }
}

fn default_histogram_bins() -> usize {
    10
}

fn default_significance_level() -> f64 {
    SIGNIFICANCE_THRESHOLD
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
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

    fn validate(&self) -> Result<()> {
        if self.analysis.histogram_bins == 0 {
            anyhow::bail!("analysis.histogram_bins must be at least 1");
        }
        let alpha = self.analysis.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            anyhow::bail!("analysis.significance_level must be between 0 and 1");
        }
        if self.output.width == 0 || self.output.height == 0 {
            anyhow::bail!("output.width and output.height must be positive");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.output.dir = dir.clone();
        }
        if let Some(bins) = args.bins {
            self.analysis.histogram_bins = bins;
        }
        if args.no_charts {
            self.output.charts = false;
        }
    }

    /// Chart renderer settings.
    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            output_dir: self.output.dir.clone(),
            width: self.output.width,
            height: self.output.height,
            histogram_bins: self.analysis.histogram_bins,
        }
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
    use crate::cli::Args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.input.path,
            PathBuf::from("noshowappointments-kagglev2-may-2016.csv")
        );
        assert_eq!(config.output.dir, PathBuf::from("charts"));
        assert_eq!(config.analysis.histogram_bins, 10);
        assert!(config.output.charts);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
path = "data/appointments.csv"

[output]
dir = "out"
width = 800

[analysis]
histogram_bins = 25
significance_level = 0.01
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.path, PathBuf::from("data/appointments.csv"));
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.width, 800);
        assert_eq!(config.output.height, 500);
        assert_eq!(config.analysis.histogram_bins, 25);
        assert_eq!(config.analysis.significance_level, 0.01);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[analysis]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.analysis.histogram_bins, 10);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[analysis]\nhistogram_bins = 0\n").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_args_override_config() {
        let mut config = Config::default();
        let args = Args {
            input: Some(PathBuf::from("other.csv")),
            bins: Some(30),
            no_charts: true,
            ..Default::default()
        };

        config.merge_with_args(&args);
        assert_eq!(config.input.path, PathBuf::from("other.csv"));
        assert_eq!(config.output.dir, PathBuf::from("charts"));
        assert_eq!(config.analysis.histogram_bins, 30);
        assert!(!config.output.charts);
        assert_eq!(config.chart_options().histogram_bins, 30);
    }
}
