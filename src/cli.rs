//! Command-line interface argument parsing.
//!
//! Every option is optional: with no arguments the program reads the
//! default export from the current directory and writes charts to
//! `./charts`.

use clap::Parser;
use std::path::PathBuf;

/// Medical appointment no-show analysis
///
/// Loads the appointments CSV, cleans it, prints descriptive statistics for
/// three attendance questions (age, SMS reminder, awaiting time) and writes
/// PNG charts.
///
/// Examples:
///   noshow_eda
///   noshow_eda noshowappointments-kagglev2-may-2016.csv --output-dir out
///   noshow_eda data.csv --no-charts
///   noshow_eda --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Appointments CSV to analyze
    ///
    /// Defaults to the `[input] path` of the config file.
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory for the chart images
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .noshow.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of histogram bins
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Skip chart rendering and only print the report
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Write a default .noshow.toml to the current directory and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.bins == Some(0) {
            return Err("Bins must be at least 1".to_string());
        }

        if let Some(ref config) = self.config {
            if !config.is_file() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_input() {
        let args = Args::try_parse_from(["noshow_eda", "data.csv", "-o", "out", "--bins", "20"])
            .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("data.csv")));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.bins, Some(20));
        assert!(!args.no_charts);
    }

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["noshow_eda"]).unwrap();
        assert!(args.input.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = Args {
            verbose: true,
            quiet: true,
            ..Default::default()
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_bins() {
        let args = Args {
            bins: Some(0),
            ..Default::default()
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::default();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
