//! CSV Data Loader Module
//! Reads the appointments export into a Polars DataFrame checked against
//! the raw schema.

use crate::data::schema::{AppointmentRecord, RAW_HEADER};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unexpected header in {path}: expected [{expected}], found [{found}]")]
    HeaderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Column {column} has {count} missing values")]
    MissingValue { column: String, count: usize },
}

/// Loads the appointments CSV.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars with the fixed appointment schema.
    ///
    /// The header is compared to the expected column list before any row is
    /// decoded; cells are then parsed strictly against their dtypes.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        Self::check_header(path)?;

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_schema(Some(Arc::new(AppointmentRecord::raw_schema())))
            .finish()?
            .collect()?;

        Self::check_no_missing_values(&df)?;

        info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Read the first line and compare it against the expected header.
    fn check_header(path: &Path) -> Result<(), LoaderError> {
        let io_err = |source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut first_line = String::new();
        BufReader::new(file)
            .read_line(&mut first_line)
            .map_err(io_err)?;

        let found = Self::parse_header(&first_line);
        debug!("Header: {:?}", found);

        if found != RAW_HEADER {
            return Err(LoaderError::HeaderMismatch {
                path: path.to_path_buf(),
                expected: RAW_HEADER.join(", "),
                found: found.join(", "),
            });
        }
        Ok(())
    }

    fn parse_header(line: &str) -> Vec<String> {
        line.trim_start_matches('\u{feff}')
            .trim_end_matches(['\r', '\n'])
            .split(',')
            .map(|name| name.trim().trim_matches('"').to_string())
            .collect()
    }

    fn check_no_missing_values(df: &DataFrame) -> Result<(), LoaderError> {
        match df
            .get_columns()
            .iter()
            .find(|col| col.null_count() > 0)
        {
            Some(col) => Err(LoaderError::MissingValue {
                column: col.name().to_string(),
                count: col.null_count(),
            }),
            None => Ok(()),
        }
    }
}
