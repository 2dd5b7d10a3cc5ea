//! Data Cleaner Module
//! Ordered cleaning pipeline for the raw appointments table.
//!
//! Every step takes the frame produced by the previous one and returns a
//! new frame, so each can be exercised on its own. `DataCleaner::clean`
//! runs them in the order below; later steps rely on the renames and
//! derived columns of earlier ones.
//!
//! 1. drop `PatientId` / `AppointmentID`
//! 2. drop rows with `Age < 0`
//! 3. drop rows with `Handcap` outside {0, 1}
//! 4. rename `No-show` to `No_show`
//! 5. map the attendance label to 1 (attended) / 0 (missed)
//! 6. parse `ScheduledDay` / `AppointmentDay` to dates at midnight
//! 7. derive `awaiting_time` in days
//! 8. drop rows with `awaiting_time < 0`
//! 9. add a dense `index` column

use crate::data::schema::columns::*;
use crate::data::schema::{AppointmentRecord, Attendance};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

/// Days from 0001-01-01 to 1970-01-01, the epoch of Polars `Date` values.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Input row number carried through the filters for error messages.
const SOURCE_ROW: &str = "source_row";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unrecognized attendance label {value:?} at data row {row}")]
    UnknownLabel { row: usize, value: String },
    #[error("Invalid date {value:?} in column {column} at data row {row}")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Column {column} has unsupported type {dtype}")]
    UnexpectedType { column: String, dtype: DataType },
    #[error("Cleaned table does not match the appointment schema: {0}")]
    SchemaMismatch(String),
    #[error("Cleaning removed every row; nothing left to analyze")]
    EmptyResult,
}

/// Row counts collected while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub removed_negative_age: usize,
    pub removed_invalid_handicap: usize,
    pub removed_negative_awaiting: usize,
    pub rows_after: usize,
}

impl CleaningSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// Output of the cleaning pipeline.
#[derive(Debug, Clone)]
pub struct CleanedAppointments {
    pub df: DataFrame,
    pub summary: CleaningSummary,
}

/// Cleaning transforms for the appointments table.
pub struct DataCleaner;

impl DataCleaner {
    /// Run every cleaning step in order.
    pub fn clean(raw: &DataFrame) -> Result<CleanedAppointments, CleanerError> {
        let mut summary = CleaningSummary {
            rows_before: raw.height(),
            ..Default::default()
        };

        let df = Self::drop_identifiers(raw)?.with_row_index(SOURCE_ROW.into(), None)?;

        let df_age = Self::drop_negative_age(&df)?;
        summary.removed_negative_age = df.height() - df_age.height();

        let df_handicap = Self::drop_invalid_handicap(&df_age)?;
        summary.removed_invalid_handicap = df_age.height() - df_handicap.height();

        let df = Self::rename_attendance(&df_handicap)?;
        let df = Self::remap_attendance(&df).map_err(|e| Self::locate(e, &df))?;
        let df = Self::parse_dates(&df).map_err(|e| Self::locate(e, &df))?;
        let df = Self::derive_awaiting_time(&df)?;

        let df_awaiting = Self::drop_negative_awaiting(&df)?;
        summary.removed_negative_awaiting = df.height() - df_awaiting.height();

        let df = Self::reset_index(&df_awaiting)?;
        summary.rows_after = df.height();

        debug!("Cleaning summary: {:?}", summary);
        info!(
            "Cleaned table: {} of {} rows kept ({} with negative age, {} with invalid handicap, {} with negative awaiting time removed)",
            summary.rows_after,
            summary.rows_before,
            summary.removed_negative_age,
            summary.removed_invalid_handicap,
            summary.removed_negative_awaiting
        );

        if df.height() == 0 {
            return Err(CleanerError::EmptyResult);
        }

        let mismatches =
            AppointmentRecord::schema_mismatches(&df, &AppointmentRecord::cleaned_schema());
        if !mismatches.is_empty() {
            return Err(CleanerError::SchemaMismatch(mismatches.join("; ")));
        }

        Ok(CleanedAppointments { df, summary })
    }

    /// Step 1: identifiers carry no meaning for the analysis.
    pub fn drop_identifiers(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        Ok(df.drop(PATIENT_ID)?.drop(APPOINTMENT_ID)?)
    }

    /// Step 2.
    pub fn drop_negative_age(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(AGE).gt_eq(lit(0i64)))
            .collect()?;
        Ok(filtered)
    }

    /// Step 3: `Handcap` is a binary flag; the export holds a few 2, 3 and 4 values.
    pub fn drop_invalid_handicap(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(HANDICAP).gt_eq(lit(0i64)).and(col(HANDICAP).lt_eq(lit(1i64))))
            .collect()?;
        Ok(filtered)
    }

    /// Step 4.
    pub fn rename_attendance(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let mut renamed = df.clone();
        renamed.rename(NO_SHOW_RAW, NO_SHOW.into())?;
        Ok(renamed)
    }

    /// Step 5: "No" becomes 1 (attended), "Yes" becomes 0 (missed).
    ///
    /// Any other label is an error. A column that already holds 0/1 codes is
    /// returned as is, so applying the step twice changes nothing.
    pub fn remap_attendance(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let column = df.column(NO_SHOW)?;

        let codes = match column.dtype() {
            DataType::String => column
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, label)| {
                    let label = label.unwrap_or_default();
                    Attendance::from_raw_label(label)
                        .map(Attendance::code)
                        .ok_or_else(|| CleanerError::UnknownLabel {
                            row,
                            value: label.to_string(),
                        })
                })
                .collect::<Result<Vec<i64>, _>>()?,
            dtype if dtype.is_integer() => {
                let cast = column.cast(&DataType::Int64)?;
                cast.i64()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, code)| {
                        code.and_then(Attendance::from_code)
                            .map(Attendance::code)
                            .ok_or_else(|| CleanerError::UnknownLabel {
                                row,
                                value: code.map(|c| c.to_string()).unwrap_or_default(),
                            })
                    })
                    .collect::<Result<Vec<i64>, _>>()?
            }
            dtype => {
                return Err(CleanerError::UnexpectedType {
                    column: NO_SHOW.to_string(),
                    dtype: dtype.clone(),
                })
            }
        };

        let mut remapped = df.clone();
        remapped.with_column(Column::new(NO_SHOW.into(), codes))?;
        Ok(remapped)
    }

    /// Step 6: both day columns become `Date`, dropping the time of day.
    pub fn parse_dates(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let mut parsed = df.clone();
        for name in [SCHEDULED_DAY, APPOINTMENT_DAY] {
            let days = Self::epoch_days(df, name)?;
            let dates = Column::new(name.into(), days).cast(&DataType::Date)?;
            parsed.with_column(dates)?;
        }
        Ok(parsed)
    }

    /// Step 7: whole days between scheduling and the appointment.
    pub fn derive_awaiting_time(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let scheduled = Self::epoch_days(df, SCHEDULED_DAY)?;
        let appointment = Self::epoch_days(df, APPOINTMENT_DAY)?;

        let awaiting: Vec<i64> = appointment
            .iter()
            .zip(&scheduled)
            .map(|(a, s)| i64::from(*a) - i64::from(*s))
            .collect();

        let mut derived = df.clone();
        derived.with_column(Column::new(AWAITING_TIME.into(), awaiting))?;
        Ok(derived)
    }

    /// Step 8: an appointment before its scheduling day is a data error.
    pub fn drop_negative_awaiting(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(AWAITING_TIME).gt_eq(lit(0i64)))
            .collect()?;
        Ok(filtered)
    }

    /// Step 9: number the remaining rows 0..n-1.
    pub fn reset_index(df: &DataFrame) -> Result<DataFrame, CleanerError> {
        let mut without_index = df.clone();
        for name in [INDEX, SOURCE_ROW] {
            if without_index.column(name).is_ok() {
                without_index = without_index.drop(name)?;
            }
        }
        Ok(without_index.with_row_index(INDEX.into(), None)?)
    }

    /// Rewrite the row of a label or date error from its position in the
    /// filtered frame to the 0-based data row of the input file.
    fn locate(err: CleanerError, df: &DataFrame) -> CleanerError {
        let source_row = |row: usize| -> Option<usize> {
            let rows = df.column(SOURCE_ROW).ok()?.cast(&DataType::Int64).ok()?;
            let value = rows.i64().ok()?.get(row)?;
            usize::try_from(value).ok()
        };

        match err {
            CleanerError::UnknownLabel { row, value } => CleanerError::UnknownLabel {
                row: source_row(row).unwrap_or(row),
                value,
            },
            CleanerError::InvalidDate { column, row, value } => CleanerError::InvalidDate {
                column,
                row: source_row(row).unwrap_or(row),
                value,
            },
            other => other,
        }
    }

    /// Parse a day column into days since 1970-01-01.
    ///
    /// Accepts a column that is already `Date` or a string column in any of
    /// the formats `parse_day` understands.
    fn epoch_days(df: &DataFrame, name: &str) -> Result<Vec<i32>, CleanerError> {
        let column = df.column(name)?;

        match column.dtype() {
            DataType::Date => {
                let physical = column.cast(&DataType::Int32)?;
                Ok(physical.i32()?.into_iter().map(|d| d.unwrap_or_default()).collect())
            }
            DataType::String => column
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.unwrap_or_default();
                    parse_day(value)
                        .map(|date| date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
                        .ok_or_else(|| CleanerError::InvalidDate {
                            column: name.to_string(),
                            row,
                            value: value.to_string(),
                        })
                })
                .collect(),
            dtype => Err(CleanerError::UnexpectedType {
                column: name.to_string(),
                dtype: dtype.clone(),
            }),
        }
    }
}

/// Parse a day string, discarding any time-of-day component.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    None
}
