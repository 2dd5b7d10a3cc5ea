//! Attendance Analyzer
//! Read-only aggregations over the cleaned table for the three research
//! questions (age, SMS reminder, awaiting time) plus a dataset overview.

use crate::data::schema::{columns, Attendance, NUMERIC_COLUMNS};
use crate::data::CleaningSummary;
use crate::stats::calculator::{DescriptiveStats, StatsCalculator, WelchTest};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Row {row} has attendance code {code}; expected 0 or 1")]
    UnexpectedAttendance { row: usize, code: i64 },
}

/// A numeric column split by attendance.
#[derive(Debug, Clone)]
pub struct AttendanceSplit {
    pub attended: DescriptiveStats,
    pub missed: DescriptiveStats,
    /// Attended vs missed; `None` when either side has fewer than two rows.
    pub ttest: Option<WelchTest>,
}

impl AttendanceSplit {
    pub fn get(&self, attendance: Attendance) -> &DescriptiveStats {
        match attendance {
            Attendance::Attended => &self.attended,
            Attendance::Missed => &self.missed,
        }
    }
}

/// Q1: does age affect attendance?
#[derive(Debug, Clone)]
pub struct AgeAnalysis {
    pub age: AttendanceSplit,
    pub attended_count: usize,
    pub missed_count: usize,
}

impl AgeAnalysis {
    /// Show-up population divided by no-show population.
    pub fn show_up_ratio(&self) -> Option<f64> {
        if self.missed_count == 0 {
            None
        } else {
            Some(self.attended_count as f64 / self.missed_count as f64)
        }
    }

    pub fn total(&self) -> usize {
        self.attended_count + self.missed_count
    }
}

/// Attended / missed counts for one `SMS_received` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceCounts {
    pub attended: usize,
    pub missed: usize,
}

impl AttendanceCounts {
    pub fn total(&self) -> usize {
        self.attended + self.missed
    }

    /// Mean of `No_show` within the group.
    pub fn show_up_rate(&self) -> f64 {
        if self.total() == 0 {
            f64::NAN
        } else {
            self.attended as f64 / self.total() as f64
        }
    }
}

/// Q2: does an SMS reminder affect attendance?
#[derive(Debug, Clone)]
pub struct SmsAnalysis {
    /// Contingency table keyed by `SMS_received` value.
    pub counts: BTreeMap<i64, AttendanceCounts>,
}

impl SmsAnalysis {
    pub fn counts_for(&self, sms_received: i64) -> AttendanceCounts {
        self.counts.get(&sms_received).copied().unwrap_or_default()
    }

    pub fn show_up_rate(&self, sms_received: i64) -> f64 {
        self.counts_for(sms_received).show_up_rate()
    }

    pub fn total(&self) -> usize {
        self.counts.values().map(AttendanceCounts::total).sum()
    }
}

/// Q3: does the wait between scheduling and appointment affect attendance?
#[derive(Debug, Clone)]
pub struct WaitAnalysis {
    pub overall: DescriptiveStats,
    pub by_attendance: AttendanceSplit,
}

/// Shape and per-column statistics of the cleaned table.
#[derive(Debug, Clone)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    pub column_stats: Vec<(String, DescriptiveStats)>,
}

/// Everything the terminal report and the charts draw from.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub cleaning: CleaningSummary,
    pub overview: DatasetOverview,
    pub age: AgeAnalysis,
    pub sms: SmsAnalysis,
    pub wait: WaitAnalysis,
    pub significance_level: f64,
}

/// Computes the attendance analyses over a cleaned table.
pub struct Analyzer {
    significance_level: f64,
}

impl Analyzer {
    pub fn new(significance_level: f64) -> Self {
        Self { significance_level }
    }

    /// Run every analysis.
    pub fn analyze(
        &self,
        df: &DataFrame,
        cleaning: CleaningSummary,
    ) -> Result<AnalysisReport, AnalysisError> {
        let report = AnalysisReport {
            cleaning,
            overview: Self::overview(df)?,
            age: self.age(df)?,
            sms: Self::sms(df)?,
            wait: self.wait(df)?,
            significance_level: self.significance_level,
        };
        debug!("Analysis complete for {} rows", report.overview.rows);
        Ok(report)
    }

    /// `describe()` of every numeric column.
    pub fn overview(df: &DataFrame) -> Result<DatasetOverview, AnalysisError> {
        let column_stats = NUMERIC_COLUMNS
            .iter()
            .map(|name| -> Result<(String, DescriptiveStats), AnalysisError> {
                let values = StatsCalculator::get_values(df, name)?;
                Ok((
                    name.to_string(),
                    StatsCalculator::compute_descriptive_stats(&values),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DatasetOverview {
            rows: df.height(),
            columns: df.width(),
            column_stats,
        })
    }

    /// Age statistics and population counts per attendance value.
    pub fn age(&self, df: &DataFrame) -> Result<AgeAnalysis, AnalysisError> {
        Ok(AgeAnalysis {
            age: self.split_by_attendance(df, columns::AGE)?,
            attended_count: StatsCalculator::count_attendance(df, Attendance::Attended)?,
            missed_count: StatsCalculator::count_attendance(df, Attendance::Missed)?,
        })
    }

    /// Contingency table of (`SMS_received`, `No_show`).
    pub fn sms(df: &DataFrame) -> Result<SmsAnalysis, AnalysisError> {
        let sms = df.column(columns::SMS_RECEIVED)?.cast(&DataType::Int64)?;
        let no_show = df.column(columns::NO_SHOW)?.cast(&DataType::Int64)?;

        let mut counts: BTreeMap<i64, AttendanceCounts> = BTreeMap::new();
        for (row, (sms_value, code)) in sms
            .i64()?
            .into_iter()
            .zip(no_show.i64()?.into_iter())
            .enumerate()
        {
            let (Some(sms_value), Some(code)) = (sms_value, code) else {
                continue;
            };
            let entry = counts.entry(sms_value).or_default();
            match Attendance::from_code(code) {
                Some(Attendance::Attended) => entry.attended += 1,
                Some(Attendance::Missed) => entry.missed += 1,
                None => return Err(AnalysisError::UnexpectedAttendance { row, code }),
            }
        }

        Ok(SmsAnalysis { counts })
    }

    /// Awaiting-time statistics overall and per attendance value.
    pub fn wait(&self, df: &DataFrame) -> Result<WaitAnalysis, AnalysisError> {
        let values = StatsCalculator::get_values(df, columns::AWAITING_TIME)?;
        Ok(WaitAnalysis {
            overall: StatsCalculator::compute_descriptive_stats(&values),
            by_attendance: self.split_by_attendance(df, columns::AWAITING_TIME)?,
        })
    }

    fn split_by_attendance(
        &self,
        df: &DataFrame,
        column: &str,
    ) -> Result<AttendanceSplit, AnalysisError> {
        let attended =
            StatsCalculator::get_values_for_attendance(df, column, Attendance::Attended)?;
        let missed = StatsCalculator::get_values_for_attendance(df, column, Attendance::Missed)?;

        Ok(AttendanceSplit {
            attended: StatsCalculator::compute_descriptive_stats(&attended),
            missed: StatsCalculator::compute_descriptive_stats(&missed),
            ttest: StatsCalculator::perform_ttest(&attended, &missed, self.significance_level),
        })
    }
}

fn write_stats_row(f: &mut fmt::Formatter<'_>, name: &str, s: &DescriptiveStats) -> fmt::Result {
    writeln!(
        f,
        "  {:<14} {:>8} {:>9.2} {:>9.2} {:>7.0} {:>7.1} {:>7.1} {:>7.1} {:>7.0}",
        name, s.count, s.mean, s.std, s.min, s.p25, s.median, s.p75, s.max
    )
}

fn write_stats_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
        f,
        "  {:<14} {:>8} {:>9} {:>9} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )
}

fn write_ttest(f: &mut fmt::Formatter<'_>, ttest: &Option<WelchTest>, alpha: f64) -> fmt::Result {
    match ttest {
        Some(t) => writeln!(
            f,
            "  Welch t-test (show up vs no show): t = {:.3}, df = {:.1}, p = {:.4} ({} at {})",
            t.t_statistic,
            t.degrees_of_freedom,
            t.p_value,
            if t.is_significant {
                "significant"
            } else {
                "not significant"
            },
            alpha
        ),
        None => writeln!(f, "  Welch t-test: not enough rows in one group"),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.cleaning;
        writeln!(f, "== Data cleaning")?;
        writeln!(f, "  raw rows:                      {}", c.rows_before)?;
        writeln!(f, "  removed, age < 0:              {}", c.removed_negative_age)?;
        writeln!(f, "  removed, handicap not 0/1:     {}", c.removed_invalid_handicap)?;
        writeln!(f, "  removed, awaiting time < 0:    {}", c.removed_negative_awaiting)?;
        writeln!(f, "  removed in total:              {}", c.rows_removed())?;
        writeln!(f, "  cleaned rows:                  {}", c.rows_after)?;
        writeln!(f)?;

        writeln!(
            f,
            "== Overview ({} rows x {} columns)",
            self.overview.rows, self.overview.columns
        )?;
        write_stats_header(f)?;
        for (name, stats) in &self.overview.column_stats {
            write_stats_row(f, name, stats)?;
        }
        writeln!(f)?;

        writeln!(f, "== Q1: Does age affect whether a patient shows up?")?;
        write_stats_header(f)?;
        for attendance in Attendance::ALL {
            write_stats_row(f, attendance.legend(), self.age.age.get(attendance))?;
        }
        writeln!(f, "  population:           {}", self.age.total())?;
        writeln!(f, "  show-up population:   {}", self.age.attended_count)?;
        writeln!(f, "  no-show population:   {}", self.age.missed_count)?;
        match self.age.show_up_ratio() {
            Some(ratio) => writeln!(f, "  show-up / no-show:    {:.3}", ratio)?,
            None => writeln!(f, "  show-up / no-show:    n/a (no missed appointments)")?,
        }
        write_ttest(f, &self.age.age.ttest, self.significance_level)?;
        writeln!(f)?;

        writeln!(f, "== Q2: Does an SMS reminder affect attendance?")?;
        writeln!(
            f,
            "  {:<14} {:>9} {:>9} {:>13}",
            "SMS_received", "no show", "show up", "show-up rate"
        )?;
        for (sms_value, counts) in &self.sms.counts {
            writeln!(
                f,
                "  {:<14} {:>9} {:>9} {:>13.4}",
                sms_value,
                counts.missed,
                counts.attended,
                counts.show_up_rate()
            )?;
        }
        writeln!(f, "  {:<14} {:>9}", "total", self.sms.total())?;
        writeln!(f)?;

        writeln!(f, "== Q3: Does the awaiting time affect attendance?")?;
        write_stats_header(f)?;
        write_stats_row(f, "all", &self.wait.overall)?;
        for attendance in Attendance::ALL {
            write_stats_row(f, attendance.legend(), self.wait.by_attendance.get(attendance))?;
        }
        write_ttest(f, &self.wait.by_attendance.ttest, self.significance_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{cleaned_frame, RawRow};
    use crate::stats::calculator::SIGNIFICANCE_THRESHOLD;

    fn sample_rows() -> Vec<RawRow> {
        vec![
            // attended, no SMS, 0 days
            RawRow {
                age: 30,
                scheduled: "2016-05-02T09:00:00Z",
                appointment: "2016-05-02T00:00:00Z",
                ..Default::default()
            },
            // attended, SMS, 2 days
            RawRow {
                age: 50,
                sms: 1,
                scheduled: "2016-05-10T09:00:00Z",
                appointment: "2016-05-12T00:00:00Z",
                ..Default::default()
            },
            // attended, no SMS, 4 days
            RawRow {
                age: 70,
                scheduled: "2016-05-10T09:00:00Z",
                appointment: "2016-05-14T00:00:00Z",
                ..Default::default()
            },
            // missed, SMS, 10 days
            RawRow {
                age: 20,
                sms: 1,
                no_show: "Yes",
                scheduled: "2016-05-01T09:00:00Z",
                appointment: "2016-05-11T00:00:00Z",
                ..Default::default()
            },
            // missed, SMS, 20 days
            RawRow {
                age: 10,
                sms: 1,
                no_show: "Yes",
                scheduled: "2016-05-01T09:00:00Z",
                appointment: "2016-05-21T00:00:00Z",
                ..Default::default()
            },
            // removed by cleaning
            RawRow {
                age: -1,
                no_show: "Yes",
                ..Default::default()
            },
        ]
    }

    fn analyze(rows: &[RawRow]) -> AnalysisReport {
        let df = cleaned_frame(rows);
        Analyzer::new(SIGNIFICANCE_THRESHOLD)
            .analyze(&df, CleaningSummary::default())
            .unwrap()
    }

    #[test]
    fn test_age_by_attendance() {
        let report = analyze(&sample_rows());

        assert_eq!(report.age.attended_count, 3);
        assert_eq!(report.age.missed_count, 2);
        assert_eq!(report.age.total(), report.overview.rows);
        assert_eq!(report.age.show_up_ratio(), Some(1.5));
        assert!((report.age.age.attended.mean - 50.0).abs() < 1e-9);
        assert!((report.age.age.attended.median - 50.0).abs() < 1e-9);
        assert!((report.age.age.missed.mean - 15.0).abs() < 1e-9);
        assert!((report.age.age.missed.median - 15.0).abs() < 1e-9);
        assert!(report.age.age.ttest.is_some());
    }

    #[test]
    fn test_sms_contingency_sums_to_rows() {
        let report = analyze(&sample_rows());

        assert_eq!(report.sms.total(), report.overview.rows);
        assert_eq!(
            report.sms.counts_for(0),
            AttendanceCounts {
                attended: 2,
                missed: 0
            }
        );
        assert_eq!(
            report.sms.counts_for(1),
            AttendanceCounts {
                attended: 1,
                missed: 2
            }
        );
        assert!((report.sms.show_up_rate(0) - 1.0).abs() < 1e-9);
        assert!((report.sms.show_up_rate(1) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_awaiting_time() {
        let report = analyze(&sample_rows());

        let overall = &report.wait.overall;
        assert_eq!(overall.count, 5);
        assert!((overall.min - 0.0).abs() < 1e-9);
        assert!((overall.max - 20.0).abs() < 1e-9);
        assert!((overall.median - 4.0).abs() < 1e-9);
        assert!((overall.mean - 36.0 / 5.0).abs() < 1e-9);

        let split = &report.wait.by_attendance;
        assert!((split.attended.mean - 2.0).abs() < 1e-9);
        assert!((split.attended.median - 2.0).abs() < 1e-9);
        assert!((split.missed.mean - 15.0).abs() < 1e-9);
        assert!((split.missed.median - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_attendance_group() {
        let report = analyze(&[
            RawRow::default(),
            RawRow {
                age: 12,
                ..Default::default()
            },
        ]);

        assert_eq!(report.age.missed_count, 0);
        assert_eq!(report.age.show_up_ratio(), None);
        assert!(report.age.age.missed.mean.is_nan());
        assert!(report.age.age.ttest.is_none());
        assert_eq!(report.sms.total(), 2);
    }

    #[test]
    fn test_overview_covers_numeric_columns() {
        let report = analyze(&sample_rows());
        let names: Vec<&str> = report
            .overview
            .column_stats
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, NUMERIC_COLUMNS.to_vec());
        assert!(report
            .overview
            .column_stats
            .iter()
            .all(|(_, stats)| stats.count == report.overview.rows));
    }

    #[test]
    fn test_unexpected_attendance_code() {
        let df = DataFrame::new(vec![
            Column::new(columns::SMS_RECEIVED.into(), vec![0i64, 1]),
            Column::new(columns::NO_SHOW.into(), vec![1i64, 5]),
        ])
        .unwrap();

        let err = Analyzer::sms(&df).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnexpectedAttendance { row: 1, code: 5 }
        ));
    }

    #[test]
    fn test_report_display() {
        let text = analyze(&sample_rows()).to_string();
        assert!(text.contains("Q1"));
        assert!(text.contains("Q2"));
        assert!(text.contains("Q3"));
        assert!(text.contains("show-up / no-show:    1.500"));
    }
}
