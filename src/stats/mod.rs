//! Stats module - descriptive statistics and attendance analyses

mod analyzer;
mod calculator;

pub use analyzer::{AnalysisReport, Analyzer, AttendanceSplit};
pub use calculator::{DescriptiveStats, StatsCalculator, SIGNIFICANCE_THRESHOLD};
