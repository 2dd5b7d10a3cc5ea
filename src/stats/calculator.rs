//! Statistics Calculator Module
//! Handles statistical computations including descriptive stats and t-tests.

use crate::data::schema::{columns, Attendance};
use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Default significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Descriptive statistics for one series of values (pandas `describe()`).
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Result of Welch's two-sample t-test.
#[derive(Debug, Clone, PartialEq)]
pub struct WelchTest {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub is_significant: bool,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = Self::mean(values);
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            f64::NAN
        };

        DescriptiveStats {
            count: n,
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Arithmetic mean; NaN for an empty slice.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Perform Welch's t-test (independent samples, unequal variance).
    ///
    /// Returns `None` when either sample has fewer than two values.
    pub fn perform_ttest(
        group_values: &[f64],
        control_values: &[f64],
        significance_level: f64,
    ) -> Option<WelchTest> {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;

        if n1 < 2.0 || n2 < 2.0 {
            return None;
        }

        let mean1 = Self::mean(group_values);
        let mean2 = Self::mean(control_values);

        let var1 = group_values
            .iter()
            .map(|x| (x - mean1).powi(2))
            .sum::<f64>()
            / (n1 - 1.0);
        let var2 = control_values
            .iter()
            .map(|x| (x - mean2).powi(2))
            .sum::<f64>()
            / (n2 - 1.0);

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            // Both samples constant
            return Some(WelchTest {
                t_statistic: 0.0,
                degrees_of_freedom: n1 + n2 - 2.0,
                p_value: 1.0,
                is_significant: false,
            });
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        // Two-tailed p-value using t-distribution
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));

        Some(WelchTest {
            t_statistic: t,
            degrees_of_freedom: df,
            p_value,
            is_significant: p_value <= significance_level,
        })
    }

    /// Get every value of a numeric column as `f64`.
    pub fn get_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<f64>> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().flatten().collect())
    }

    /// Get values of a numeric column for rows with the given attendance.
    pub fn get_values_for_attendance(
        df: &DataFrame,
        column: &str,
        attendance: Attendance,
    ) -> PolarsResult<Vec<f64>> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(columns::NO_SHOW).eq(lit(attendance.code())))
            .select([col(column)])
            .collect()?;
        Self::get_values(&filtered, column)
    }

    /// Number of rows with the given attendance.
    pub fn count_attendance(df: &DataFrame, attendance: Attendance) -> PolarsResult<usize> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(columns::NO_SHOW).eq(lit(attendance.code())))
            .collect()?;
        Ok(filtered.height())
    }
}
