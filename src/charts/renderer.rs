//! Static Chart Renderer
//! Writes the attendance charts as PNG files with plotters.
//!
//! Charts:
//! 1. Overview: one histogram per numeric column of the cleaned table
//! 2. Q1: overlaid age histogram, show up vs no show
//! 3. Q2: show-up rate by SMS reminder (two bars)
//! 4. Q3: overlaid awaiting-days histogram, plus mean and median bars

use crate::charts::histogram::BinnedHistogram;
use crate::data::schema::{columns, Attendance, NUMERIC_COLUMNS};
use crate::stats::{AnalysisReport, AttendanceSplit, DescriptiveStats, StatsCalculator};
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::{DataFrame, PolarsError};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

// Colors
const BLUE: RGBColor = RGBColor(91, 155, 213); // Show up
const ORANGE: RGBColor = RGBColor(237, 125, 49); // No show
const GREEN: RGBColor = RGBColor(112, 173, 71); // Overview

const SMS_LABELS: [&str; 2] = ["No SMS", "Received SMS"];

type DrawResult = Result<(), Box<dyn StdError>>;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create output directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw {path}: {message}")]
    Drawing { path: PathBuf, message: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Output location and image settings.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
}

pub struct StaticChartRenderer {
    options: ChartOptions,
}

impl StaticChartRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    /// Render every chart; returns the written paths in drawing order.
    pub fn render_all(
        &self,
        df: &DataFrame,
        report: &AnalysisReport,
    ) -> Result<Vec<PathBuf>, ChartError> {
        let dir = &self.options.output_dir;
        std::fs::create_dir_all(dir).map_err(|source| ChartError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut written = Vec::new();

        written.push(self.render_overview(df)?);

        written.push(self.render_attendance_histogram(
            df,
            columns::AGE,
            "q1_age_histogram.png",
            "Histogram of Show-Up Situation by Various Age Group",
            "Age",
        )?);

        written.push(self.render_bars(
            "q2_sms_show_up_rate.png",
            "Average People Show-Up by SMS",
            "SMS Received or Not",
            "Average People Show-Up",
            &sms_bars(report),
        )?);

        written.push(self.render_attendance_histogram(
            df,
            columns::AWAITING_TIME,
            "q3_awaiting_histogram.png",
            "Histogram of Show-Up Situation by Awaiting Days",
            "Awaiting Days",
        )?);

        written.push(self.render_bars(
            "q3_awaiting_mean.png",
            "Mean Awaiting Days by Attendance",
            "People Show Up or Not",
            "Mean Awaiting Days",
            &attendance_bars(&report.wait.by_attendance, |s| s.mean),
        )?);

        written.push(self.render_bars(
            "q3_awaiting_median.png",
            "Median Awaiting Days by Attendance",
            "People Show Up or Not",
            "Median Awaiting Days",
            &attendance_bars(&report.wait.by_attendance, |s| s.median),
        )?);

        info!("Wrote {} charts to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Grid of histograms, one per numeric column.
    fn render_overview(&self, df: &DataFrame) -> Result<PathBuf, ChartError> {
        let mut columns_values = Vec::with_capacity(NUMERIC_COLUMNS.len());
        for name in NUMERIC_COLUMNS {
            columns_values.push((name, StatsCalculator::get_values(df, name)?));
        }

        let path = self.options.output_dir.join("overview_histograms.png");
        let bins = self.options.histogram_bins;
        let size = self.overview_size();

        self.finish(&path, || {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE)?;
            let body = root.titled("Cleaned Table Overview", ("sans-serif", 30))?;

            for (area, (name, values)) in body.split_evenly((3, 3)).iter().zip(&columns_values) {
                let hist = BinnedHistogram::new(&[(*name, values.as_slice())], bins);
                draw_histogram(area, name, "", "", &hist, &[GREEN], 16)?;
            }

            root.present()?;
            Ok(())
        })
    }

    /// Overlaid semi-transparent histogram of `column` per attendance value.
    fn render_attendance_histogram(
        &self,
        df: &DataFrame,
        column: &str,
        file_name: &str,
        title: &str,
        x_desc: &str,
    ) -> Result<PathBuf, ChartError> {
        let attended =
            StatsCalculator::get_values_for_attendance(df, column, Attendance::Attended)?;
        let missed = StatsCalculator::get_values_for_attendance(df, column, Attendance::Missed)?;
        let hist = BinnedHistogram::new(
            &[
                (Attendance::Attended.legend(), attended.as_slice()),
                (Attendance::Missed.legend(), missed.as_slice()),
            ],
            self.options.histogram_bins,
        );

        let path = self.options.output_dir.join(file_name);
        let size = (self.options.width, self.options.height);

        self.finish(&path, || {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE)?;
            draw_histogram(&root, title, x_desc, "Population", &hist, &[BLUE, ORANGE], 24)?;
            root.present()?;
            Ok(())
        })
    }

    /// Two-bar categorical chart with fixed labels.
    fn render_bars(
        &self,
        file_name: &str,
        title: &str,
        x_desc: &str,
        y_desc: &str,
        bars: &[(&str, f64)],
    ) -> Result<PathBuf, ChartError> {
        let path = self.options.output_dir.join(file_name);
        let size = (self.options.width, self.options.height);

        self.finish(&path, || {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE)?;
            draw_bar_chart(&root, title, x_desc, y_desc, bars)?;
            root.present()?;
            Ok(())
        })
    }

    /// The overview grid is drawn half again as large as a single chart.
    fn overview_size(&self) -> (u32, u32) {
        let enlarge = |side: u32| side.saturating_mul(3) / 2;
        (enlarge(self.options.width), enlarge(self.options.height))
    }

    fn finish<F>(&self, path: &Path, draw: F) -> Result<PathBuf, ChartError>
    where
        F: FnOnce() -> DrawResult,
    {
        draw().map_err(|e| ChartError::Drawing {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Wrote {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Bars for Q2: show-up rate without and with an SMS reminder.
pub fn sms_bars(report: &AnalysisReport) -> [(&'static str, f64); 2] {
    [
        (SMS_LABELS[0], report.sms.show_up_rate(0)),
        (SMS_LABELS[1], report.sms.show_up_rate(1)),
    ]
}

/// Bars for Q3: one statistic for no show, then show up.
pub fn attendance_bars<F>(split: &AttendanceSplit, stat: F) -> [(&'static str, f64); 2]
where
    F: Fn(&DescriptiveStats) -> f64,
{
    Attendance::ALL.map(|attendance| (attendance.label(), stat(split.get(attendance))))
}

fn draw_histogram(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    hist: &BinnedHistogram,
    colors: &[RGBColor],
    caption_size: u32,
) -> DrawResult {
    let y_max = (hist.max_count() as f64 * 1.1).max(1.0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", caption_size))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(hist.lo..hist.hi, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()?;

    for (series, color) in hist.series.iter().zip(colors.iter().cycle()) {
        let color = *color;
        chart
            .draw_series(series.counts.iter().enumerate().map(|(i, &count)| {
                let (x0, x1) = hist.bin_range(i);
                Rectangle::new([(x0, 0.0), (x1, count as f64)], color.mix(0.5).filled())
            }))?
            .label(series.label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.mix(0.5).filled())
            });
    }

    if hist.series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    Ok(())
}

fn draw_bar_chart(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    bars: &[(&str, f64)],
) -> DrawResult {
    // NaN means an empty group; draw it as a zero-height bar
    let heights: Vec<f64> = bars
        .iter()
        .map(|(_, v)| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let top = heights.iter().copied().fold(0.0, f64::max);
    let y_max = if top > 0.0 { top * 1.15 } else { 1.0 };
    let last = (bars.len() as u32).saturating_sub(1);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d((0u32..last).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => bars
                .get(*i as usize)
                .map(|(label, _)| label.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(heights.iter().enumerate().map(|(i, &height)| {
        let color = if i % 2 == 0 { ORANGE } else { BLUE };
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i as u32), 0.0),
                (SegmentValue::Exact(i as u32 + 1), height),
            ],
            color.filled(),
        );
        bar.set_margin(0, 0, 30, 30);
        bar
    }))?;

    Ok(())
}
