//! Histogram Binning
//! Shared-edge binning for overlaid histograms.

/// Bin counts for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub label: String,
    pub counts: Vec<usize>,
}

/// Several series binned over the same edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedHistogram {
    pub lo: f64,
    pub hi: f64,
    pub bins: usize,
    pub series: Vec<HistogramSeries>,
}

impl BinnedHistogram {
    /// Bin every series over the range of all values combined.
    ///
    /// Follows NumPy: equal-width bins, the last bin includes the upper
    /// edge, and a degenerate range is widened to +/- 0.5.
    pub fn new(series: &[(&str, &[f64])], bins: usize) -> Self {
        let bins = bins.max(1);

        let (mut lo, mut hi) = series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if lo > hi {
            // No finite values
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let series = series
            .iter()
            .map(|(label, values)| HistogramSeries {
                label: label.to_string(),
                counts: bin_counts(values, lo, hi, bins),
            })
            .collect();

        Self {
            lo,
            hi,
            bins,
            series,
        }
    }

    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.bins as f64
    }

    /// Lower and upper edge of bin `i`.
    pub fn bin_range(&self, i: usize) -> (f64, f64) {
        let width = self.bin_width();
        let start = self.lo + width * i as f64;
        let end = if i + 1 == self.bins {
            self.hi
        } else {
            start + width
        };
        (start, end)
    }

    /// Tallest bar across all series.
    pub fn max_count(&self) -> usize {
        self.series
            .iter()
            .flat_map(|s| s.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Count `values` into `bins` equal-width bins over `[lo, hi]`.
///
/// Values outside the range and non-finite values are ignored.
pub fn bin_counts(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    if bins == 0 || hi <= lo {
        return counts;
    }

    let width = (hi - lo) / bins as f64;
    for &v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}
