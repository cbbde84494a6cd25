use serde::{Deserialize, Serialize};

use crate::errors::{AnalyticsError, AnalyticsResult};

/// One fixed-width bucket of a probability histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    /// Lower bound of the bucket, rendered at the bin width's precision.
    pub range_label: String,
    /// Number of samples routed to the bucket.
    pub count: usize,
}

/// Buckets `samples` into exactly `bin_count` bins of width `bin_width`.
///
/// A sample `p` lands in `floor(p / bin_width)`, clamped to the last bin so
/// that `p == 1.0` is counted rather than overflowing. Samples outside
/// `[0, 1]` (or NaN) are rejected.
#[allow(clippy::cast_precision_loss)]
pub fn bin(samples: &[f64], bin_width: f64, bin_count: usize) -> AnalyticsResult<Vec<HistogramBin>> {
    if !bin_width.is_finite() || bin_width <= 0.0 || bin_count == 0 {
        return Err(AnalyticsError::InvalidBinning {
            width: bin_width,
            count: bin_count,
        });
    }
    let precision = decimal_places(bin_width);
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|idx| HistogramBin {
            range_label: format!("{:.precision$}", idx as f64 * bin_width),
            count: 0,
        })
        .collect();
    let last = bin_count - 1;
    for (index, &value) in samples.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalyticsError::OutOfRangeSample { index, value });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bucket = ((value / bin_width).floor() as usize).min(last);
        bins[bucket].count += 1;
    }
    Ok(bins)
}

/// Number of fractional digits in the shortest decimal rendering of `width`.
#[must_use]
pub fn decimal_places(width: f64) -> usize {
    let rendered = width.to_string();
    rendered
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}
