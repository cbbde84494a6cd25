//! Pure transforms from raw evaluation artifacts to chart-ready sequences.
//!
//! Every function here borrows its input and returns freshly built values,
//! so repeated calls on the same payload produce identical output.

/// Percentage and decimal formatting, safe division.
pub mod formatter;
/// Fixed-width probability histograms.
pub mod histogram;
/// ROC curve reconstruction.
pub mod curve;
/// Ranked top-N selection.
pub mod ranking;
/// Category rate and count charts.
pub mod rates;

pub use curve::{build_roc, trapezoidal_auc, RocPoint};
pub use formatter::{humanize_label, safe_divide, to_fixed, to_percent, to_percent_opt};
pub use histogram::{bin, HistogramBin};
pub use ranking::{top_n, RankedFeature};
pub use rates::{to_counts, to_rates, CategoryCount, CategoryRate};
