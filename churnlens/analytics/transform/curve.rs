use serde::{Deserialize, Serialize};

use crate::errors::{AnalyticsError, AnalyticsResult};

/// One operating point of a ROC curve plus the no-skill diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// False-positive rate.
    pub fpr: f64,
    /// True-positive rate.
    pub tpr: f64,
    /// Diagonal baseline at this x position (always equal to `fpr`).
    pub baseline: f64,
}

/// Pairs the coordinate arrays by index.
pub fn build_roc(fpr: &[f64], tpr: &[f64]) -> AnalyticsResult<Vec<RocPoint>> {
    if fpr.len() != tpr.len() {
        return Err(AnalyticsError::LengthMismatch {
            fpr: fpr.len(),
            tpr: tpr.len(),
        });
    }
    Ok(fpr
        .iter()
        .zip(tpr)
        .map(|(&fpr, &tpr)| RocPoint {
            fpr,
            tpr,
            baseline: fpr,
        })
        .collect())
}

/// Trapezoidal area under the reconstructed points.
#[must_use]
pub fn trapezoidal_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| (pair[1].fpr - pair[0].fpr).abs() * (pair[1].tpr + pair[0].tpr) / 2.0)
        .sum()
}
