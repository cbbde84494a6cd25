use serde::{Deserialize, Serialize};

use crate::{
    config::ViewOptions,
    errors::{AnalyticsError, AnalyticsResult},
    payload::{ConfusionGrid, MetricsResults, ModelMetrics},
    transform::{build_roc, safe_divide, to_fixed, to_percent, trapezoidal_auc, RocPoint},
};

/// Matrix used when the backend omits confusion counts.
pub const EMPTY_CONFUSION: ConfusionGrid = [[0, 0], [0, 0]];

/// Chart row of the model comparison, percentages as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    /// Model name.
    pub model_name: String,
    /// Accuracy in percent.
    pub accuracy_pct: f64,
    /// F1 score in percent.
    pub f1_pct: f64,
    /// Precision in percent.
    pub precision_pct: f64,
    /// Recall in percent.
    pub recall_pct: f64,
    /// R² over the hard predictions.
    pub r2_score: f64,
    /// Mean squared error over the hard predictions.
    pub mse: f64,
}

/// Detailed metrics table row, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsTableRow {
    /// Model name.
    pub model_name: String,
    /// Accuracy percent string.
    pub accuracy: String,
    /// Precision percent string.
    pub precision: String,
    /// Recall percent string.
    pub recall: String,
    /// F1 percent string.
    pub f1: String,
    /// R² at four decimals.
    pub r2: String,
    /// MSE at four decimals.
    pub mse: String,
}

/// Headline card of the selected model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestModelSummary {
    /// Model name.
    pub name: String,
    /// Accuracy percent string.
    pub accuracy_pct: String,
    /// F1 percent string.
    pub f1_pct: String,
    /// Precision percent string.
    pub precision_pct: String,
    /// Recall percent string.
    pub recall_pct: String,
}

/// Confusion counts of the selected model with derived rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfusionView {
    /// True negatives.
    pub tn: u64,
    /// False positives.
    pub fp: u64,
    /// False negatives.
    #[serde(rename = "fn")]
    pub fn_: u64,
    /// True positives.
    pub tp: u64,
    /// Sum of all cells.
    pub total: u64,
    /// `(tp + tn) / total`, zero for an empty matrix.
    pub accuracy: f64,
    /// `tp / (tp + fp)`, zero when nothing was predicted positive.
    pub precision: f64,
    /// `tp / (tp + fn)`, zero when there are no positives.
    pub recall: f64,
}

impl ConfusionView {
    /// Reads a `[[tn, fp], [fn, tp]]` grid.
    ///
    /// `total` saturates at `u64::MAX`; the rates are computed in `f64` so
    /// they stay finite for any cell values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_grid(grid: ConfusionGrid) -> Self {
        let [[tn, fp], [fn_, tp]] = grid;
        let total = tn.saturating_add(fp).saturating_add(fn_).saturating_add(tp);
        let (tn_f, fp_f, fn_f, tp_f) = (tn as f64, fp as f64, fn_ as f64, tp as f64);
        Self {
            tn,
            fp,
            fn_,
            tp,
            total,
            accuracy: safe_divide(tp_f + tn_f, tn_f + fp_f + fn_f + tp_f),
            precision: safe_divide(tp_f, tp_f + fp_f),
            recall: safe_divide(tp_f, tp_f + fn_f),
        }
    }
}

/// Model-metrics slice of the dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsView {
    /// Chart rows in canonical model order.
    pub comparison_rows: Vec<ComparisonRow>,
    /// Table rows in canonical model order.
    pub table_rows: Vec<MetricsTableRow>,
    /// Selected model card.
    pub best_model: BestModelSummary,
    /// Selected model confusion counts.
    pub confusion: ConfusionView,
    /// Selected model ROC points; empty without ROC data.
    pub roc_points: Vec<RocPoint>,
    /// Selected model AUC; zero without ROC data.
    pub auc: f64,
    /// AUC at four decimals.
    pub auc_label: String,
}

/// Composes per-model records into the comparison and best-model views.
#[derive(Debug, Clone, Copy)]
pub struct MetricsViewBuilder {
    percent_decimals: usize,
    summary_decimals: usize,
}

impl Default for MetricsViewBuilder {
    fn default() -> Self {
        Self::new(&ViewOptions::default())
    }
}

impl MetricsViewBuilder {
    /// Builder using the formatting precision of `options`.
    #[must_use]
    pub fn new(options: &ViewOptions) -> Self {
        Self {
            percent_decimals: options.percent_decimals,
            summary_decimals: options.summary_decimals,
        }
    }

    /// Builds the metrics view.
    ///
    /// Rows follow `model_order`, never the payload's key order; every name
    /// in it must be present. `best_model_pointer` must name a record.
    pub fn build<S: AsRef<str>>(
        &self,
        raw: &MetricsResults,
        best_model_pointer: &str,
        model_order: &[S],
    ) -> AnalyticsResult<MetricsView> {
        let mut comparison_rows = Vec::with_capacity(model_order.len());
        let mut table_rows = Vec::with_capacity(model_order.len());
        for name in model_order {
            let name = name.as_ref();
            let record = raw.model(name).ok_or_else(|| AnalyticsError::MissingModel {
                name: name.to_string(),
            })?;
            comparison_rows.push(comparison_row(name, record));
            table_rows.push(self.table_row(name, record)?);
        }

        let (best_name, best) = raw.resolve_best(Some(best_model_pointer))?;
        let confusion = ConfusionView::from_grid(best.confusion_matrix.unwrap_or(EMPTY_CONFUSION));
        let (roc_points, auc) = match &best.roc {
            Some(roc) => {
                let points = build_roc(&roc.fpr, &roc.tpr)?;
                let auc = roc.auc.unwrap_or_else(|| trapezoidal_auc(&points));
                (points, auc)
            }
            None => (Vec::new(), 0.0),
        };

        Ok(MetricsView {
            comparison_rows,
            table_rows,
            best_model: self.summary(best_name, best)?,
            confusion,
            roc_points,
            auc,
            auc_label: to_fixed(auc, 4)?,
        })
    }

    fn table_row(&self, name: &str, record: &ModelMetrics) -> AnalyticsResult<MetricsTableRow> {
        let decimals = self.percent_decimals;
        Ok(MetricsTableRow {
            model_name: name.to_string(),
            accuracy: to_percent(record.accuracy, decimals)?,
            precision: to_percent(record.precision, decimals)?,
            recall: to_percent(record.recall, decimals)?,
            f1: to_percent(record.f1_score, decimals)?,
            r2: to_fixed(record.r2_score, 4)?,
            mse: to_fixed(record.mse, 4)?,
        })
    }

    fn summary(&self, name: &str, record: &ModelMetrics) -> AnalyticsResult<BestModelSummary> {
        let decimals = self.summary_decimals;
        Ok(BestModelSummary {
            name: name.to_string(),
            accuracy_pct: to_percent(record.accuracy, decimals)?,
            f1_pct: to_percent(record.f1_score, decimals)?,
            precision_pct: to_percent(record.precision, decimals)?,
            recall_pct: to_percent(record.recall, decimals)?,
        })
    }
}

fn comparison_row(name: &str, record: &ModelMetrics) -> ComparisonRow {
    ComparisonRow {
        model_name: name.to_string(),
        accuracy_pct: record.accuracy * 100.0,
        f1_pct: record.f1_score * 100.0,
        precision_pct: record.precision * 100.0,
        recall_pct: record.recall * 100.0,
        r2_score: record.r2_score,
        mse: record.mse,
    }
}
