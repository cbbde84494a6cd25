use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalyticsError, AnalyticsResult};

/// 2x2 confusion matrix as emitted by the backend: `[[tn, fp], [fn, tp]]`.
pub type ConfusionGrid = [[u64; 2]; 2];

/// Raw ROC arrays attached to a model record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// False-positive rates, ascending.
    pub fpr: Vec<f64>,
    /// True-positive rates, paired with `fpr` by index.
    pub tpr: Vec<f64>,
    /// Area under the curve when the backend computed it.
    #[serde(default)]
    pub auc: Option<f64>,
}

/// Evaluation record of one trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy in `[0, 1]`.
    #[serde(rename = "Accuracy")]
    pub accuracy: f64,
    /// Precision in `[0, 1]`.
    #[serde(rename = "Precision")]
    pub precision: f64,
    /// Recall in `[0, 1]`.
    #[serde(rename = "Recall")]
    pub recall: f64,
    /// F1 score in `[0, 1]`.
    #[serde(rename = "F1_Score")]
    pub f1_score: f64,
    /// Coefficient of determination over the hard predictions.
    #[serde(rename = "R2_Score")]
    pub r2_score: f64,
    /// Mean squared error over the hard predictions.
    #[serde(rename = "MSE")]
    pub mse: f64,
    /// Mean absolute error, when reported.
    #[serde(rename = "MAE", default)]
    pub mae: Option<f64>,
    /// Confusion counts; absent on partially populated backends.
    #[serde(rename = "ConfusionMatrix", default)]
    pub confusion_matrix: Option<ConfusionGrid>,
    /// ROC arrays; absent for models without probability output.
    #[serde(rename = "ROC", default)]
    pub roc: Option<RocCurve>,
}

/// `results` object of `GET /api/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResults {
    /// Per-model records keyed by model name.
    pub metrics: IndexMap<String, ModelMetrics>,
    /// Name of the model the backend selected.
    #[serde(default)]
    pub best_model: Option<String>,
    /// Feature weights of the best model.
    #[serde(default)]
    pub feature_importances: IndexMap<String, f64>,
    /// Predicted churn probability per test row.
    #[serde(default)]
    pub prob_distribution: Option<Vec<f64>>,
}

impl MetricsResults {
    /// Looks up the record of a model by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelMetrics> {
        self.metrics.get(name)
    }

    /// Resolves the best-model pointer to its name and record.
    pub fn best(&self) -> AnalyticsResult<(&str, &ModelMetrics)> {
        self.resolve_best(self.best_model.as_deref())
    }

    /// Resolves an explicit pointer; `None` or an unknown name is dangling.
    pub fn resolve_best<'a>(
        &'a self,
        pointer: Option<&str>,
    ) -> AnalyticsResult<(&'a str, &'a ModelMetrics)> {
        let pointer = pointer.unwrap_or_default();
        self.metrics
            .get_key_value(pointer)
            .map(|(name, record)| (name.as_str(), record))
            .ok_or_else(|| AnalyticsError::DanglingBestModel {
                pointer: pointer.to_string(),
            })
    }
}

/// Headline numbers of the customer dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Number of customers in the dataset.
    pub total_customers: u64,
    /// Share of churned customers in `[0, 1]`.
    pub churn_rate: f64,
    /// Mean order value.
    pub avg_order_value: f64,
    /// Estimated revenue.
    pub total_revenue: f64,
}

/// Category breakdowns used by the insight charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCharts {
    /// Churn rate per country.
    #[serde(default)]
    pub churn_by_country: IndexMap<String, f64>,
    /// Churn rate per gender.
    #[serde(default)]
    pub churn_by_gender: IndexMap<String, f64>,
    /// Customers per age group.
    #[serde(default)]
    pub age_distribution: IndexMap<String, f64>,
}

/// Best-model summary merged into the insights payload by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlSummary {
    /// Accuracy of the best model.
    pub accuracy: f64,
    /// F1 score of the best model.
    pub f1_score: f64,
    /// Volume indicator reported alongside the summary.
    pub dataset_volume: u64,
}

/// `data` object of `GET /api/data-insights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsSnapshot {
    /// Headline numbers.
    pub kpis: Kpis,
    /// Category breakdowns.
    pub charts: InsightCharts,
    /// Optional model summary.
    #[serde(default)]
    pub ml_data: Option<MlSummary>,
}

/// Wire envelope of the insights endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsEnvelope {
    /// Payload.
    pub data: InsightsSnapshot,
}

/// Wire envelope of the metrics endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsEnvelope {
    /// Payload.
    pub results: MetricsResults,
}

/// Error body returned by the backend on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub detail: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_metrics_envelope() {
        let envelope: MetricsEnvelope = serde_json::from_value(json!({
            "status": "success",
            "results": fixtures::metrics_json()
        }))
        .unwrap();
        let results = envelope.results;
        assert_eq!(results.metrics.len(), 3);
        let (name, best) = results.best().unwrap();
        assert_eq!(name, "Random Forest");
        assert_eq!(best.confusion_matrix, Some([[120, 8], [5, 67]]));
        assert_eq!(best.roc.as_ref().and_then(|r| r.auc), Some(0.91));
    }

    #[test]
    fn null_roc_and_missing_matrix_are_absent() {
        let mut record = fixtures::model(0.9, 0.8);
        record["ROC"] = serde_json::Value::Null;
        record.as_object_mut().unwrap().remove("ConfusionMatrix");
        let parsed: ModelMetrics = serde_json::from_value(record).unwrap();
        assert!(parsed.roc.is_none());
        assert!(parsed.confusion_matrix.is_none());
    }

    #[test]
    fn rejects_malformed_confusion_matrix() {
        let mut record = fixtures::model(0.9, 0.8);
        record["ConfusionMatrix"] = json!([[1, 2, 3], [4, 5, 6]]);
        assert!(serde_json::from_value::<ModelMetrics>(record.clone()).is_err());
        record["ConfusionMatrix"] = json!([[-1, 2], [4, 5]]);
        assert!(serde_json::from_value::<ModelMetrics>(record).is_err());
    }

    #[test]
    fn dangling_or_missing_pointer_is_reported() {
        let mut results: MetricsResults =
            serde_json::from_value(fixtures::metrics_json()).unwrap();
        assert_eq!(
            results.resolve_best(Some("XGBoost")).unwrap_err(),
            AnalyticsError::DanglingBestModel {
                pointer: "XGBoost".into()
            }
        );
        results.best_model = None;
        assert!(matches!(
            results.best(),
            Err(AnalyticsError::DanglingBestModel { pointer }) if pointer.is_empty()
        ));
    }

    #[test]
    fn insights_keep_chart_order_and_optional_summary() {
        let snapshot: InsightsSnapshot = serde_json::from_value(fixtures::insights_json()).unwrap();
        assert!(snapshot.ml_data.is_none());
        let countries: Vec<&String> = snapshot.charts.churn_by_country.keys().collect();
        assert_eq!(countries, vec!["Germany", "France"]);
    }

    #[test]
    fn chart_order_survives_an_intermediate_value() {
        let raw = r#"{
            "kpis": { "total_customers": 10, "churn_rate": 0.2, "avg_order_value": 1.0, "total_revenue": 10.0 },
            "charts": {
                "churn_by_gender": { "Male": 0.31, "Female": 0.27 },
                "age_distribution": { "55+": 3, "35-44": 4, "18-24": 3 }
            }
        }"#;
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let snapshot: InsightsSnapshot = serde_json::from_value(value).unwrap();
        let genders: Vec<&str> = snapshot.charts.churn_by_gender.keys().map(String::as_str).collect();
        assert_eq!(genders, vec!["Male", "Female"]);
        let ages: Vec<&str> = snapshot.charts.age_distribution.keys().map(String::as_str).collect();
        assert_eq!(ages, vec!["55+", "35-44", "18-24"]);
    }
}
