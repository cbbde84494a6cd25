use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    config::ViewOptions,
    errors::AnalyticsResult,
    metrics_view::{MetricsView, MetricsViewBuilder},
    payload::{InsightsSnapshot, MetricsResults, MlSummary},
    telemetry::{emit, AnalyticsTelemetry},
    transform::{
        bin, to_counts, to_fixed, to_percent, to_rates, top_n, CategoryCount, CategoryRate,
        HistogramBin, RankedFeature,
    },
};

/// Summary shown when the insights payload carries no `ml_data`.
pub const FALLBACK_ML_SUMMARY: MlSummary = MlSummary {
    accuracy: 0.893,
    f1_score: 0.794,
    dataset_volume: 6,
};

/// Where the ML summary card got its numbers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    /// Reported by the backend.
    Backend,
    /// Placeholder values.
    Fallback,
}

/// ML summary cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlSummaryView {
    /// Accuracy percent string.
    pub accuracy_pct: String,
    /// F1 percent string.
    pub f1_pct: String,
    /// Dataset volume indicator.
    pub dataset_volume: u64,
    /// Origin of the numbers.
    pub source: SummarySource,
}

/// Dataset KPI cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiView {
    /// Customer count.
    pub total_customers: u64,
    /// Churn rate percent string.
    pub churn_rate_pct: String,
    /// Mean order value at two decimals.
    pub avg_order_value: String,
    /// Revenue estimate at two decimals.
    pub total_revenue: String,
}

/// Render-ready view model of the whole dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Model comparison, best model, confusion matrix, and ROC curve.
    #[serde(flatten)]
    pub metrics: MetricsView,
    /// Predicted probability histogram.
    pub histogram: Vec<HistogramBin>,
    /// Heaviest features, heaviest first.
    pub top_features: Vec<RankedFeature>,
    /// Churn rate per gender.
    pub category_rates: Vec<CategoryRate>,
    /// Churn rate per country.
    pub country_rates: Vec<CategoryRate>,
    /// Customers per age group.
    pub age_groups: Vec<CategoryCount>,
    /// Dataset KPI cards.
    pub kpis: KpiView,
    /// ML summary cards.
    pub ml_summary: MlSummaryView,
}

impl DashboardView {
    /// Assembles the view from both payloads. Inputs are only borrowed, so
    /// the same payloads always assemble to the same view.
    pub fn assemble(
        insights: &InsightsSnapshot,
        results: &MetricsResults,
        options: &ViewOptions,
    ) -> AnalyticsResult<Self> {
        Self::assemble_with_telemetry(insights, results, options, None)
    }

    /// [`DashboardView::assemble`] with optional instrumentation.
    pub fn assemble_with_telemetry(
        insights: &InsightsSnapshot,
        results: &MetricsResults,
        options: &ViewOptions,
        telemetry: Option<&AnalyticsTelemetry>,
    ) -> AnalyticsResult<Self> {
        let pointer = results.best_model.as_deref().unwrap_or_default();
        let metrics = MetricsViewBuilder::new(options).build(results, pointer, &options.model_order)?;
        let samples = results.prob_distribution.as_deref().unwrap_or_default();
        let histogram = bin(samples, options.histogram_bin_width, options.histogram_bins)?;
        let top_features = top_n(&results.feature_importances, options.top_features);
        let ml_summary = ml_summary(insights.ml_data, options.percent_decimals)?;
        if ml_summary.source == SummarySource::Fallback {
            emit(
                telemetry,
                LogLevel::Warn,
                "analytics.view.ml_fallback",
                json!({ "best_model": metrics.best_model.name }),
            );
        }
        let view = Self {
            histogram,
            top_features,
            category_rates: to_rates(&insights.charts.churn_by_gender),
            country_rates: to_rates(&insights.charts.churn_by_country),
            age_groups: to_counts(&insights.charts.age_distribution),
            kpis: kpis(insights, options.summary_decimals)?,
            ml_summary,
            metrics,
        };
        emit(
            telemetry,
            LogLevel::Info,
            "analytics.view.built",
            json!({
                "best_model": view.metrics.best_model.name,
                "models": view.metrics.comparison_rows.len(),
                "roc_points": view.metrics.roc_points.len(),
                "samples": samples.len(),
                "features": view.top_features.len(),
            }),
        );
        Ok(view)
    }
}

fn ml_summary(reported: Option<MlSummary>, decimals: usize) -> AnalyticsResult<MlSummaryView> {
    let (summary, source) = reported.map_or((FALLBACK_ML_SUMMARY, SummarySource::Fallback), |s| {
        (s, SummarySource::Backend)
    });
    Ok(MlSummaryView {
        accuracy_pct: to_percent(summary.accuracy, decimals)?,
        f1_pct: to_percent(summary.f1_score, decimals)?,
        dataset_volume: summary.dataset_volume,
        source,
    })
}

fn kpis(insights: &InsightsSnapshot, decimals: usize) -> AnalyticsResult<KpiView> {
    let kpis = &insights.kpis;
    Ok(KpiView {
        total_customers: kpis.total_customers,
        churn_rate_pct: to_percent(kpis.churn_rate, decimals)?,
        avg_order_value: to_fixed(kpis.avg_order_value, 2)?,
        total_revenue: to_fixed(kpis.total_revenue, 2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::AnalyticsError, payload::fixtures};
    use shared_logging::MemoryLogger;
    use std::sync::Arc;

    fn inputs() -> (InsightsSnapshot, MetricsResults) {
        (
            serde_json::from_value(fixtures::insights_json()).unwrap(),
            serde_json::from_value(fixtures::metrics_json()).unwrap(),
        )
    }

    #[test]
    fn assembles_every_section() {
        let (insights, results) = inputs();
        let view = DashboardView::assemble(&insights, &results, &ViewOptions::default()).unwrap();
        assert_eq!(view.histogram.len(), 20);
        assert_eq!(view.histogram.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(view.histogram[19].count, 2);
        assert_eq!(view.top_features[0].name, "Lifetime_Value");
        assert_eq!(view.category_rates[0].label, "Male");
        assert_eq!(view.country_rates[1].label, "France");
        assert_eq!(view.age_groups[0].count, 1800);
        assert_eq!(view.kpis.churn_rate_pct, "28.7");
        assert_eq!(view.kpis.avg_order_value, "105.50");
        assert_eq!(view.metrics.best_model.name, "Random Forest");
    }

    #[test]
    fn missing_ml_data_uses_flagged_fallback() {
        let (mut insights, results) = inputs();
        let sink = Arc::new(MemoryLogger::new(8));
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .sink(sink.clone())
            .build()
            .unwrap();
        let view = DashboardView::assemble_with_telemetry(
            &insights,
            &results,
            &ViewOptions::default(),
            Some(&telemetry),
        )
        .unwrap();
        assert_eq!(view.ml_summary.source, SummarySource::Fallback);
        assert_eq!(view.ml_summary.accuracy_pct, "89.30");
        assert_eq!(view.ml_summary.f1_pct, "79.40");
        assert_eq!(view.ml_summary.dataset_volume, 6);
        assert_eq!(
            sink.messages(),
            vec!["analytics.view.ml_fallback", "analytics.view.built"]
        );

        insights.ml_data = Some(MlSummary {
            accuracy: 0.935,
            f1_score: 0.9116,
            dataset_volume: 6,
        });
        let view = DashboardView::assemble(&insights, &results, &ViewOptions::default()).unwrap();
        assert_eq!(view.ml_summary.source, SummarySource::Backend);
        assert_eq!(view.ml_summary.accuracy_pct, "93.50");
    }

    #[test]
    fn absent_probabilities_give_zero_histogram() {
        let (insights, mut results) = inputs();
        results.prob_distribution = None;
        let view = DashboardView::assemble(&insights, &results, &ViewOptions::default()).unwrap();
        assert_eq!(view.histogram.len(), 20);
        assert!(view.histogram.iter().all(|b| b.count == 0));
    }

    #[test]
    fn out_of_range_probability_fails_the_view() {
        let (insights, mut results) = inputs();
        results.prob_distribution = Some(vec![0.4, 1.5]);
        assert!(matches!(
            DashboardView::assemble(&insights, &results, &ViewOptions::default()),
            Err(AnalyticsError::OutOfRangeSample { index: 1, .. })
        ));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let (insights, results) = inputs();
        let view = DashboardView::assemble(&insights, &results, &ViewOptions::default()).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["comparisonRows"].is_array());
        assert_eq!(json["bestModel"]["name"], "Random Forest");
        assert_eq!(json["confusion"]["tp"], 67);
        assert_eq!(json["rocPoints"][1]["baseline"], 0.5);
        assert_eq!(json["histogram"][0]["rangeLabel"], "0.00");
        assert_eq!(json["categoryRates"][0]["label"], "Male");
        assert_eq!(json["mlSummary"]["source"], "fallback");
    }

    #[test]
    fn assembly_is_idempotent() {
        let (insights, results) = inputs();
        let options = ViewOptions::default();
        let first = DashboardView::assemble(&insights, &results, &options).unwrap();
        let second = DashboardView::assemble(&insights, &results, &options).unwrap();
        assert_eq!(first, second);
    }
}
