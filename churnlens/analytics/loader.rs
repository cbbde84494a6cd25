use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join;
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    config::ViewOptions,
    dashboard::DashboardView,
    errors::AnalyticsResult,
    payload::{InsightsSnapshot, MetricsResults},
    source::DashboardSource,
    telemetry::{emit, AnalyticsTelemetry},
};

/// Both payloads of one successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPayload {
    /// Dataset insights.
    pub insights: InsightsSnapshot,
    /// Model evaluation results.
    pub metrics: MetricsResults,
    /// Identifier of the load, for log correlation.
    pub load_id: Uuid,
    /// When both fetches completed.
    pub fetched_at: DateTime<Utc>,
}

impl DashboardPayload {
    /// Assembles the view model of this payload.
    pub fn view(&self, options: &ViewOptions) -> AnalyticsResult<DashboardView> {
        DashboardView::assemble(&self.insights, &self.metrics, options)
    }
}

/// Fetches insights and metrics concurrently and joins them.
#[derive(Clone)]
pub struct DashboardLoader {
    source: Arc<dyn DashboardSource>,
    telemetry: Option<AnalyticsTelemetry>,
}

impl std::fmt::Debug for DashboardLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardLoader")
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl DashboardLoader {
    /// Creates a loader over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn DashboardSource>) -> Self {
        Self {
            source,
            telemetry: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: AnalyticsTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Telemetry attached to this loader, if any.
    #[must_use]
    pub fn telemetry(&self) -> Option<&AnalyticsTelemetry> {
        self.telemetry.as_ref()
    }

    /// Issues both fetches at once. Either failure fails the whole load
    /// with a join failure wrapping the first error observed; the other
    /// fetch is dropped.
    pub async fn load(&self) -> AnalyticsResult<DashboardPayload> {
        let load_id = Uuid::new_v4();
        emit(
            self.telemetry.as_ref(),
            LogLevel::Debug,
            "analytics.loader.fetch",
            json!({ "load_id": load_id.to_string() }),
        );
        let joined = try_join(self.source.fetch_insights(), self.source.fetch_metrics()).await;
        match joined {
            Ok((insights, metrics)) => {
                emit(
                    self.telemetry.as_ref(),
                    LogLevel::Info,
                    "analytics.loader.joined",
                    json!({
                        "load_id": load_id.to_string(),
                        "models": metrics.metrics.len(),
                        "total_customers": insights.kpis.total_customers,
                    }),
                );
                Ok(DashboardPayload {
                    insights,
                    metrics,
                    load_id,
                    fetched_at: Utc::now(),
                })
            }
            Err(err) => {
                let err = err.joined();
                emit(
                    self.telemetry.as_ref(),
                    LogLevel::Error,
                    "analytics.loader.failed",
                    json!({ "load_id": load_id.to_string(), "error": err.to_string() }),
                );
                Err(err)
            }
        }
    }

    /// Loads both payloads and assembles the view. A view is only returned
    /// when both fetches and the assembly succeed.
    pub async fn load_view(&self, options: &ViewOptions) -> AnalyticsResult<DashboardView> {
        let payload = self.load().await?;
        DashboardView::assemble_with_telemetry(
            &payload.insights,
            &payload.metrics,
            options,
            self.telemetry.as_ref(),
        )
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{errors::AnalyticsError, payload::fixtures};

    /// In-memory source with optional failures and delays.
    #[derive(Debug, Clone, Default)]
    pub struct StubSource {
        pub fail_insights: bool,
        pub fail_metrics: bool,
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl DashboardSource for StubSource {
        async fn fetch_insights(&self) -> AnalyticsResult<InsightsSnapshot> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_insights {
                return Err(AnalyticsError::fetch("insights", "connection refused"));
            }
            Ok(serde_json::from_value(fixtures::insights_json()).unwrap())
        }

        async fn fetch_metrics(&self) -> AnalyticsResult<MetricsResults> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_metrics {
                return Err(AnalyticsError::fetch("metrics", "HTTP 500"));
            }
            Ok(serde_json::from_value(fixtures::metrics_json()).unwrap())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubSource;
    use super::*;
    use crate::errors::AnalyticsError;
    use shared_logging::MemoryLogger;

    fn loader(source: StubSource) -> (DashboardLoader, Arc<MemoryLogger>) {
        let sink = Arc::new(MemoryLogger::new(16));
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .sink(sink.clone())
            .build()
            .unwrap();
        (
            DashboardLoader::new(Arc::new(source)).with_telemetry(telemetry),
            sink,
        )
    }

    #[tokio::test]
    async fn joins_both_payloads() {
        let (loader, sink) = loader(StubSource::default());
        let payload = loader.load().await.unwrap();
        assert_eq!(payload.insights.kpis.total_customers, 5000);
        assert_eq!(payload.metrics.metrics.len(), 3);
        assert_eq!(
            sink.messages(),
            vec!["analytics.loader.fetch", "analytics.loader.joined"]
        );
        let view = payload.view(&ViewOptions::default()).unwrap();
        assert_eq!(view.metrics.best_model.name, "Random Forest");
    }

    #[tokio::test]
    async fn one_failure_fails_the_load() {
        let (loader, sink) = loader(StubSource {
            fail_metrics: true,
            ..StubSource::default()
        });
        let err = loader.load_view(&ViewOptions::default()).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::JoinFailure(_)));
        assert!(matches!(
            err.root_cause(),
            AnalyticsError::FetchFailure { endpoint, .. } if endpoint == "metrics"
        ));
        assert_eq!(sink.messages().last().unwrap(), "analytics.loader.failed");
    }

    #[tokio::test]
    async fn both_failures_report_one_error() {
        let (loader, _) = loader(StubSource {
            fail_insights: true,
            fail_metrics: true,
            ..StubSource::default()
        });
        let err = loader.load().await.unwrap_err();
        assert!(matches!(
            err.root_cause(),
            AnalyticsError::FetchFailure { .. }
        ));
    }

    #[tokio::test]
    async fn load_view_assembles_with_telemetry() {
        let (loader, sink) = loader(StubSource::default());
        let view = loader.load_view(&ViewOptions::default()).await.unwrap();
        assert_eq!(view.histogram.len(), 20);
        assert!(sink
            .messages()
            .iter()
            .any(|message| message == "analytics.view.built"));
    }
}
