use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::ApiConfig,
    errors::{AnalyticsError, AnalyticsResult},
    payload::{ErrorBody, InsightsEnvelope, InsightsSnapshot, MetricsEnvelope, MetricsResults},
    prediction::{PredictRequest, PredictResponse},
};

/// Logical endpoint name of the insights fetch.
pub const INSIGHTS_ENDPOINT: &str = "insights";
/// Logical endpoint name of the metrics fetch.
pub const METRICS_ENDPOINT: &str = "metrics";
/// Logical endpoint name of the prediction call.
pub const PREDICT_ENDPOINT: &str = "predict";
/// Logical endpoint name of the health probe.
pub const HEALTH_ENDPOINT: &str = "health";

/// Provider of the two payloads the dashboard is built from.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Fetches the dataset insights.
    async fn fetch_insights(&self) -> AnalyticsResult<InsightsSnapshot>;

    /// Fetches the model evaluation results.
    async fn fetch_metrics(&self) -> AnalyticsResult<MetricsResults>;
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `ok` when the API is up.
    pub status: String,
    /// Free-form message.
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    /// Whether the backend reported itself healthy.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// reqwest-backed source talking to the model-serving API.
#[derive(Debug, Clone)]
pub struct HttpDashboardSource {
    client: Client,
    config: ApiConfig,
}

impl HttpDashboardSource {
    /// Creates a source for the given API configuration.
    pub fn new(config: ApiConfig) -> AnalyticsResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(AnalyticsError::InvalidConfig("base_url is empty".into()));
        }
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|err| AnalyticsError::InvalidConfig(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Scores one customer record.
    pub async fn predict(&self, request: &PredictRequest) -> AnalyticsResult<PredictResponse> {
        request.validate()?;
        let url = self.config.endpoint(&self.config.predict_path);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| AnalyticsError::fetch(PREDICT_ENDPOINT, err))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| "Prediction failed".into());
            return Err(AnalyticsError::PredictionRejected {
                status: status.as_u16(),
                detail,
            });
        }
        response
            .json::<PredictResponse>()
            .await
            .map_err(|err| AnalyticsError::fetch(PREDICT_ENDPOINT, err))
    }

    /// Probes the health endpoint.
    pub async fn health(&self) -> AnalyticsResult<HealthStatus> {
        self.get_json(HEALTH_ENDPOINT, &self.config.health_path)
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, path: &str) -> AnalyticsResult<T> {
        let url = self.config.endpoint(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| AnalyticsError::fetch(endpoint, err))?
            .error_for_status()
            .map_err(|err| AnalyticsError::fetch(endpoint, err))?;
        response
            .json::<T>()
            .await
            .map_err(|err| AnalyticsError::fetch(endpoint, format!("invalid body: {err}")))
    }
}

#[async_trait]
impl DashboardSource for HttpDashboardSource {
    async fn fetch_insights(&self) -> AnalyticsResult<InsightsSnapshot> {
        let envelope: InsightsEnvelope = self
            .get_json(INSIGHTS_ENDPOINT, &self.config.insights_path)
            .await?;
        Ok(envelope.data)
    }

    async fn fetch_metrics(&self) -> AnalyticsResult<MetricsResults> {
        let envelope: MetricsEnvelope = self
            .get_json(METRICS_ENDPOINT, &self.config.metrics_path)
            .await?;
        Ok(envelope.results)
    }
}
