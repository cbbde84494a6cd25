#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Churnlens analytics transformation layer.
//!
//! Fetches dataset insights and model evaluation results from the
//! model-serving API, joins them, and shapes them into a render-ready
//! dashboard view model.

/// Error kinds and the crate result alias.
#[path = "../errors.rs"]
pub mod errors;

/// Backend location and view assembly options.
#[path = "../config.rs"]
pub mod config;

/// Structured logging facade over the shared sinks.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Wire shapes of the insights and metrics payloads.
#[path = "../payload.rs"]
pub mod payload;

/// Pure transforms: formatting, binning, ROC, ranking, category rates.
#[path = "../transform/main.rs"]
pub mod transform;

/// Model comparison, best model, confusion matrix, and ROC sections.
#[path = "../metrics_view.rs"]
pub mod metrics_view;

/// Whole-dashboard view assembly.
#[path = "../dashboard.rs"]
pub mod dashboard;

/// Prediction request and result card.
#[path = "../prediction.rs"]
pub mod prediction;

/// HTTP data source.
#[path = "../source.rs"]
pub mod source;

/// Concurrent dual-source loading.
#[path = "../loader.rs"]
pub mod loader;

/// Cancellable view sessions.
#[path = "../session.rs"]
pub mod session;

pub use config::{AnalyticsConfig, ApiConfig, ViewOptions};
pub use dashboard::{DashboardView, KpiView, MlSummaryView, SummarySource};
pub use errors::{AnalyticsError, AnalyticsResult};
pub use loader::{DashboardLoader, DashboardPayload};
pub use metrics_view::{MetricsView, MetricsViewBuilder};
pub use payload::{InsightsSnapshot, MetricsResults, ModelMetrics};
pub use prediction::{PredictRequest, PredictResponse, PredictionView, RiskVerdict};
pub use session::{DashboardSession, ViewState};
pub use source::{DashboardSource, HealthStatus, HttpDashboardSource};
pub use telemetry::{AnalyticsTelemetry, AnalyticsTelemetryBuilder};
