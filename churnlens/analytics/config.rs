use std::{env, fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "CHURNLENS_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Canonical presentation order of the comparison table.
pub const DEFAULT_MODEL_ORDER: [&str; 3] = ["Logistic Regression", "Decision Tree", "Random Forest"];

/// Backend location and endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host, and port of the model-serving service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the dataset insights endpoint.
    #[serde(default = "default_insights_path")]
    pub insights_path: String,
    /// Path of the model metrics endpoint.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// Path of the prediction endpoint.
    #[serde(default = "default_predict_path")]
    pub predict_path: String,
    /// Path of the health endpoint.
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Optional per-request deadline in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            insights_path: default_insights_path(),
            metrics_path: default_metrics_path(),
            predict_path: default_predict_path(),
            health_path: default_health_path(),
            timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Defaults with the base URL taken from [`API_URL_ENV`] when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        config
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Joins the base URL with an endpoint path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Knobs of the view-model assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Row order of the comparison table.
    #[serde(default = "default_model_order")]
    pub model_order: Vec<String>,
    /// Width of one probability histogram bucket.
    #[serde(default = "default_bin_width")]
    pub histogram_bin_width: f64,
    /// Number of histogram buckets.
    #[serde(default = "default_bins")]
    pub histogram_bins: usize,
    /// Number of features kept in the importance chart.
    #[serde(default = "default_top_features")]
    pub top_features: usize,
    /// Decimals of the comparison table percentages.
    #[serde(default = "default_percent_decimals")]
    pub percent_decimals: usize,
    /// Decimals of the headline percentages.
    #[serde(default = "default_summary_decimals")]
    pub summary_decimals: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            model_order: default_model_order(),
            histogram_bin_width: default_bin_width(),
            histogram_bins: default_bins(),
            top_features: default_top_features(),
            percent_decimals: default_percent_decimals(),
            summary_decimals: default_summary_decimals(),
        }
    }
}

impl ViewOptions {
    /// Rejects option sets the builders cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.model_order.is_empty() {
            bail!("model_order must name at least one model");
        }
        if !self.histogram_bin_width.is_finite() || self.histogram_bin_width <= 0.0 {
            bail!("histogram_bin_width must be positive");
        }
        if self.histogram_bins == 0 {
            bail!("histogram_bins must be positive");
        }
        if self.top_features == 0 {
            bail!("top_features must be positive");
        }
        Ok(())
    }
}

/// Full configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Backend settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// View assembly settings.
    #[serde(default)]
    pub view: ViewOptions,
}

impl AnalyticsConfig {
    /// Loads configuration from a TOML file; [`API_URL_ENV`] still wins
    /// over the file's base URL when set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_lookup(path, |key| env::var(key).ok())
    }

    /// [`AnalyticsConfig::load`] with an injectable variable source.
    pub fn load_with_lookup(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading analytics config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.api.base_url = url.trim().to_string();
        }
        if config.api.base_url.trim().is_empty() {
            config.api.base_url = default_base_url();
        }
        config
            .view
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(config)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_insights_path() -> String {
    "/api/data-insights".into()
}

fn default_metrics_path() -> String {
    "/api/metrics".into()
}

fn default_predict_path() -> String {
    "/api/predict".into()
}

fn default_health_path() -> String {
    "/api/health".into()
}

fn default_user_agent() -> String {
    "churnlens-analytics/0.1".into()
}

fn default_model_order() -> Vec<String> {
    DEFAULT_MODEL_ORDER.iter().map(|name| (*name).to_string()).collect()
}

const fn default_bin_width() -> f64 {
    0.05
}

const fn default_bins() -> usize {
    20
}

const fn default_top_features() -> usize {
    10
}

const fn default_percent_decimals() -> usize {
    2
}

const fn default_summary_decimals() -> usize {
    1
}
