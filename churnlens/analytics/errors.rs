use thiserror::Error;

/// Result alias used across the analytics crate.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors surfaced by the transforms, the loader, and the data source.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    /// A formatter received a non-finite or missing number.
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    /// A histogram sample fell outside `[0, 1]`.
    #[error("sample #{index} out of range: {value}")]
    OutOfRangeSample {
        /// Position of the offending sample.
        index: usize,
        /// Offending value.
        value: f64,
    },
    /// Histogram geometry is unusable.
    #[error("invalid binning: width {width}, count {count}")]
    InvalidBinning {
        /// Requested bin width.
        width: f64,
        /// Requested bin count.
        count: usize,
    },
    /// ROC coordinate arrays differ in length.
    #[error("roc length mismatch: fpr has {fpr} points, tpr has {tpr}")]
    LengthMismatch {
        /// Length of the false-positive-rate array.
        fpr: usize,
        /// Length of the true-positive-rate array.
        tpr: usize,
    },
    /// A canonical model name is absent from the metrics payload.
    #[error("model '{name}' missing from metrics payload")]
    MissingModel {
        /// Model that was expected.
        name: String,
    },
    /// The best-model pointer does not resolve to a metrics record.
    #[error("best model pointer '{pointer}' does not resolve")]
    DanglingBestModel {
        /// Pointer as received (empty when absent).
        pointer: String,
    },
    /// Network, status, or decode failure from one endpoint.
    #[error("fetch from {endpoint} failed: {message}")]
    FetchFailure {
        /// Logical endpoint name (`insights`, `metrics`, ...).
        endpoint: String,
        /// Underlying failure description.
        message: String,
    },
    /// The dual-source join failed; wraps the first failure observed.
    #[error("dashboard load failed: {0}")]
    JoinFailure(#[source] Box<AnalyticsError>),
    /// The prediction endpoint answered with a non-success status.
    #[error("prediction rejected ({status}): {detail}")]
    PredictionRejected {
        /// HTTP status code.
        status: u16,
        /// `detail` field from the error body.
        detail: String,
    },
    /// A prediction request failed local validation.
    #[error("invalid prediction request: {0}")]
    InvalidRequest(String),
    /// Configuration values are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalyticsError {
    /// Builds a fetch failure for the given endpoint.
    pub fn fetch(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::FetchFailure {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Wraps an error as the aggregate failure of a joined load.
    #[must_use]
    pub fn joined(self) -> Self {
        match self {
            already @ Self::JoinFailure(_) => already,
            other => Self::JoinFailure(Box::new(other)),
        }
    }

    /// Innermost cause of a join failure, or `self`.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::JoinFailure(inner) => inner.root_cause(),
            other => other,
        }
    }
}
