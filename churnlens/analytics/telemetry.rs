use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Builder for analytics telemetry sinks.
pub struct AnalyticsTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl AnalyticsTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sink: None,
            min_level: LogLevel::Debug,
        }
    }

    /// Writes records as JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sends records to an existing sink instead of a file.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Drops records below `level`.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Builds the telemetry handle. An explicit sink takes precedence over
    /// the log path.
    pub fn build(self) -> Result<AnalyticsTelemetry> {
        let sink: Option<Arc<dyn LogSink>> = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => Some(Arc::new(JsonLogger::new(path)?)),
            (None, None) => None,
        };
        Ok(AnalyticsTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sink,
                min_level: self.min_level,
            }),
        })
    }
}

/// Telemetry handle shared by the loader, the session, and the view builder.
#[derive(Clone)]
pub struct AnalyticsTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for AnalyticsTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsTelemetry")
            .field("module", &self.inner.module)
            .field("min_level", &self.inner.min_level)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl AnalyticsTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> AnalyticsTelemetryBuilder {
        AnalyticsTelemetryBuilder::new(module)
    }

    /// Logs a structured record.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if level < self.inner.min_level {
            return Ok(());
        }
        if let Some(sink) = &self.inner.sink {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            sink.write(&record)?;
        }
        Ok(())
    }
}

/// Logs through optional telemetry, ignoring sink failures.
pub(crate) fn emit(
    telemetry: Option<&AnalyticsTelemetry>,
    level: LogLevel,
    message: &str,
    metadata: Value,
) {
    if let Some(tel) = telemetry {
        let _ = tel.log(level, message, metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_logging::MemoryLogger;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_to_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("analytics.log.jsonl");
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .log_path(&path)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "analytics.view.built", json!({ "rows": 3 }))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("analytics.view.built"));
        assert!(content.contains("\"rows\":3"));
    }

    #[test]
    fn filters_below_min_level() {
        let sink = Arc::new(MemoryLogger::new(8));
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .sink(sink.clone())
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        emit(Some(&telemetry), LogLevel::Debug, "noise", json!({}));
        emit(Some(&telemetry), LogLevel::Warn, "analytics.loader.failed", json!({}));
        emit(None, LogLevel::Error, "dropped", json!({}));
        assert_eq!(sink.messages(), vec!["analytics.loader.failed"]);
    }
}
