use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use shared_logging::LogLevel;
use tokio::{sync::watch, task::JoinHandle};

use crate::{config::ViewOptions, dashboard::DashboardView, loader::DashboardLoader, telemetry::emit};

/// What a dashboard currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Nothing requested yet.
    Idle,
    /// A load is in flight.
    Loading,
    /// The latest load failed; carries the error text.
    Failed(String),
    /// The latest load succeeded.
    Ready(Arc<DashboardView>),
}

impl ViewState {
    /// Whether the latest load has finished.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Ready(_))
    }
}

struct SessionSlot {
    generation: u64,
    closed: bool,
    task: Option<JoinHandle<()>>,
}

/// Owns the loads behind one hosted dashboard.
///
/// Every [`DashboardSession::refresh`] starts a new generation and aborts the
/// previous load. A finished load publishes only while its generation is
/// current and the session is open, so a slow response never overwrites a
/// newer render or touches a torn-down view.
pub struct DashboardSession {
    loader: DashboardLoader,
    options: Arc<ViewOptions>,
    state: Arc<watch::Sender<ViewState>>,
    slot: Arc<Mutex<SessionSlot>>,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("DashboardSession")
            .field("generation", &slot.generation)
            .field("closed", &slot.closed)
            .finish_non_exhaustive()
    }
}

impl DashboardSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(loader: DashboardLoader, options: ViewOptions) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            loader,
            options: Arc::new(options),
            state: Arc::new(state),
            slot: Arc::new(Mutex::new(SessionSlot {
                generation: 0,
                closed: false,
                task: None,
            })),
        }
    }

    /// Receiver of state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Whether [`DashboardSession::teardown`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    /// Starts a new load, superseding any in-flight one. Returns the new
    /// generation, or `None` once the session is closed. Must be called
    /// from within a tokio runtime.
    pub fn refresh(&self) -> Option<u64> {
        let mut slot = self.slot.lock();
        if slot.closed {
            return None;
        }
        if let Some(previous) = slot.task.take() {
            previous.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;
        self.state.send_replace(ViewState::Loading);

        let loader = self.loader.clone();
        let options = Arc::clone(&self.options);
        let state = Arc::clone(&self.state);
        let shared = Arc::clone(&self.slot);
        slot.task = Some(tokio::spawn(async move {
            let outcome = loader.load_view(&options).await;
            let telemetry = loader.telemetry();
            let guard = shared.lock();
            let (current, closed) = (guard.generation, guard.closed);
            let (level, message, metadata) = if closed || current != generation {
                (
                    LogLevel::Debug,
                    "analytics.session.discarded",
                    json!({ "generation": generation, "current": current, "closed": closed }),
                )
            } else {
                match outcome {
                    Ok(view) => {
                        state.send_replace(ViewState::Ready(Arc::new(view)));
                        (
                            LogLevel::Info,
                            "analytics.session.ready",
                            json!({ "generation": generation }),
                        )
                    }
                    Err(err) => {
                        let text = err.to_string();
                        state.send_replace(ViewState::Failed(text.clone()));
                        (
                            LogLevel::Warn,
                            "analytics.session.failed",
                            json!({ "generation": generation, "error": text }),
                        )
                    }
                }
            };
            // sinks may do file I/O; refresh and teardown must not wait on it
            drop(guard);
            emit(telemetry, level, message, metadata);
        }));
        Some(generation)
    }

    /// Abandons any in-flight load and closes the session. Idempotent.
    pub fn teardown(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;
    use crate::{loader::stub::StubSource, telemetry::AnalyticsTelemetry};
    use shared_logging::{LogRecord, LogSink, MemoryLogger};

    /// Counts writes that happen while the session slot is locked.
    #[derive(Default)]
    struct SlotWatchSink {
        slot: Mutex<Option<Arc<Mutex<SessionSlot>>>>,
        writes: AtomicUsize,
        writes_under_lock: AtomicUsize,
    }

    impl LogSink for SlotWatchSink {
        fn write(&self, _record: &LogRecord) -> anyhow::Result<()> {
            if let Some(slot) = self.slot.lock().as_ref() {
                self.writes.fetch_add(1, Ordering::SeqCst);
                if slot.try_lock().is_none() {
                    self.writes_under_lock.fetch_add(1, Ordering::SeqCst);
                }
            }
            Ok(())
        }
    }

    fn session(source: StubSource) -> (DashboardSession, Arc<MemoryLogger>) {
        let sink = Arc::new(MemoryLogger::new(32));
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .sink(sink.clone())
            .build()
            .unwrap();
        let loader = DashboardLoader::new(Arc::new(source)).with_telemetry(telemetry);
        (DashboardSession::new(loader, ViewOptions::default()), sink)
    }

    #[tokio::test]
    async fn publishes_ready_view() {
        let (session, sink) = session(StubSource::default());
        let mut rx = session.subscribe();
        assert_eq!(session.state(), ViewState::Idle);
        assert_eq!(session.refresh(), Some(1));
        let state = rx.wait_for(ViewState::is_settled).await.unwrap().clone();
        match state {
            ViewState::Ready(view) => assert_eq!(view.metrics.best_model.name, "Random Forest"),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(sink
            .messages()
            .iter()
            .any(|message| message == "analytics.session.ready"));
    }

    #[tokio::test]
    async fn publishes_failure_without_partial_view() {
        let (session, _) = session(StubSource {
            fail_insights: true,
            ..StubSource::default()
        });
        let mut rx = session.subscribe();
        session.refresh();
        let state = rx.wait_for(ViewState::is_settled).await.unwrap().clone();
        assert!(matches!(state, ViewState::Failed(message) if message.contains("insights")));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_discards_pending_load() {
        let (session, _) = session(StubSource {
            delay: Some(Duration::from_secs(5)),
            ..StubSource::default()
        });
        session.refresh();
        assert_eq!(session.state(), ViewState::Loading);
        session.teardown();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(session.state(), ViewState::Loading);
        assert!(session.is_closed());
        assert_eq!(session.refresh(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_supersedes_in_flight_load() {
        let (session, sink) = session(StubSource {
            delay: Some(Duration::from_secs(5)),
            ..StubSource::default()
        });
        let mut rx = session.subscribe();
        assert_eq!(session.refresh(), Some(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(session.refresh(), Some(2));
        let state = rx.wait_for(ViewState::is_settled).await.unwrap().clone();
        assert!(matches!(state, ViewState::Ready(_)));
        let ready = sink
            .messages()
            .iter()
            .filter(|message| *message == "analytics.session.ready")
            .count();
        assert_eq!(ready, 1);
    }

    #[tokio::test]
    async fn session_events_are_logged_outside_the_slot_lock() {
        let sink = Arc::new(SlotWatchSink::default());
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .sink(sink.clone())
            .build()
            .unwrap();
        let loader =
            DashboardLoader::new(Arc::new(StubSource::default())).with_telemetry(telemetry);
        let session = DashboardSession::new(loader, ViewOptions::default());
        *sink.slot.lock() = Some(Arc::clone(&session.slot));
        let mut rx = session.subscribe();
        session.refresh();
        rx.wait_for(ViewState::is_settled).await.unwrap();
        assert!(sink.writes.load(Ordering::SeqCst) > 0);
        assert_eq!(sink.writes_under_lock.load(Ordering::SeqCst), 0);
    }
}
