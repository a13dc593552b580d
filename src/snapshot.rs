// Latest metrics + last error, shared between the collector (writer) and renderer (reader)

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::error::SampleError;
use crate::models::DerivedMetrics;

/// An error recorded in the snapshot. `seq` increases with every recorded error,
/// so readers can tell a new error from one they have already shown.
#[derive(Debug, Clone)]
pub struct RecordedError {
    pub seq: u64,
    pub error: Arc<SampleError>,
}

/// A consistent copy of the shared state, as seen by one read.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub metrics: DerivedMetrics,
    pub error: Option<RecordedError>,
    /// A problem with the current sample that did not stop it being shown,
    /// e.g. an unknown memory limit. Cleared by the next published sample.
    pub warning: Option<Arc<SampleError>>,
    /// When metrics were last written; `None` until the first sample.
    pub updated_at: Option<Instant>,
    /// Metrics were zeroed because no sample arrived within the silence timeout.
    pub stale: bool,
}

#[derive(Debug, Default)]
struct State {
    metrics: DerivedMetrics,
    error: Option<RecordedError>,
    warning: Option<Arc<SampleError>>,
    updated_at: Option<Instant>,
    errors_recorded: u64,
}

impl State {
    fn record(&mut self, error: SampleError) {
        self.errors_recorded += 1;
        self.error = Some(RecordedError {
            seq: self.errors_recorded,
            error: Arc::new(error),
        });
    }
}

/// Single-writer, many-reader holder of the latest [`DerivedMetrics`].
///
/// Every write replaces the whole record under the write lock, so a reader
/// never sees fields from two different samples.
#[derive(Debug, Default)]
pub struct SharedSnapshot {
    state: RwLock<State>,
    stale_after: Option<Duration>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the metrics seen by readers when no write happened for `timeout`.
    pub fn with_stale_after(timeout: Duration) -> Self {
        Self {
            state: RwLock::default(),
            stale_after: Some(timeout),
        }
    }

    /// Replace the metrics and clear any previous error or warning.
    pub fn write_metrics(&self, metrics: DerivedMetrics) {
        self.publish(metrics, None);
    }

    /// Replace the metrics, clear the error and set the warning in one step.
    /// A warning is shown alongside the metrics rather than instead of them.
    pub fn publish(&self, metrics: DerivedMetrics, warning: Option<SampleError>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.metrics = metrics;
        state.updated_at = Some(Instant::now());
        state.error = None;
        state.warning = warning.map(Arc::new);
    }

    /// Record an error, leaving the previous metrics in place.
    pub fn write_error(&self, error: SampleError) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.record(error);
    }

    pub fn read(&self) -> Snapshot {
        self.read_at(Instant::now())
    }

    /// Read as of `now`; the staleness check is made against this instant.
    pub fn read_at(&self, now: Instant) -> Snapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let stale = match (self.stale_after, state.updated_at) {
            (Some(timeout), Some(at)) => now.saturating_duration_since(at) > timeout,
            _ => false,
        };
        Snapshot {
            metrics: if stale {
                DerivedMetrics::default()
            } else {
                state.metrics
            },
            error: state.error.clone(),
            warning: state.warning.clone(),
            updated_at: state.updated_at,
            stale,
        }
    }
}
