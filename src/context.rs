//! Execution context for pipeline runs.
//!
//! This module provides the `RunContext` which is threaded through the
//! step processor and pipeline runner, enabling metrics collection and
//! event tracing. It replaces the hidden class-level logger and cache
//! singletons of ad-hoc designs with an explicitly constructed,
//! passed-in collaborator.

use std::sync::{Arc, Mutex};

use crate::events::{RunEvent, TraceEntry};
use crate::metrics::RunMetrics;

/// Context passed through every stage of a pipeline run.
///
/// The context is cloneable and thread-safe; all metric updates are
/// synchronized. Execution itself is strictly sequential, so the locks
/// are never contended in practice.
///
/// # Example
///
/// ```rust
/// use promptgen::{RunContext, RunEvent};
///
/// let ctx = RunContext::new();
/// ctx.emit(RunEvent::StepStart {
///     step_title: "Initial".to_string(),
///     message_count: 1,
/// });
///
/// let traces = ctx.trace_snapshot();
/// assert_eq!(traces.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Shared metrics accumulator.
    pub metrics: Arc<Mutex<RunMetrics>>,
    /// Shared trace log for structured run events.
    pub traces: Arc<Mutex<Vec<TraceEntry>>>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Create a new run context with empty metrics and traces.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(RunMetrics::default())),
            traces: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Increment the steps completed counter.
    pub fn record_step(&self) {
        let mut m = self.metrics.lock().unwrap();
        m.record_step();
    }

    /// Record one model invocation.
    pub fn record_model_call(&self) {
        let mut m = self.metrics.lock().unwrap();
        m.record_model_call();
    }

    /// Record a cache hit.
    pub fn record_cache_hit(&self) {
        let mut m = self.metrics.lock().unwrap();
        m.record_cache_hit();
    }

    /// Record a cache miss.
    pub fn record_cache_miss(&self) {
        let mut m = self.metrics.lock().unwrap();
        m.record_cache_miss();
    }

    /// Record a failure message.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut m = self.metrics.lock().unwrap();
        m.record_failure(error.into());
    }

    /// Get a snapshot of the current metrics.
    #[must_use]
    pub fn snapshot(&self) -> RunMetrics {
        let m = self.metrics.lock().unwrap();
        m.clone()
    }

    /// Emit a structured run event to the trace log.
    ///
    /// Events are timestamped automatically when emitted.
    pub fn emit(&self, event: RunEvent) {
        let entry = TraceEntry::new(event);
        self.traces.lock().unwrap().push(entry);
    }

    /// Get a snapshot of the current trace log.
    #[must_use]
    pub fn trace_snapshot(&self) -> Vec<TraceEntry> {
        self.traces.lock().unwrap().clone()
    }

    /// Clear all trace entries.
    ///
    /// Useful when reusing a context across multiple pipeline runs.
    pub fn clear_traces(&self) {
        self.traces.lock().unwrap().clear();
    }
}
