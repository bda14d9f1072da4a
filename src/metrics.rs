//! Metrics collection for pipeline runs.
//!
//! This module provides `RunMetrics` for tracking step completion,
//! model invocations, cache effectiveness, and failures.

use serde::{Deserialize, Serialize};

/// Aggregated metrics for one pipeline run.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Number of pipeline steps completed successfully.
    pub steps_completed: usize,
    /// Number of messages answered by the model backend (cache misses).
    pub model_calls: usize,
    /// Number of messages answered from the response cache.
    pub cache_hits: usize,
    /// Number of cache lookups that found nothing.
    pub cache_misses: usize,
    /// Collected failure messages from the run.
    pub failures: Vec<String>,
}

impl RunMetrics {
    /// Increment the steps completed counter.
    pub fn record_step(&mut self) {
        self.steps_completed += 1;
    }

    /// Record one model invocation.
    pub fn record_model_call(&mut self) {
        self.model_calls += 1;
    }

    /// Record a cache hit.
    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    /// Record a cache miss.
    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    /// Record a failure message.
    pub fn record_failure(&mut self, error: String) {
        self.failures.push(error);
    }

    /// Check if there were any failures.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Total messages answered, whether from cache or from the model.
    pub fn messages_answered(&self) -> usize {
        self.cache_hits + self.model_calls
    }
}
