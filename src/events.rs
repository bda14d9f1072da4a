//! Structured run events for tracing and observability.
//!
//! This module defines the event types that can be emitted while a pipeline
//! runs, enabling detailed tracking of step execution, cache behavior, and
//! errors without relying on unstructured string logs.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Events that can be emitted during a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RunEvent {
    /// A step has started processing.
    StepStart {
        /// Title of the step being processed.
        step_title: String,
        /// Number of expanded messages the step will send.
        message_count: usize,
    },
    /// A message was answered from the response cache.
    CacheHit {
        /// Title of the step the message belongs to.
        step_title: String,
    },
    /// A message was not found in the cache and went to the model.
    CacheMiss {
        /// Title of the step the message belongs to.
        step_title: String,
    },
    /// A step has finished successfully.
    StepEnd {
        /// Title of the step that completed.
        step_title: String,
        /// Duration of processing in milliseconds.
        duration_ms: u128,
    },
    /// An error occurred while processing a step.
    Error {
        /// Title of the step where the error occurred.
        step_title: String,
        /// Error message describing what went wrong.
        message: String,
    },
}

/// A timestamped trace entry containing a run event.
///
/// Each trace entry records when the event occurred (as Unix epoch
/// milliseconds) along with the event itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Unix epoch timestamp in milliseconds when this event occurred.
    pub timestamp: u128,
    /// The run event that was recorded.
    #[serde(flatten)]
    pub event: RunEvent,
}

impl TraceEntry {
    /// Create a new trace entry with the current timestamp.
    #[must_use]
    pub fn new(event: RunEvent) -> Self {
        let start = SystemTime::now();
        let timestamp = start
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis();
        Self { timestamp, event }
    }
}
