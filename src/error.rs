//! Error types for pipeline execution.

use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A step's `inputs` had a shape the expander does not recognize.
    #[error("Input expansion error: {0}")]
    Expansion(String),

    /// The model backend failed while answering a message.
    ///
    /// Model failures are never retried; the enclosing step aborts the run.
    #[error("Model invocation error: {0}")]
    Model(String),

    /// The durable store backing the response cache is unreadable or corrupt.
    #[error("Cache store error: {0}")]
    CacheIo(String),

    /// A JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generic error with a message.
    #[error("{0}")]
    Message(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Message(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Message(msg.to_string())
    }
}

/// A specialized `Result` type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
