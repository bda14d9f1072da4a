//! The model backend seam.
//!
//! The pipeline treats inference as an opaque call: message text plus
//! system-level instructions in, response text out. Concrete backends
//! (local runtimes, HTTP APIs) implement [`ModelClient`]; tests supply
//! scripted doubles.

use async_trait::async_trait;

use crate::error::Result;

/// An opaque, blocking-from-the-caller's-perspective model backend.
///
/// The pipeline awaits each call to completion before sending the next
/// message; there is no retry and no timeout. A failure propagates as
/// [`Error::Model`](crate::Error::Model) and aborts the enclosing run.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use promptgen::{ModelClient, Result};
///
/// struct EchoClient;
///
/// #[async_trait]
/// impl ModelClient for EchoClient {
///     async fn infer(&self, message: &str, _system: &str) -> Result<String> {
///         Ok(format!("echo: {message}"))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let client = EchoClient;
/// let answer = client.infer("hello", "").await.unwrap();
/// assert_eq!(answer, "echo: hello");
/// # });
/// ```
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Answer one message under the given system instructions.
    async fn infer(&self, message: &str, system: &str) -> Result<String>;

    /// Returns a human-readable name for this backend. Defaults to the type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl<T: ModelClient + ?Sized> ModelClient for Box<T> {
    async fn infer(&self, message: &str, system: &str) -> Result<String> {
        (**self).infer(message, system).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
