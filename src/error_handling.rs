//! The error-capturing decorator.
//!
//! [`ErrorHandlingClient`] is the one recovery boundary of a chain: whatever
//! the inner client raises comes back as an [`Envelope`] with `error` set.

use crate::{Envelope, HttpClient, SendError, SendResult};
use reqwest::Request;
use serde::de::DeserializeOwned;
use std::future::Future;

/// Wraps a client so that every send resolves to an envelope.
///
/// - A deserialization failure returns the transport's envelope with `error`
///   set and `success` cleared.
/// - Any other failure returns a fresh envelope whose only populated field is
///   `error`.
///
/// Calls through this layer never return `Err`.
///
/// # Examples
///
/// ```no_run
/// use httpwrap::{ErrorHandlingClient, HttpClient, JsonSerializer, TransportClient};
///
/// # async fn example(request: reqwest::Request) {
/// let client = ErrorHandlingClient::new(TransportClient::new(reqwest::Client::new(), JsonSerializer));
///
/// let envelope = client.send_typed::<serde_json::Value>(request).await.unwrap();
/// if let Some(error) = &envelope.error {
///     eprintln!("call failed (status {}): {}", envelope.status_code, error);
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ErrorHandlingClient<C> {
    inner: C,
}

impl<C> ErrorHandlingClient<C> {
    /// Wraps `inner`.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

/// Turns a failed send into an envelope carrying the failure.
fn capture<T>(failure: SendError<T>) -> Envelope<T> {
    match failure {
        SendError::Deserialization { envelope, error } => {
            let mut envelope = *envelope;
            envelope.error = Some(error);
            envelope.success = false;
            envelope
        }
        SendError::Failed(error) => {
            tracing::debug!(error = %error, "Captured send failure into envelope");
            Envelope::from_error(error)
        }
    }
}

impl<C: HttpClient> HttpClient for ErrorHandlingClient<C> {
    fn send_typed<T>(&self, request: Request) -> impl Future<Output = SendResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move { Ok(self.inner.send_typed::<T>(request).await.unwrap_or_else(capture)) }
    }

    fn send(&self, request: Request) -> impl Future<Output = SendResult> + Send {
        async move { Ok(self.inner.send(request).await.unwrap_or_else(capture)) }
    }
}
