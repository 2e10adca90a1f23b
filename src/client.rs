//! The client contract and the transport-backed client.
//!
//! Every layer of a chain implements [`HttpClient`]: the [`TransportClient`]
//! at the bottom, and decorators such as
//! [`ErrorHandlingClient`](crate::ErrorHandlingClient) and
//! [`LoggingClient`](crate::LoggingClient) wrapped around it in whatever order
//! the caller assembles.

use crate::{
    envelope::ResponseHead, Envelope, Error, ErrorHandlingClient, JsonSerializer, LogSink,
    LoggingClient, Result, SendError, SendResult, Serializer, Transport,
};
use reqwest::Request;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;

/// The shared two-operation contract of every layer.
pub trait HttpClient: Send + Sync {
    /// Sends `request` and eagerly deserializes a non-empty JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Deserialization`] carrying the populated envelope
    /// when the body cannot be parsed, and [`SendError::Failed`] for any other
    /// failure during dispatch.
    fn send_typed<T>(&self, request: Request) -> impl Future<Output = SendResult<T>> + Send
    where
        T: DeserializeOwned + Send;

    /// Sends `request` without attempting deserialization.
    ///
    /// Use [`Envelope::materialize`] to parse the body later.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Failed`] if dispatch fails.
    fn send(&self, request: Request) -> impl Future<Output = SendResult> + Send;
}

/// Composition helpers for any [`HttpClient`].
///
/// ```no_run
/// use httpwrap::{HttpClient, HttpClientExt, TransportClient, JsonSerializer};
///
/// let client = TransportClient::new(reqwest::Client::new(), JsonSerializer)
///     .with_error_handling()
///     .with_logging();
/// ```
pub trait HttpClientExt: HttpClient + Sized {
    /// Wraps `self` so that failures are captured into envelopes.
    fn with_error_handling(self) -> ErrorHandlingClient<Self> {
        ErrorHandlingClient::new(self)
    }

    /// Wraps `self` with request/response logging through `tracing`.
    fn with_logging(self) -> LoggingClient<Self> {
        LoggingClient::new(self)
    }

    /// Wraps `self` with request/response logging through `sink`.
    fn with_log_sink<L: LogSink>(self, sink: L) -> LoggingClient<Self, L> {
        LoggingClient::with_sink(self, sink)
    }
}

impl<C: HttpClient> HttpClientExt for C {}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn send_typed<T>(&self, request: Request) -> impl Future<Output = SendResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        (**self).send_typed(request)
    }

    fn send(&self, request: Request) -> impl Future<Output = SendResult> + Send {
        (**self).send(request)
    }
}

/// The bottom of every chain: sends requests over a [`Transport`] and builds
/// the envelope.
///
/// The client holds no call-scoped state and is cheap to clone, so one
/// instance can serve concurrent calls.
///
/// # Examples
///
/// ```no_run
/// use httpwrap::{HttpClient, JsonSerializer, RequestBuilder, TransportClient};
/// use http::Method;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct User { id: u64, name: String }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TransportClient::builder()
///     .http_client(reqwest::Client::new())
///     .serializer(JsonSerializer)
///     .build()?;
///
/// let request = RequestBuilder::new(JsonSerializer)
///     .create_request("https://api.example.com/users/123", Method::GET)?
///     .build()?;
///
/// let envelope = client.send_typed::<User>(request).await?;
/// if let Some(user) = envelope.response {
///     println!("{} is user {}", user.name, user.id);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TransportClient<Tr = reqwest::Client, S = JsonSerializer> {
    inner: Arc<ClientInner<Tr, S>>,
}

struct ClientInner<Tr, S> {
    transport: Tr,
    serializer: S,
}

impl<Tr, S> Clone for TransportClient<Tr, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl TransportClient {
    /// Creates a new `TransportClientBuilder` for configuring a client.
    pub fn builder() -> TransportClientBuilder {
        TransportClientBuilder::new()
    }
}

impl<Tr: Transport, S: Serializer> TransportClient<Tr, S> {
    /// Creates a client from its two collaborators.
    pub fn new(transport: Tr, serializer: S) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                serializer,
            }),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Tr {
        &self.inner.transport
    }

    /// The serializer used for eager deserialization.
    pub fn serializer(&self) -> &S {
        &self.inner.serializer
    }

    /// Dispatches the request and fills status, success flag, body and head.
    ///
    /// A transport that yields no response leaves the default envelope.
    async fn dispatch<T>(&self, request: Request) -> Result<Envelope<T>> {
        let mut envelope = Envelope::new();

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Dispatching HTTP request"
        );

        let Some(response) = self.inner.transport.dispatch(request).await? else {
            tracing::debug!("Transport returned no response");
            return Ok(envelope);
        };

        let head = ResponseHead::from_response(&response);
        envelope.status_code = head.status.as_u16();
        envelope.success = head.status.is_success();
        envelope.raw_response = Some(head);
        envelope.original_body = response.text().await?;

        tracing::debug!(
            status = envelope.status_code,
            body_len = envelope.original_body.len(),
            "Received HTTP response"
        );

        Ok(envelope)
    }
}

impl<Tr: Transport, S: Serializer> HttpClient for TransportClient<Tr, S> {
    fn send_typed<T>(&self, request: Request) -> impl Future<Output = SendResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let mut envelope = self.dispatch::<T>(request).await?;

            if !envelope.has_body() || !envelope.is_json() {
                return Ok(envelope);
            }

            match self.inner.serializer.deserialize::<T>(&envelope.original_body) {
                Ok(payload) => {
                    envelope.response = Some(payload);
                    Ok(envelope)
                }
                Err(source) => {
                    tracing::error!(
                        error = %source,
                        status = envelope.status_code,
                        raw_response = %envelope.original_body,
                        "Failed to deserialize response"
                    );

                    let error = Error::DeserializationFailed {
                        status: envelope.status_code,
                        raw_response: envelope.original_body.clone(),
                        source,
                    };
                    Err(SendError::Deserialization {
                        envelope: Box::new(envelope),
                        error,
                    })
                }
            }
        }
    }

    fn send(&self, request: Request) -> impl Future<Output = SendResult> + Send {
        async move { Ok(self.dispatch(request).await?) }
    }
}

/// Builder for configuring and creating a [`TransportClient`].
///
/// Both collaborators are required; [`TransportClientBuilder::build`] fails
/// immediately if either is missing.
///
/// ```
/// use httpwrap::{Error, TransportClient};
///
/// let result = TransportClient::builder().http_client(reqwest::Client::new()).build();
/// assert!(matches!(result, Err(Error::ConfigurationError(_))));
/// ```
pub struct TransportClientBuilder<Tr = reqwest::Client, S = JsonSerializer> {
    transport: Option<Tr>,
    serializer: Option<S>,
}

impl TransportClientBuilder {
    /// Creates a builder with no collaborators set.
    pub fn new() -> Self {
        Self {
            transport: None,
            serializer: None,
        }
    }
}

impl<Tr, S> TransportClientBuilder<Tr, S> {
    /// Sets the transport.
    pub fn transport<Tr2: Transport>(self, transport: Tr2) -> TransportClientBuilder<Tr2, S> {
        TransportClientBuilder {
            transport: Some(transport),
            serializer: self.serializer,
        }
    }

    /// Uses a configured `reqwest::Client` as the transport.
    ///
    /// Timeouts, proxies and TLS settings are taken from the given client.
    pub fn http_client(self, client: reqwest::Client) -> TransportClientBuilder<reqwest::Client, S> {
        self.transport(client)
    }

    /// Sets the serializer used for eager deserialization.
    pub fn serializer<S2: Serializer>(self, serializer: S2) -> TransportClientBuilder<Tr, S2> {
        TransportClientBuilder {
            transport: self.transport,
            serializer: Some(serializer),
        }
    }
}

impl<Tr: Transport, S: Serializer> TransportClientBuilder<Tr, S> {
    /// Builds the configured `TransportClient`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the transport or the serializer
    /// was not provided.
    pub fn build(self) -> Result<TransportClient<Tr, S>> {
        let transport = self
            .transport
            .ok_or_else(|| Error::ConfigurationError("Transport is required".to_string()))?;
        let serializer = self
            .serializer
            .ok_or_else(|| Error::ConfigurationError("Serializer is required".to_string()))?;

        Ok(TransportClient::new(transport, serializer))
    }
}

impl Default for TransportClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
