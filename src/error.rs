//! Error types for outbound HTTP calls.
//!
//! [`Error`] is the taxonomy every layer shares. [`SendError`] is what a
//! [`HttpClient`](crate::HttpClient) send returns on failure: either a plain
//! [`Error`], or a deserialization failure that still carries the envelope the
//! transport had already populated, so the status and raw body are never lost.

use crate::Envelope;
use std::fmt;

/// A boxed error produced by an external collaborator (the serializer).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for HTTP calls.
///
/// # Examples
///
/// ```
/// use httpwrap::{Error, RequestBuilder, JsonSerializer};
///
/// let builder = RequestBuilder::new(JsonSerializer);
/// match builder.build() {
///     Err(Error::InvalidState(reason)) => println!("builder misuse: {}", reason),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request builder was used before a request was created.
    ///
    /// This is a call-order bug in the caller and is never worth retrying.
    #[error("Invalid builder state: {0}")]
    InvalidState(&'static str),

    /// The response body could not be deserialized into the requested type.
    ///
    /// The raw body and status are preserved so the failure can be debugged
    /// without another round trip.
    #[error("Failed to deserialize response (status {status}): {source}")]
    DeserializationFailed {
        /// The HTTP status code, `0` if no response was obtained
        status: u16,
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serializer's error
        #[source]
        source: BoxError,
    },

    /// The request body could not be serialized.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(#[source] BoxError),

    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The underlying transport gave up waiting for a response.
    #[error("Request timed out")]
    Timeout,

    /// A required collaborator was missing or a header could not be built.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the innermost error of the `source()` chain.
    ///
    /// Returns `self` when there is no underlying source.
    ///
    /// ```
    /// use httpwrap::Error;
    ///
    /// let err = Error::Timeout;
    /// assert_eq!(err.root_cause().to_string(), "Request timed out");
    /// ```
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut current: &(dyn std::error::Error + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

/// A specialized `Result` type for HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;

/// The outcome of a send through any [`HttpClient`](crate::HttpClient).
pub type SendResult<T = ()> = std::result::Result<Envelope<T>, SendError<T>>;

/// A failed send.
///
/// # Examples
///
/// ```
/// use httpwrap::{Envelope, Error, SendError};
///
/// let err: SendError<String> = Error::Timeout.into();
/// assert!(err.envelope().is_none());
/// assert!(matches!(err.error(), Error::Timeout));
/// ```
#[derive(Debug)]
pub enum SendError<T = ()> {
    /// The transport call succeeded but the body could not be deserialized.
    ///
    /// `envelope` holds the status code, success flag, raw body and response
    /// head exactly as the transport populated them.
    Deserialization {
        /// The partially populated envelope
        envelope: Box<Envelope<T>>,
        /// Always an [`Error::DeserializationFailed`]
        error: Error,
    },

    /// Any other failure during dispatch.
    Failed(Error),
}

impl<T> SendError<T> {
    /// The underlying error.
    pub fn error(&self) -> &Error {
        match self {
            SendError::Deserialization { error, .. } => error,
            SendError::Failed(error) => error,
        }
    }

    /// The envelope populated before the failure, if any.
    pub fn envelope(&self) -> Option<&Envelope<T>> {
        match self {
            SendError::Deserialization { envelope, .. } => Some(envelope),
            SendError::Failed(_) => None,
        }
    }

    /// Discards any carried envelope and returns the error.
    pub fn into_error(self) -> Error {
        match self {
            SendError::Deserialization { error, .. } => error,
            SendError::Failed(error) => error,
        }
    }
}

impl<T> From<Error> for SendError<T> {
    fn from(error: Error) -> Self {
        SendError::Failed(error)
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.error(), f)
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error().source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_walks_the_source_chain() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = Error::DeserializationFailed {
            status: 200,
            raw_response: "nope".to_string(),
            source: Box::new(parse),
        };

        assert!(err.root_cause().to_string().contains("expected"));
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.raw_response(), Some("nope"));
    }

    #[test]
    fn send_error_displays_the_inner_error() {
        let err: SendError = Error::ConfigurationError("missing".to_string()).into();
        assert_eq!(err.to_string(), "Configuration error: missing");
        assert!(matches!(err.into_error(), Error::ConfigurationError(_)));
    }

    #[test]
    fn deserialization_variant_exposes_its_envelope() {
        let envelope = Envelope::<u32> {
            status_code: 400,
            original_body: "oops".to_string(),
            ..Envelope::default()
        };
        let err = SendError::Deserialization {
            envelope: Box::new(envelope),
            error: Error::Timeout,
        };

        assert_eq!(err.envelope().map(|e| e.status_code), Some(400));
    }
}
