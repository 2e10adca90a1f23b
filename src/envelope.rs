//! The response envelope produced by every send.
//!
//! An [`Envelope`] aggregates the transport outcome (status, success flag, raw
//! body, response head), an optional typed payload and an optional captured
//! error. Untyped sends produce `Envelope<()>`; typed sends produce
//! `Envelope<T>` with `response` filled eagerly when the body is JSON.

use crate::{Error, Result, Serializer};
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

/// The canonical JSON media type.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// The parts of the transport response kept after the body has been read.
///
/// Decorators use this to inspect headers; the body itself lives in
/// [`Envelope::original_body`].
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The HTTP version of the response.
    pub version: Version,

    /// The response headers.
    pub headers: HeaderMap,

    /// The final URL of the response.
    pub url: Url,
}

impl ResponseHead {
    /// Captures the head of a transport response.
    pub fn from_response(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        }
    }

    /// Returns the `Content-Type` header, if present and valid text.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)?
            .to_str()
            .ok()
    }

    /// Returns `true` if the media type is exactly `application/json`.
    ///
    /// Media type parameters such as `charset` are ignored; `application/problem+json`
    /// and friends are not JSON for this purpose.
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|value| {
            let essence = value.split(';').next().unwrap_or_default().trim();
            essence.eq_ignore_ascii_case(JSON_MEDIA_TYPE)
        })
    }
}

/// The per-call response object.
///
/// # Type Parameters
///
/// * `T` - The type of the eagerly deserialized payload, `()` for untyped sends
///
/// # Examples
///
/// ```
/// use httpwrap::{Envelope, Error};
///
/// let envelope: Envelope<String> = Envelope::from_error(Error::Timeout);
/// assert!(envelope.is_error());
/// assert!(!envelope.success);
/// assert_eq!(envelope.status_code, 0);
/// ```
#[derive(Debug)]
pub struct Envelope<T = ()> {
    /// The HTTP status code, `0` if no response was obtained.
    pub status_code: u16,

    /// `true` iff a response was obtained with a 2xx status code and no error
    /// was captured.
    pub success: bool,

    /// The raw response body. Empty when there was no content.
    pub original_body: String,

    /// The head of the transport response, `None` if no response was obtained.
    pub raw_response: Option<ResponseHead>,

    /// The typed payload, filled at send time when the body is non-empty JSON.
    pub response: Option<T>,

    /// The captured failure, set by the error-handling decorator.
    pub error: Option<Error>,
}

impl<T> Envelope<T> {
    /// Creates an envelope with no response: status `0`, not successful, no body.
    pub fn new() -> Self {
        Self {
            status_code: 0,
            success: false,
            original_body: String::new(),
            raw_response: None,
            response: None,
            error: None,
        }
    }

    /// Creates an envelope whose only populated field is `error`.
    pub fn from_error(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Self::new()
        }
    }

    /// Returns `true` if a failure was captured into this envelope.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns `true` if the body has non-whitespace content.
    pub fn has_body(&self) -> bool {
        !self.original_body.trim().is_empty()
    }

    /// Returns `true` if the transport response declared a JSON body.
    pub fn is_json(&self) -> bool {
        self.raw_response.as_ref().is_some_and(ResponseHead::is_json)
    }

    /// Returns a response header value by name.
    ///
    /// ```
    /// use httpwrap::Envelope;
    ///
    /// let envelope: Envelope = Envelope::new();
    /// assert_eq!(envelope.header("content-type"), None);
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw_response
            .as_ref()?
            .headers
            .get(name)?
            .to_str()
            .ok()
    }

    /// Deserializes `original_body` into `U` on demand.
    ///
    /// This is how an untyped envelope is turned into a typed value after the
    /// fact. The serializer is always invoked, whatever the content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] if the serializer rejects the body.
    /// The envelope itself is left untouched.
    ///
    /// ```
    /// use httpwrap::{Envelope, JsonSerializer};
    ///
    /// let envelope: Envelope = Envelope {
    ///     status_code: 200,
    ///     success: true,
    ///     original_body: "[1,2]".to_string(),
    ///     ..Envelope::new()
    /// };
    ///
    /// let values: Vec<u8> = envelope.materialize(&JsonSerializer).unwrap();
    /// assert_eq!(values, vec![1, 2]);
    /// ```
    pub fn materialize<U, S>(&self, serializer: &S) -> Result<U>
    where
        U: DeserializeOwned,
        S: Serializer + ?Sized,
    {
        serializer
            .deserialize(&self.original_body)
            .map_err(|source| Error::DeserializationFailed {
                status: self.status_code,
                raw_response: self.original_body.clone(),
                source,
            })
    }

    /// Re-types the envelope, dropping any payload.
    ///
    /// Status, body, response head and error carry over unchanged.
    pub fn with_payload_type<U>(self) -> Envelope<U> {
        Envelope {
            status_code: self.status_code,
            success: self.success,
            original_body: self.original_body,
            raw_response: self.raw_response,
            response: None,
            error: self.error,
        }
    }

    /// Maps the payload to a different type, preserving everything else.
    pub fn map<U, F>(self, f: F) -> Envelope<U>
    where
        F: FnOnce(T) -> U,
    {
        Envelope {
            status_code: self.status_code,
            success: self.success,
            original_body: self.original_body,
            raw_response: self.raw_response,
            response: self.response.map(f),
            error: self.error,
        }
    }
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonSerializer;
    use http::HeaderValue;

    fn head(content_type: Option<&'static str>) -> ResponseHead {
        let mut headers = HeaderMap::new();
        if let Some(value) = content_type {
            headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static(value));
        }
        ResponseHead {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers,
            url: Url::parse("http://example.com/").unwrap(),
        }
    }

    #[test]
    fn default_envelope_means_no_response() {
        let envelope: Envelope<String> = Envelope::default();
        assert_eq!(envelope.status_code, 0);
        assert!(!envelope.success);
        assert!(envelope.original_body.is_empty());
        assert!(envelope.raw_response.is_none());
        assert!(envelope.response.is_none());
        assert!(!envelope.is_error());
    }

    #[test]
    fn json_detection_ignores_parameters_only() {
        assert!(head(Some("application/json")).is_json());
        assert!(head(Some("application/json; charset=utf-8")).is_json());
        assert!(head(Some("Application/JSON")).is_json());
        assert!(!head(Some("text/html")).is_json());
        assert!(!head(Some("application/problem+json")).is_json());
        assert!(!head(None).is_json());
    }

    #[test]
    fn whitespace_body_is_empty() {
        let envelope: Envelope = Envelope {
            original_body: " \r\n\t".to_string(),
            ..Envelope::new()
        };
        assert!(!envelope.has_body());
    }

    #[test]
    fn materialize_failure_is_not_wrapped_in_the_envelope() {
        let envelope: Envelope = Envelope {
            status_code: 502,
            original_body: "<html>bad gateway</html>".to_string(),
            raw_response: Some(head(Some("text/html"))),
            ..Envelope::new()
        };

        let err = envelope
            .materialize::<serde_json::Value, _>(&JsonSerializer)
            .unwrap_err();

        match err {
            Error::DeserializationFailed {
                status,
                raw_response,
                ..
            } => {
                assert_eq!(status, 502);
                assert_eq!(raw_response, "<html>bad gateway</html>");
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
        assert!(envelope.error.is_none());
    }

    #[test]
    fn retyping_drops_payload_and_keeps_the_rest() {
        let envelope = Envelope {
            status_code: 201,
            success: true,
            original_body: "42".to_string(),
            raw_response: Some(head(Some("application/json"))),
            response: Some(42u32),
            error: None,
        };

        let mapped = envelope.map(|n| n.to_string());
        assert_eq!(mapped.response.as_deref(), Some("42"));
        assert_eq!(mapped.header("content-type"), Some("application/json"));

        let untyped: Envelope = mapped.with_payload_type();
        assert!(untyped.response.is_none());
        assert_eq!(untyped.status_code, 201);
        assert!(untyped.success);
    }
}
