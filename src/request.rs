//! Fluent construction of outbound requests.
//!
//! [`RequestBuilder`] holds at most one request in progress. Every `with_*`
//! operation and [`RequestBuilder::build`] require a prior `create_request*`
//! call and fail with [`Error::InvalidState`] otherwise. A failed operation
//! never changes the builder's state.
//!
//! A builder is single-use per logical request and is not meant to be shared
//! across concurrent request constructions.

use crate::{Error, Result, Serializer};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use reqwest::{Body, Request};
use serde::Serialize;
use url::Url;

/// The content type of a URL-encoded form body.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Builds a single [`reqwest::Request`] step by step.
///
/// # Examples
///
/// ```
/// use httpwrap::{JsonSerializer, RequestBuilder};
/// use http::Method;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Search { query: String }
///
/// # fn example() -> Result<(), httpwrap::Error> {
/// let mut builder = RequestBuilder::new(JsonSerializer);
/// let request = builder
///     .create_relative_request("https://api.example.com/v1/", "search", Method::POST)?
///     .with_content(&Search { query: "rust".to_string() }, "application/json", encoding_rs::UTF_8)?
///     .with_headers([("x-api-key", "ABC123")])?
///     .build()?;
///
/// assert_eq!(request.url().as_str(), "https://api.example.com/v1/search");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct RequestBuilder<S> {
    serializer: S,
    request: Option<Request>,
}

impl<S: Serializer> RequestBuilder<S> {
    /// Creates a builder with no request in progress.
    pub fn new(serializer: S) -> Self {
        Self {
            serializer,
            request: None,
        }
    }

    /// Starts a new request for an absolute URL, discarding any request in progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` is not a valid absolute URL.
    pub fn create_request(&mut self, url: impl AsRef<str>, method: Method) -> Result<&mut Self> {
        let url = Url::parse(url.as_ref())?;
        self.request = Some(Request::new(method, url));
        Ok(self)
    }

    /// Starts a new request for `relative_url` resolved against `base_url`.
    ///
    /// Resolution follows URL-join semantics rather than concatenation:
    /// `"http://host/a/"` joined with `"b"` is `http://host/a/b`, while
    /// `"http://host/a"` joined with `"b"` is `http://host/b`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if either part cannot be parsed or joined.
    pub fn create_relative_request(
        &mut self,
        base_url: impl AsRef<str>,
        relative_url: impl AsRef<str>,
        method: Method,
    ) -> Result<&mut Self> {
        let url = Url::parse(base_url.as_ref())?.join(relative_url.as_ref())?;
        self.request = Some(Request::new(method, url));
        Ok(self)
    }

    /// Sets the body to `value` serialized by the builder's serializer.
    ///
    /// The text is encoded with `encoding` and the `Content-Type` header is set
    /// to `"{content_type}; charset={label}"`, replacing any previous body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no request is in progress,
    /// [`Error::SerializationFailed`] if the serializer fails or the text has
    /// characters `encoding` cannot represent, and [`Error::ConfigurationError`]
    /// if the content type is not a valid header value or `encoding` has no
    /// byte form of its own (`replacement`).
    pub fn with_content<T>(
        &mut self,
        value: &T,
        content_type: &str,
        encoding: &'static Encoding,
    ) -> Result<&mut Self>
    where
        T: Serialize + ?Sized,
    {
        let request = self.request.as_mut().ok_or(Error::InvalidState(NOT_CREATED))?;

        let text = self
            .serializer
            .serialize(value)
            .map_err(Error::SerializationFailed)?;
        let header = header_value(&format!(
            "{}; charset={}",
            content_type,
            encoding.name().to_ascii_lowercase()
        ))?;
        let bytes = encode_text(&text, encoding)?;

        *request.body_mut() = Some(Body::from(bytes));
        request.headers_mut().insert(CONTENT_TYPE, header);
        Ok(self)
    }

    /// Sets the body to the URL-encoded form of `form`, in iteration order.
    ///
    /// The `Content-Type` header becomes `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no request is in progress.
    pub fn with_form_data<I, K, V>(&mut self, form: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request = self.request.as_mut().ok_or(Error::InvalidState(NOT_CREATED))?;

        let mut encoder = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in form {
            encoder.append_pair(key.as_ref(), value.as_ref());
        }

        *request.body_mut() = Some(Body::from(encoder.finish()));
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
        Ok(self)
    }

    /// Appends one header per entry.
    ///
    /// Existing headers with the same name are kept; the new value is added
    /// alongside them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no request is in progress and
    /// [`Error::ConfigurationError`] if any name or value is invalid, in which
    /// case no header is added.
    pub fn with_headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request = self.request.as_mut().ok_or(Error::InvalidState(NOT_CREATED))?;

        let parsed = headers
            .into_iter()
            .map(|(name, value)| {
                let name = HeaderName::try_from(name.as_ref()).map_err(|e| {
                    Error::ConfigurationError(format!("Invalid header name: {}", e))
                })?;
                Ok((name, header_value(value.as_ref())?))
            })
            .collect::<Result<Vec<_>>>()?;

        let target = request.headers_mut();
        for (name, value) in parsed {
            target.append(name, value);
        }
        Ok(self)
    }

    /// Returns the finished request.
    ///
    /// The builder keeps its state, so calling `build` again without further
    /// mutation yields an equivalent request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no request is in progress.
    pub fn build(&self) -> Result<Request> {
        self.request
            .as_ref()
            .ok_or(Error::InvalidState(NOT_CREATED))?
            .try_clone()
            .ok_or(Error::InvalidState("request body is a stream and cannot be cloned"))
    }

    /// Returns `true` if a request is in progress.
    pub fn in_progress(&self) -> bool {
        self.request.is_some()
    }

    /// The serializer used for request bodies.
    pub fn serializer(&self) -> &S {
        &self.serializer
    }
}

const NOT_CREATED: &str = "create_request must be called first";

/// Encodes `text` in exactly the charset named by `encoding`.
///
/// encoding_rs only encodes to UTF-8 for the UTF-16 family, so those are
/// written by hand.
fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    if encoding.output_encoding() != encoding {
        return Err(Error::ConfigurationError(format!(
            "Encoding {} cannot be used for request bodies",
            encoding.name()
        )));
    }

    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(Error::SerializationFailed(
            format!("Body contains characters not representable in {}", encoding.name()).into(),
        ));
    }
    Ok(bytes.into_owned())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonSerializer;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Foo {
        field1: String,
    }

    fn body_text(request: &Request) -> String {
        let bytes = request.body().and_then(Body::as_bytes).unwrap_or_default();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn create_request_with_absolute_url() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        let request = builder
            .create_request("http://testurl.com/relative/test", Method::GET)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://testurl.com/relative/test");
        assert_eq!(request.method(), Method::GET);
    }

    #[test]
    fn create_request_joins_relative_url() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        let request = builder
            .create_relative_request("http://testurl.com/", "relative/test", Method::GET)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://testurl.com/relative/test");
    }

    #[test]
    fn relative_join_is_not_concatenation() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        let request = builder
            .create_relative_request("http://testurl.com/api/v1", "users", Method::GET)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://testurl.com/api/users");
    }

    #[test]
    fn content_is_serialized_with_type_and_charset() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        let foo = Foo {
            field1: "value1".to_string(),
        };

        let request = builder
            .create_request("http://testurl.com/relative/test", Method::POST)
            .unwrap()
            .with_content(&foo, "application/json", encoding_rs::UTF_8)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(body_text(&request), r#"{"field1":"value1"}"#);
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn content_is_encoded_in_the_declared_charset() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        builder
            .create_request("http://testurl.com/", Method::POST)
            .unwrap();

        for encoding in [encoding_rs::UTF_16LE, encoding_rs::UTF_16BE, encoding_rs::WINDOWS_1252] {
            let request = builder
                .with_content("hé", "application/json", encoding)
                .unwrap()
                .build()
                .unwrap();

            let bytes = request.body().and_then(Body::as_bytes).unwrap();
            let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
            assert!(!had_errors);
            assert_eq!(text, "\"hé\"");
            assert_eq!(
                request.headers().get(CONTENT_TYPE).unwrap(),
                format!("application/json; charset={}", encoding.name().to_ascii_lowercase()).as_str()
            );
        }
    }

    #[test]
    fn unrepresentable_content_is_rejected() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        builder
            .create_request("http://testurl.com/", Method::POST)
            .unwrap();

        let result = builder.with_content("日本", "application/json", encoding_rs::WINDOWS_1252);
        assert!(matches!(result, Err(Error::SerializationFailed(_))));

        let result = builder.with_content("x", "application/json", encoding_rs::REPLACEMENT);
        assert!(matches!(result, Err(Error::ConfigurationError(_))));

        let request = builder.build().unwrap();
        assert!(request.body().is_none());
        assert!(request.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn form_data_keeps_insertion_order() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        let request = builder
            .create_request("http://testurl.com/relative/test", Method::POST)
            .unwrap()
            .with_form_data([("field2", "value 2"), ("field1", "value1")])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(body_text(&request), "field2=value+2&field1=value1");
        assert_eq!(request.headers().get(CONTENT_TYPE).unwrap(), FORM_URLENCODED);
    }

    #[test]
    fn headers_are_appended() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        let request = builder
            .create_request("http://testurl.com/relative/test", Method::GET)
            .unwrap()
            .with_headers([("x-api-key", "ABC123"), ("someID", "123")])
            .unwrap()
            .with_headers([("someID", "456")])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.headers().get("x-api-key").unwrap(), "ABC123");
        let ids: Vec<_> = request.headers().get_all("someid").iter().collect();
        assert_eq!(ids, vec!["123", "456"]);
    }

    #[test]
    fn invalid_header_adds_nothing() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        builder
            .create_request("http://testurl.com/", Method::GET)
            .unwrap();

        let result = builder.with_headers([("x-ok", "1"), ("bad header", "2")]);
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
        assert!(builder.build().unwrap().headers().is_empty());
    }

    #[test]
    fn operations_before_create_fail_with_invalid_state() {
        let mut builder = RequestBuilder::new(JsonSerializer);

        assert!(matches!(builder.build(), Err(Error::InvalidState(_))));
        assert!(matches!(
            builder.with_content("dsad", "application/xml", encoding_rs::UTF_8),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            builder.with_headers([("key", "value")]),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            builder.with_form_data([("key", "value")]),
            Err(Error::InvalidState(_))
        ));
        assert!(!builder.in_progress());
    }

    #[test]
    fn invalid_url_keeps_previous_state() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        assert!(matches!(
            builder.create_request("not a url", Method::GET),
            Err(Error::InvalidUrl(_))
        ));
        assert!(!builder.in_progress());

        builder
            .create_request("http://testurl.com/first", Method::GET)
            .unwrap();
        assert!(builder.create_request("::", Method::GET).is_err());
        assert_eq!(
            builder.build().unwrap().url().as_str(),
            "http://testurl.com/first"
        );
    }

    #[test]
    fn build_is_repeatable() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        builder
            .create_request("http://testurl.com/relative/test", Method::PUT)
            .unwrap()
            .with_content(&[1, 2, 3], "application/json", encoding_rs::UTF_8)
            .unwrap();

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();

        assert_eq!(first.url(), second.url());
        assert_eq!(first.method(), second.method());
        assert_eq!(first.headers(), second.headers());
        assert_eq!(body_text(&first), body_text(&second));
    }

    #[test]
    fn create_resets_previous_request() {
        let mut builder = RequestBuilder::new(JsonSerializer);
        builder
            .create_request("http://testurl.com/one", Method::POST)
            .unwrap()
            .with_headers([("x-one", "1")])
            .unwrap();

        let request = builder
            .create_request("http://testurl.com/two", Method::GET)
            .unwrap()
            .build()
            .unwrap();

        assert!(request.headers().get("x-one").is_none());
        assert!(request.body().is_none());
    }
}
