//! Request/response logging decorator.
//!
//! [`LoggingClient`] reports one [`LogRecord`] before each call and one after
//! it through a [`LogSink`]. The default sink, [`TracingSink`], turns records
//! into `tracing` events.

use crate::{Envelope, HttpClient, SendResult};
use http::HeaderMap;
use reqwest::Request;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Position;

/// Host logged when the request URL has none.
const UNKNOWN_HOST: &str = "Unknown";

/// The structured logging boundary.
///
/// Both operations are fire-and-forget.
pub trait LogSink: Send + Sync {
    /// Records an informational entry.
    fn info(&self, record: &LogRecord);

    /// Records an error entry.
    fn error(&self, record: &LogRecord);
}

impl<L: LogSink> LogSink for Arc<L> {
    fn info(&self, record: &LogRecord) {
        (**self).info(record)
    }

    fn error(&self, record: &LogRecord) {
        (**self).error(record)
    }
}

/// One structured log entry produced by [`LoggingClient`].
///
/// Header maps and the error summary are carried as serialized JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    /// Emitted before dispatch.
    Request {
        host: String,
        path: String,
        method: String,
        headers: String,
        content: String,
    },

    /// Emitted after a call whose envelope carries no error.
    Response {
        host: String,
        path: String,
        elapsed_ms: u64,
        status_code: u16,
        content: String,
        headers: String,
    },

    /// Emitted after a call whose envelope carries an error.
    Error {
        host: String,
        path: String,
        method: String,
        status_code: u16,
        error: String,
        response: String,
    },
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Request {
                host,
                path,
                method,
                headers,
                content,
            } => {
                writeln!(f, "ExternalService - Request:")?;
                writeln!(f, "Host: {}", host)?;
                writeln!(f, "Path: {}", path)?;
                writeln!(f, "Method: {}", method)?;
                writeln!(f, "Headers: {}", headers)?;
                write!(f, "Content: {}", content)
            }
            LogRecord::Response {
                host,
                path,
                elapsed_ms,
                status_code,
                content,
                headers,
            } => {
                writeln!(f, "ExternalService - Response:")?;
                writeln!(f, "Host: {}", host)?;
                writeln!(f, "Path: {}", path)?;
                writeln!(f, "Elapsed Time: {}ms", elapsed_ms)?;
                writeln!(f, "Status Code: {}", status_code)?;
                writeln!(f, "Response Content: {}", content)?;
                write!(f, "Headers: {}", headers)
            }
            LogRecord::Error {
                host,
                path,
                method,
                status_code,
                error,
                response,
            } => {
                writeln!(f, "ExternalService - Error:")?;
                writeln!(f, "Host: {}", host)?;
                writeln!(f, "Path: {}", path)?;
                writeln!(f, "Method: {}", method)?;
                writeln!(f, "Status Code: {}", status_code)?;
                writeln!(f, "Error: {}", error)?;
                write!(f, "Response Content: {}", response)
            }
        }
    }
}

/// A [`LogSink`] that emits `tracing` events.
///
/// Records become events with one field per record field, at `INFO` for
/// [`LogSink::info`] and `ERROR` for [`LogSink::error`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit {
    ($level:ident, $record:expr) => {
        match $record {
            LogRecord::Request {
                host,
                path,
                method,
                headers,
                content,
            } => tracing::$level!(
                kind = "request",
                %host,
                %path,
                %method,
                %headers,
                %content,
                "Outbound HTTP request"
            ),
            LogRecord::Response {
                host,
                path,
                elapsed_ms,
                status_code,
                content,
                headers,
            } => tracing::$level!(
                kind = "response",
                %host,
                %path,
                elapsed_ms = *elapsed_ms,
                status = *status_code,
                %content,
                %headers,
                "Outbound HTTP response"
            ),
            LogRecord::Error {
                host,
                path,
                method,
                status_code,
                error,
                response,
            } => tracing::$level!(
                kind = "error",
                %host,
                %path,
                %method,
                status = *status_code,
                %error,
                %response,
                "Outbound HTTP call failed"
            ),
        }
    };
}

impl LogSink for TracingSink {
    fn info(&self, record: &LogRecord) {
        emit!(info, record)
    }

    fn error(&self, record: &LogRecord) {
        emit!(error, record)
    }
}

/// What the decorator captures from a request before handing it on.
#[derive(Debug)]
struct CallSummary {
    host: String,
    path: String,
    method: String,
}

impl CallSummary {
    fn capture(request: &Request) -> Self {
        let url = request.url();
        Self {
            host: url.host_str().unwrap_or(UNKNOWN_HOST).to_string(),
            path: url[Position::BeforePath..].to_string(),
            method: request.method().to_string(),
        }
    }
}

/// Serializes a header map to a JSON object, joining repeated values with `,`.
fn headers_json(headers: &HeaderMap) -> String {
    let mut joined: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        joined
            .entry(name.as_str())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    serde_json::to_string(&joined).unwrap_or_default()
}

/// Wraps a client and logs each call through a [`LogSink`].
///
/// Before dispatch a [`LogRecord::Request`] goes to `info`. After the inner
/// call returns an envelope, a [`LogRecord::Error`] goes to `error` if the
/// envelope carries an error, otherwise a [`LogRecord::Response`] goes to
/// `info`. The envelope is returned untouched. If the inner client returns
/// `Err`, it is passed through without a second record.
///
/// # Examples
///
/// ```no_run
/// use httpwrap::{HttpClientExt, JsonSerializer, TransportClient};
///
/// // Logging -> ErrorHandling -> Transport
/// let client = TransportClient::new(reqwest::Client::new(), JsonSerializer)
///     .with_error_handling()
///     .with_logging();
/// ```
#[derive(Debug, Clone)]
pub struct LoggingClient<C, L = TracingSink> {
    inner: C,
    sink: L,
}

impl<C> LoggingClient<C> {
    /// Wraps `inner`, logging through `tracing`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            sink: TracingSink,
        }
    }
}

impl<C, L> LoggingClient<C, L> {
    /// Wraps `inner`, logging through `sink`.
    pub fn with_sink(inner: C, sink: L) -> Self {
        Self { inner, sink }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The sink records are sent to.
    pub fn sink(&self) -> &L {
        &self.sink
    }
}

impl<C: HttpClient, L: LogSink> LoggingClient<C, L> {
    fn log_request(&self, request: &Request, call: &CallSummary) {
        let content = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        self.sink.info(&LogRecord::Request {
            host: call.host.clone(),
            path: call.path.clone(),
            method: call.method.clone(),
            headers: headers_json(request.headers()),
            content,
        });
    }

    fn log_outcome<T>(&self, call: CallSummary, envelope: &Envelope<T>, elapsed: Duration) {
        if let Some(error) = &envelope.error {
            let response = serde_json::json!({
                "success": envelope.success,
                "status_code": envelope.status_code,
                "original_body": envelope.original_body,
            });

            self.sink.error(&LogRecord::Error {
                host: call.host,
                path: call.path,
                method: call.method,
                status_code: envelope.status_code,
                error: error.root_cause().to_string(),
                response: response.to_string(),
            });
            return;
        }

        let headers = envelope
            .raw_response
            .as_ref()
            .map(|head| headers_json(&head.headers))
            .unwrap_or_else(|| headers_json(&HeaderMap::new()));

        self.sink.info(&LogRecord::Response {
            host: call.host,
            path: call.path,
            // Saturating conversion to u64
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            status_code: envelope.status_code,
            content: envelope.original_body.clone(),
            headers,
        });
    }
}

impl<C: HttpClient, L: LogSink> HttpClient for LoggingClient<C, L> {
    fn send_typed<T>(&self, request: Request) -> impl Future<Output = SendResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let call = CallSummary::capture(&request);
            self.log_request(&request, &call);

            let start = Instant::now();
            let envelope = self.inner.send_typed::<T>(request).await?;
            self.log_outcome(call, &envelope, start.elapsed());

            Ok(envelope)
        }
    }

    fn send(&self, request: Request) -> impl Future<Output = SendResult> + Send {
        async move {
            let call = CallSummary::capture(&request);
            self.log_request(&request, &call);

            let start = Instant::now();
            let envelope = self.inner.send(request).await?;
            self.log_outcome(call, &envelope, start.elapsed());

            Ok(envelope)
        }
    }
}
