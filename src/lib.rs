//! # httpwrap - A composable outbound HTTP client
//!
//! httpwrap sends requests through `reqwest` and returns every outcome as a
//! typed, introspectable [`Envelope`]. Cross-cutting behavior is added by
//! decorators that implement the same [`HttpClient`] contract as the
//! transport-backed client they wrap, so chains are assembled by the caller:
//!
//! - [`TransportClient`] - sends the request, fills status, body and response
//!   head, and eagerly deserializes JSON bodies for typed sends
//! - [`ErrorHandlingClient`] - turns any failure into an envelope with `error` set
//! - [`LoggingClient`] - logs the request before and the outcome after each call
//!
//! ## Quick Start
//!
//! ```no_run
//! use httpwrap::{HttpClient, HttpClientExt, JsonSerializer, RequestBuilder, TransportClient};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), httpwrap::Error> {
//!     // Logging -> ErrorHandling -> Transport
//!     let client = TransportClient::builder()
//!         .http_client(reqwest::Client::new())
//!         .serializer(JsonSerializer)
//!         .build()?
//!         .with_error_handling()
//!         .with_logging();
//!
//!     let request = RequestBuilder::new(JsonSerializer)
//!         .create_relative_request("https://api.example.com/", "users", Method::POST)?
//!         .with_content(&CreateUser { name: "Alice".to_string() }, "application/json", encoding_rs::UTF_8)?
//!         .build()?;
//!
//!     // The error-handling layer resolves every call to an envelope.
//!     let envelope = client
//!         .send_typed::<User>(request)
//!         .await
//!         .map_err(|e| e.into_error())?;
//!     match (&envelope.response, &envelope.error) {
//!         (Some(user), _) => println!("Created {} with ID {}", user.name, user.id),
//!         (None, Some(error)) => eprintln!("Call failed: {}", error),
//!         (None, None) => println!("Status {} with no JSON body", envelope.status_code),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Deferred deserialization
//!
//! An untyped [`HttpClient::send`] never invokes the serializer. The body can be
//! parsed later with [`Envelope::materialize`]:
//!
//! ```no_run
//! use httpwrap::{HttpClient, JsonSerializer, TransportClient};
//!
//! # async fn example(request: reqwest::Request) -> Result<(), httpwrap::Error> {
//! let client = TransportClient::new(reqwest::Client::new(), JsonSerializer);
//! let envelope = client.send(request).await.map_err(|e| e.into_error())?;
//! let value: serde_json::Value = envelope.materialize(&JsonSerializer)?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod envelope;
mod error;
mod error_handling;
pub mod logging;
mod request;
mod serializer;
mod transport;

pub use client::{HttpClient, HttpClientExt, TransportClient, TransportClientBuilder};
pub use envelope::{Envelope, ResponseHead};
pub use error::{BoxError, Error, Result, SendError, SendResult};
pub use error_handling::ErrorHandlingClient;
pub use logging::{LogRecord, LogSink, LoggingClient, TracingSink};
pub use request::RequestBuilder;
pub use serializer::{JsonSerializer, Serializer};
pub use transport::Transport;
