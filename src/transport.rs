//! The byte-level transport boundary.
//!
//! A [`Transport`] dispatches one request and yields a response, or nothing at
//! all. Connection pooling, TLS, redirects and timeouts belong to the
//! transport; `reqwest::Client` is the default implementation.

use crate::{Error, Result};
use reqwest::{Request, Response};
use std::future::Future;
use std::sync::Arc;

/// Dispatches a request over the network stack.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response.
    ///
    /// `Ok(None)` means the transport produced no response without failing;
    /// callers treat it as a valid terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns an error for timeouts and connection-level faults.
    fn dispatch(&self, request: Request) -> impl Future<Output = Result<Option<Response>>> + Send;
}

impl Transport for reqwest::Client {
    fn dispatch(&self, request: Request) -> impl Future<Output = Result<Option<Response>>> + Send {
        async move {
            match self.execute(request).await {
                Ok(response) => Ok(Some(response)),
                Err(e) if e.is_timeout() => Err(Error::Timeout),
                Err(e) => Err(Error::Network(e)),
            }
        }
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn dispatch(&self, request: Request) -> impl Future<Output = Result<Option<Response>>> + Send {
        (**self).dispatch(request)
    }
}
