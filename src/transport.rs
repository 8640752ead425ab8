//! The non-blocking HTTP exchange the client delegates to.
//!
//! The client never creates or closes connections itself. The caller builds a
//! transport (usually a [`reqwest::Client`], which pools connections and TLS
//! sessions internally), hands a handle to [`Client::builder`], and decides
//! when the pool goes away by dropping the last handle after all in-flight
//! calls have finished.
//!
//! [`Client::builder`]: crate::Client::builder

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One HTTP exchange, fully authenticated and ready to send.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute URL including the query string.
    pub url: Url,
    /// Headers to send in addition to the transport's own defaults.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
    /// Deadline for this single exchange.
    pub timeout: Option<Duration>,
}

/// The status, headers and fully read body of one exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// The body lossily decoded as UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// An asynchronous HTTP transport.
///
/// Implementations must read the whole body before returning and map their
/// failures onto [`Error::Timeout`] or [`Error::Network`]. Dropping the
/// returned future must abandon the exchange and release anything it
/// acquired, since that is how cancellation reaches the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one exchange.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }
}

// The URL carries `key` or `signature`, so it never reaches the error.
fn map_reqwest_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::network(error.without_url())
    }
}
