//! Response wrapper that keeps transport details next to the decoded body.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful Maps response.
///
/// # Type Parameters
///
/// * `T` - The decoded payload, a [`JsonObject`](crate::JsonObject) for JSON
///   APIs or [`Bytes`](bytes::Bytes) for image APIs
///
/// # Examples
///
/// ```no_run
/// use async_googlemaps::{Client, Credentials, Params};
///
/// # async fn example() -> Result<(), async_googlemaps::Error> {
/// let client = Client::builder(reqwest::Client::new())
///     .credentials(Credentials::api_key("AIza-example"))
///     .build()?;
///
/// let response = client
///     .timezone(Params::new().param("location", "-33.86,151.20").param("timestamp", 0))
///     .await?;
///
/// println!("Zone: {:?}", response.data.get("timeZoneId"));
/// println!("Took {:?} over {} attempt(s)", response.latency, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The HTTP status code of the successful attempt.
    pub status: StatusCode,

    /// The response headers of the successful attempt.
    pub headers: HeaderMap,

    /// Time from the start of the first attempt until the successful response
    /// was decoded, including backoff waits.
    pub latency: Duration,

    /// The number of attempts made; `1` when no retry was needed.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use async_googlemaps::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     serde_json::json!({"status": "OK", "results": [1, 2]}),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let results = response.map(|body| body["results"].clone());
    /// assert_eq!(results.data, serde_json::json!([1, 2]));
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Discards the metadata.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
