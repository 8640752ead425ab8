//! Error types for Maps web-service calls.
//!
//! Errors fall into three groups that callers usually want to tell apart:
//!
//! - **transient** failures ([`Error::Network`], [`Error::Timeout`], retriable
//!   [`Error::HttpError`] statuses, [`Error::OverQueryLimit`]) which the retry
//!   loop absorbs and only surfaces wrapped in an exhaustion error;
//! - **exhaustion** ([`Error::MaxRetriesExceeded`], [`Error::RetryTimeout`]),
//!   meaning the call never succeeded but might at a later time;
//! - **permanent** rejections ([`Error::Api`], non-retriable
//!   [`Error::HttpError`], [`Error::DeserializationFailed`]) and caller misuse
//!   ([`Error::ConfigurationError`], [`Error::InvalidUrl`]), which are raised
//!   as soon as they are observed.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// The main error type for Maps web-service calls.
///
/// # Examples
///
/// ```no_run
/// use async_googlemaps::{Client, Credentials, Error, Params};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder(reqwest::Client::new())
///     .credentials(Credentials::api_key("AIza-example"))
///     .build()?;
///
/// match client.geocode(Params::new().param("address", "Sydney")).await {
///     Ok(response) => println!("{:?}", response.data.get("results")),
///     Err(e) if e.is_exhausted() => eprintln!("gave up, try again later: {e}"),
///     Err(Error::Api { status, message }) => {
///         eprintln!("rejected with {status}: {message:?}");
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS failure, reset).
    ///
    /// The source is whatever the [`Transport`](crate::Transport) reported.
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A single attempt exceeded the configured request timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with an HTTP status the extractor does not accept.
    ///
    /// Retriable when the status is in the policy's retriable set.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body, lossily decoded as UTF-8
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// The service reported that the query quota was exceeded.
    ///
    /// `status` is `OVER_QUERY_LIMIT`, `RESOURCE_EXHAUSTED` or, for the
    /// Geolocation API, the HTTP status code.
    #[error("Over query limit ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    OverQueryLimit {
        /// The API status string
        status: String,
        /// The `error_message` sent by the service, if any
        message: Option<String>,
    },

    /// The service understood the request and rejected it.
    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        /// The API status string, e.g. `REQUEST_DENIED` or `INVALID_REQUEST`
        status: String,
        /// The `error_message` sent by the service, if any
        message: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The decoder's error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Invalid configuration was provided, such as missing or malformed
    /// credentials.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Every permitted attempt failed with a retriable error.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },

    /// The retry timeout elapsed before a retriable call could succeed.
    #[error("Retry timeout of {elapsed:?} reached after {attempts} attempts: {last_error}")]
    RetryTimeout {
        /// The number of attempts made
        attempts: usize,
        /// Time spent since the first attempt started
        elapsed: Duration,
        /// The last error encountered
        last_error: Box<Error>,
    },

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Wraps an arbitrary transport failure as [`Error::Network`].
    pub fn network(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Network(source.into())
    }

    /// Returns `true` if this error is transient in the conventional sense.
    ///
    /// Network errors, timeouts, over-query-limit signals and 500/503/504
    /// responses are transient. The retry loop does not call this directly;
    /// it asks the configured [`RetryPredicate`](crate::RetryPredicate),
    /// whose default is derived from the [`RetryPolicy`](crate::RetryPolicy).
    ///
    /// # Examples
    ///
    /// ```
    /// use async_googlemaps::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     raw_response: String::new(),
    ///     headers: http::HeaderMap::new(),
    /// };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::Api { status: "REQUEST_DENIED".into(), message: None };
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout => true,
            Error::HttpError { status, .. } => matches!(status.as_u16(), 500 | 503 | 504),
            Error::OverQueryLimit { .. } => true,
            Error::Api { .. } => false,
            Error::DeserializationFailed { .. } => false,
            Error::ConfigurationError(_) => false,
            Error::MaxRetriesExceeded { .. } => false,
            Error::RetryTimeout { .. } => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Returns `true` if the call gave up after retriable failures.
    ///
    /// Such a call was never rejected permanently; retrying it at a higher
    /// level later may succeed.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            Error::MaxRetriesExceeded { .. } | Error::RetryTimeout { .. }
        )
    }

    /// Returns the number of attempts for exhaustion errors.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Error::MaxRetriesExceeded { attempts, .. } => Some(*attempts),
            Error::RetryTimeout { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Returns the last underlying error for exhaustion errors.
    pub fn last_error(&self) -> Option<&Error> {
        match self {
            Error::MaxRetriesExceeded { last_error, .. } => Some(last_error),
            Error::RetryTimeout { last_error, .. } => Some(last_error),
            _ => None,
        }
    }

    /// Returns the HTTP status code of this error or of the last attempt.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::MaxRetriesExceeded { last_error, .. }
            | Error::RetryTimeout { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the raw response body of this error or of the last attempt.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            Error::MaxRetriesExceeded { last_error, .. }
            | Error::RetryTimeout { last_error, .. } => last_error.raw_response(),
            _ => None,
        }
    }

    /// Returns the response headers if this error carries them.
    pub(crate) fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Error::HttpError { headers, .. } => Some(headers),
            _ => None,
        }
    }
}

/// A specialized `Result` type for Maps web-service calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(code: u16) -> Error {
        Error::HttpError {
            status: StatusCode::from_u16(code).unwrap(),
            raw_response: format!("body {code}"),
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn test_conventional_retryable_statuses() {
        assert!(http_error(500).is_retryable());
        assert!(http_error(503).is_retryable());
        assert!(http_error(504).is_retryable());
        assert!(!http_error(502).is_retryable());
        assert!(!http_error(400).is_retryable());
        assert!(Error::Timeout.is_retryable());
        assert!(!Error::ConfigurationError("no key".into()).is_retryable());
    }

    #[test]
    fn test_exhaustion_exposes_last_attempt() {
        let err = Error::MaxRetriesExceeded {
            attempts: 3,
            last_error: Box::new(http_error(503)),
        };

        assert!(err.is_exhausted());
        assert!(!err.is_retryable());
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.raw_response(), Some("body 503"));
    }

    #[test]
    fn test_permanent_errors_are_not_exhaustion() {
        let err = Error::Api {
            status: "INVALID_REQUEST".into(),
            message: Some("missing address".into()),
        };
        assert!(!err.is_exhausted());
        assert_eq!(err.attempts(), None);
        assert_eq!(
            err.to_string(),
            "API error INVALID_REQUEST: missing address"
        );
    }
}
