//! Maps client and the retrying request adapter.
//!
//! The [`Client`] type is the main entry point. Use [`ClientBuilder`] to
//! configure one around a caller-owned [`Transport`].

use crate::{
    config::{BaseUrls, Credentials, EXPERIENCE_ID_HEADER, USER_AGENT},
    descriptor::RequestDescriptor,
    extract::{http_error, ExtractBody},
    rate_limit::{self, QueryThrottle},
    retry::{RetryPolicy, RetryPredicate},
    transport::{HttpRequest, Transport},
    ApiHost, Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Default client-side query budget, matching the service's default quota.
pub const DEFAULT_QUERIES_PER_SECOND: usize = 50;

/// An asynchronous client for the Maps web services.
///
/// Cloning is cheap and clones share configuration, transport and query
/// throttle. Calls may run concurrently from any number of tasks; each call
/// makes its attempts strictly one after another.
///
/// # Examples
///
/// ```no_run
/// use async_googlemaps::{Client, Credentials, Params, RetryPolicy};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), async_googlemaps::Error> {
/// // The connection pool belongs to the caller and outlives every call.
/// let http = reqwest::Client::new();
///
/// let client = Client::builder(http.clone())
///     .credentials(Credentials::api_key("AIza-example"))
///     .timeout(Duration::from_secs(10))
///     .retry_policy(RetryPolicy::default().max_attempts(5))
///     .build()?;
///
/// let response = client
///     .geocode(Params::new().param("address", "1600 Amphitheatre Parkway"))
///     .await?;
/// println!("{:?}", response.data.get("results"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Clone)]
struct ClientInner {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    base_urls: BaseUrls,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    retry_predicate: Arc<dyn RetryPredicate>,
    timeout: Option<Duration>,
    throttle: Option<Arc<QueryThrottle>>,
    max_rate_limit_wait: Duration,
    experience_id: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.inner.credentials)
            .field("base_urls", &self.inner.base_urls)
            .field("retry_policy", &self.inner.retry_policy)
            .field("timeout", &self.inner.timeout)
            .field(
                "queries_per_second",
                &self.inner.throttle.as_ref().map(|t| t.queries_per_second()),
            )
            .field("experience_id", &self.inner.experience_id)
            .finish()
    }
}

impl Client {
    /// Creates a new `ClientBuilder` around a caller-owned transport.
    ///
    /// The client keeps a handle to `transport` but never closes it; pass a
    /// clone of a `reqwest::Client` (or an `Arc` of your own transport) and
    /// drop the original once all calls have completed.
    pub fn builder(transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    /// The retry policy applied to every call.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry_policy
    }

    /// The `X-Goog-Maps-Experience-ID` value sent with each request, if any.
    pub fn experience_id(&self) -> Option<&str> {
        self.inner.experience_id.as_deref()
    }

    /// Returns a client that sends the given experience IDs, comma-joined.
    ///
    /// The new client shares transport and throttle with `self`; `self` is
    /// left unchanged, so in-flight calls are unaffected. An empty list
    /// clears the header.
    pub fn with_experience_id<I, S>(&self, experience_ids: I) -> Client
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = experience_ids.into_iter().map(Into::into).collect();
        let mut inner = (*self.inner).clone();
        inner.experience_id = (!ids.is_empty()).then(|| ids.join(","));
        Client {
            inner: Arc::new(inner),
        }
    }

    /// Returns a client that sends no experience ID.
    pub fn without_experience_id(&self) -> Client {
        self.with_experience_id(std::iter::empty::<String>())
    }

    /// Executes one logical call with bounded, sequential retries.
    ///
    /// Credentials are attached first, so misuse such as enterprise-only
    /// credentials on a key-only API fails before any network traffic. Each
    /// attempt waits for the query throttle, awaits the transport and
    /// classifies the response; a retriable failure sleeps for the backoff
    /// delay and tries again until the policy's attempt or time budget runs
    /// out.
    ///
    /// Dropping the returned future cancels the call, including the
    /// in-flight exchange.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use async_googlemaps::{Client, Credentials, RequestDescriptor, StatusBody};
    ///
    /// # async fn example() -> Result<(), async_googlemaps::Error> {
    /// # let client = Client::builder(reqwest::Client::new())
    /// #     .credentials(Credentials::api_key("AIza-example"))
    /// #     .build()?;
    /// let descriptor = RequestDescriptor::get("/maps/api/geocode/json")
    ///     .param("place_id", "ChIJN1t_tDeuEmsRUsoyG83frY4");
    ///
    /// let response = client.request(&descriptor, &StatusBody).await?;
    /// println!("{} attempt(s)", response.attempts);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request<E>(
        &self,
        descriptor: &RequestDescriptor,
        extractor: &E,
    ) -> Result<Response<E::Output>>
    where
        E: ExtractBody,
    {
        let http_request = HttpRequest {
            method: descriptor.method.clone(),
            url: self.authorize(descriptor)?,
            headers: self.request_headers()?,
            body: descriptor.body.clone(),
            timeout: self.inner.timeout,
        };

        let policy = &self.inner.retry_policy;
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            if let Some(throttle) = &self.inner.throttle {
                throttle.acquire().await;
            }

            let error = match self
                .execute_attempt(descriptor, &http_request, extractor, attempt)
                .await
            {
                Ok((status, headers, data)) => {
                    return Ok(Response::new(
                        data,
                        status,
                        headers,
                        start_time.elapsed(),
                        attempt,
                    ));
                }
                Err(e) => e,
            };

            tracing::warn!(
                error = %error,
                attempt = attempt,
                method = %descriptor.method,
                path = %descriptor.path,
                "Request failed"
            );

            if !self.inner.retry_predicate.should_retry(&error, attempt) {
                return Err(error);
            }

            let delay = match self.retry_delay(&error, attempt) {
                Some(delay) if attempt < policy.get_max_attempts() => delay,
                _ => {
                    return Err(Error::MaxRetriesExceeded {
                        attempts: attempt,
                        last_error: Box::new(error),
                    });
                }
            };

            if let Some(budget) = policy.get_retry_timeout() {
                let elapsed = start_time.elapsed();
                if elapsed.checked_add(delay).map_or(true, |t| t > budget) {
                    return Err(Error::RetryTimeout {
                        attempts: attempt,
                        elapsed,
                        last_error: Box::new(error),
                    });
                }
            }

            tracing::info!(
                delay_ms = delay.as_millis(),
                attempt = attempt,
                "Retrying request after delay"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Executes a single attempt and classifies its outcome.
    async fn execute_attempt<E>(
        &self,
        descriptor: &RequestDescriptor,
        request: &HttpRequest,
        extractor: &E,
        attempt: usize,
    ) -> Result<(http::StatusCode, HeaderMap, E::Output)>
    where
        E: ExtractBody,
    {
        tracing::debug!(
            method = %request.method,
            host = ?descriptor.host,
            path = %descriptor.path,
            attempt = attempt,
            "Executing HTTP request"
        );

        let started = Instant::now();
        let response = self.inner.transport.execute(request.clone()).await?;
        let status = response.status;

        tracing::info!(
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis(),
            attempt = attempt,
            "Received HTTP response"
        );

        if self.inner.retry_policy.is_retriable_status(status.as_u16()) {
            tracing::warn!(status = status.as_u16(), "Retriable server error");
            return Err(http_error(&response));
        }
        if status.is_client_error() {
            tracing::error!(
                status = status.as_u16(),
                response = %response.text(),
                "Client error (4xx)"
            );
        }

        let data = extractor.extract(&response)?;
        Ok((status, response.headers, data))
    }

    /// Delay before the retry following `attempt`, honoring `Retry-After`.
    fn retry_delay(&self, error: &Error, attempt: usize) -> Option<Duration> {
        let backoff = self
            .inner
            .retry_policy
            .get_strategy()
            .delay_for_retry(attempt)?;

        let requested = error
            .headers()
            .and_then(rate_limit::retry_after)
            .map(|d| d.min(self.inner.max_rate_limit_wait));

        match requested {
            Some(requested) if requested > backoff => {
                tracing::info!(
                    rate_limit_delay_ms = requested.as_millis(),
                    attempt = attempt,
                    "Server asked to wait before retrying"
                );
                Some(requested)
            }
            _ => Some(backoff),
        }
    }

    /// Builds the absolute, authenticated URL for `descriptor`.
    fn authorize(&self, descriptor: &RequestDescriptor) -> Result<Url> {
        let mut params = descriptor.params.clone();

        let query = match &self.inner.credentials {
            Credentials::ClientId {
                client_id,
                signer,
                channel,
                ..
            } if descriptor.accepts_client_id => {
                if let Some(channel) = channel {
                    params.push("channel", channel);
                }
                params.push("client", client_id);

                let query = params.encode();
                let signature = signer.sign(&format!("{}?{}", descriptor.path, query))?;
                format!("{query}&signature={signature}")
            }
            Credentials::ApiKey(key)
            | Credentials::ClientId {
                api_key: Some(key), ..
            } => {
                params.push("key", key);
                params.encode()
            }
            Credentials::ClientId { api_key: None, .. } => {
                return Err(Error::ConfigurationError(
                    "Must provide API key for this API. It does not accept enterprise credentials."
                        .to_string(),
                ));
            }
        };

        // A base URL may carry a path prefix, e.g. behind a gateway.
        let mut url = self.inner.base_urls.get(descriptor.host).clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), descriptor.path);
        url.set_path(&path);
        url.set_query(Some(&query));
        Ok(url)
    }

    fn request_headers(&self) -> Result<HeaderMap> {
        let mut headers = self.inner.default_headers.clone();
        if let Some(experience_id) = &self.inner.experience_id {
            let value = HeaderValue::try_from(experience_id.as_str()).map_err(|e| {
                Error::ConfigurationError(format!("Invalid experience ID: {}", e))
            })?;
            headers.insert(HeaderName::from_static("x-goog-maps-experience-id"), value);
        }
        Ok(headers)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use async_googlemaps::{ApiHost, Client, Credentials, RetryPolicy, RetryStrategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), async_googlemaps::Error> {
/// let client = Client::builder(reqwest::Client::new())
///     .credentials(Credentials::from_env()?)
///     .timeout(Duration::from_secs(30))
///     .retry_policy(
///         RetryPolicy::default()
///             .max_attempts(4)
///             .strategy(RetryStrategy::Linear { delay: Duration::from_secs(1) }),
///     )
///     .queries_per_second(10)
///     .host_url(ApiHost::Roads, "https://roads.example.internal")?
///     .experience_id("exp-1")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    credentials: Option<Credentials>,
    base_urls: BaseUrls,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    retry_predicate: Option<Arc<dyn RetryPredicate>>,
    timeout: Option<Duration>,
    queries_per_second: Option<usize>,
    max_rate_limit_wait: Duration,
    experience_id: Option<String>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            credentials: None,
            base_urls: BaseUrls::default(),
            default_headers: HeaderMap::new(),
            retry_policy: RetryPolicy::default(),
            retry_predicate: None,
            timeout: None,
            queries_per_second: Some(DEFAULT_QUERIES_PER_SECOND),
            max_rate_limit_wait: Duration::from_secs(60),
            experience_id: None,
        }
    }

    /// Sets the credentials. Required.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Shorthand for `credentials(Credentials::api_key(key))`.
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credentials(Credentials::api_key(key))
    }

    /// Sets the base URL of the Maps host. Should not have a trailing path.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(self, url: impl AsRef<str>) -> Result<Self> {
        self.host_url(ApiHost::Maps, url)
    }

    /// Sets the base URL of one host.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn host_url(mut self, host: ApiHost, url: impl AsRef<str>) -> Result<Self> {
        self.base_urls.set(host, Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sends every host's requests to the same base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn all_hosts_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_urls = BaseUrls::all(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default the predicate is derived from the retry policy with
    /// [`RetryPolicy::predicate`].
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(Arc::from(predicate));
        self
    }

    /// Sets the timeout of each individual attempt, from sending the request
    /// until the whole body is read.
    ///
    /// Connect timeouts belong to the transport: set them on the
    /// `reqwest::Client` passed to [`Client::builder`], e.g. with
    /// `reqwest::Client::builder().connect_timeout(..)`, so that they apply to
    /// the shared pool.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Limits how many attempts may start per second across all clones.
    pub fn queries_per_second(mut self, queries_per_second: usize) -> Self {
        self.queries_per_second = Some(queries_per_second);
        self
    }

    /// Disables the client-side query throttle.
    pub fn unthrottled(mut self) -> Self {
        self.queries_per_second = None;
        self
    }

    /// Caps how long a `Retry-After` header may delay a retry.
    pub fn max_rate_limit_wait(mut self, max_wait: Duration) -> Self {
        self.max_rate_limit_wait = max_wait;
        self
    }

    /// Sets the `X-Goog-Maps-Experience-ID` header value.
    pub fn experience_id(mut self, experience_id: impl Into<String>) -> Self {
        self.experience_id = Some(experience_id.into());
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials were provided or they are invalid.
    pub fn build(self) -> Result<Client> {
        let credentials = self.credentials.ok_or_else(|| {
            Error::ConfigurationError(
                "Must provide API key or enterprise credentials when creating client.".to_string(),
            )
        })?;
        credentials.validate()?;

        let mut default_headers = self.default_headers;
        if !default_headers.contains_key(http::header::USER_AGENT) {
            default_headers.insert(
                http::header::USER_AGENT,
                HeaderValue::from_static(USER_AGENT),
            );
        }

        if let Some(experience_id) = &self.experience_id {
            HeaderValue::try_from(experience_id.as_str()).map_err(|e| {
                Error::ConfigurationError(format!(
                    "Invalid {EXPERIENCE_ID_HEADER} value: {}",
                    e
                ))
            })?;
        }

        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| self.retry_policy.predicate());

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                credentials,
                base_urls: self.base_urls,
                default_headers,
                retry_policy: self.retry_policy,
                retry_predicate,
                timeout: self.timeout,
                throttle: self
                    .queries_per_second
                    .map(|qps| Arc::new(QueryThrottle::new(qps))),
                max_rate_limit_wait: self.max_rate_limit_wait,
                experience_id: self.experience_id,
            }),
        })
    }
}
