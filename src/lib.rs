//! # async-googlemaps - An asynchronous Google Maps web-service client
//!
//! Every Maps web-service operation is exposed as an `async` method. Calls
//! run over a caller-supplied, non-blocking HTTP transport and retry
//! transient failures with bounded, sequential attempts and backoff delays
//! that suspend only the calling task.
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_googlemaps::{Client, Credentials, Params};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), async_googlemaps::Error> {
//!     // The connection pool is owned by the caller, not by the client.
//!     let http = reqwest::Client::new();
//!
//!     let client = Client::builder(http.clone())
//!         .credentials(Credentials::from_env()?)
//!         .timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     let geocoded = client
//!         .geocode(Params::new().param("address", "1600 Amphitheatre Parkway, Mountain View"))
//!         .await?;
//!     println!("{:?}", geocoded.data.get("results"));
//!
//!     let directions = client
//!         .directions(
//!             Params::new()
//!                 .param("origin", "Sydney Town Hall")
//!                 .param("destination", "Parramatta, NSW")
//!                 .param("mode", "transit"),
//!         )
//!         .await?;
//!     println!("took {} attempt(s)", directions.attempts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Caller-owned transport** - bring a `reqwest::Client` or implement
//!   [`Transport`] for any async HTTP client
//! - **Bounded retries** - 500/503/504 responses, network errors, timeouts and
//!   over-query-limit signals are retried with jittered exponential backoff
//! - **Distinct failures** - exhausted retries ([`Error::is_exhausted`]) are
//!   kept apart from permanent rejections
//! - **Query throttling** - a shared queries-per-second budget across clones
//! - **Cancellation** - dropping a call's future abandons its in-flight request
//! - **Structured logging** with `tracing`
//!
//! ## Retry Policy
//!
//! ```no_run
//! use async_googlemaps::{Client, Jitter, RetryPolicy, RetryStrategy};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), async_googlemaps::Error> {
//! let client = Client::builder(reqwest::Client::new())
//!     .api_key("AIza-example")
//!     .retry_policy(
//!         RetryPolicy::default()
//!             .max_attempts(5)
//!             .strategy(RetryStrategy::ExponentialBackoff {
//!                 initial_delay: Duration::from_millis(200),
//!                 max_delay: Duration::from_secs(5),
//!                 multiplier: 2.0,
//!                 jitter: Jitter::Spread,
//!             })
//!             .retriable_status(429)
//!             .retry_timeout(Some(Duration::from_secs(30))),
//!     )
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
mod client;
pub mod config;
mod descriptor;
mod error;
pub mod extract;
pub mod rate_limit;
mod response;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientBuilder, DEFAULT_QUERIES_PER_SECOND};
pub use config::{ApiHost, Credentials, RequestSigner};
pub use descriptor::{Params, RequestDescriptor};
pub use error::{Error, Result};
pub use extract::{BinaryBody, ExtractBody, GeolocationBody, JsonBody, JsonObject, RoadsBody, StatusBody};
pub use response::Response;
pub use retry::{Jitter, RetryPolicy, RetryPredicate, RetryStrategy};
pub use transport::{HttpRequest, HttpResponse, Transport};
