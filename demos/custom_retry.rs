//! Example demonstrating retry policies and custom retry predicates.
//!
//! This example shows how to:
//! - Tune attempts, backoff and the overall retry time budget
//! - Treat 429 responses as transient
//! - Combine predicates with AND/OR logic
//!
//! Run with: `GOOGLE_MAPS_API_KEY=AIza... cargo run --example custom_retry`

use async_googlemaps::retry::{
    AndPredicate, OrPredicate, RetryOnConnectionError, RetryOnStatus, RetryOnTimeout,
    RetryPredicate,
};
use async_googlemaps::{Client, Credentials, Error, Jitter, Params, RetryPolicy, RetryStrategy};
use std::time::Duration;

/// Only retry during the first `n` attempts, whatever the policy allows.
struct FirstAttempts(usize);

impl RetryPredicate for FirstAttempts {
    fn should_retry(&self, _error: &Error, attempt: usize) -> bool {
        attempt <= self.0
    }
}

/// Retry API errors whose status names a transient condition.
struct RetryOnUnknownError;

impl RetryPredicate for RetryOnUnknownError {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Api { status, .. } if status == "UNKNOWN_ERROR")
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("async_googlemaps=debug,custom_retry=info")
        .init();

    let http = reqwest::Client::new();

    println!("=== Policy tuning ===");
    let policy = RetryPolicy::default()
        .max_attempts(4)
        .strategy(RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            multiplier: 2.0,
            jitter: Jitter::Down,
        })
        .retriable_status(429)
        .retry_timeout(Some(Duration::from_secs(20)));
    println!("{:#?}", policy);

    let client = Client::builder(http.clone())
        .credentials(Credentials::from_env()?)
        .retry_policy(policy)
        .build()?;

    let response = client
        .elevation(Params::new().param("locations", "39.7391536,-104.9847034"))
        .await?;
    println!("Elevation: {:?}", response.data.get("results"));
    println!();

    println!("=== Custom predicate ===");
    // Retry transient transport failures and UNKNOWN_ERROR, but never past
    // the second attempt.
    let predicate = AndPredicate::new(vec![
        Box::new(OrPredicate::new(vec![
            Box::new(RetryOnStatus::new([500, 503, 504])),
            Box::new(RetryOnTimeout),
            Box::new(RetryOnConnectionError),
            Box::new(RetryOnUnknownError),
        ])),
        Box::new(FirstAttempts(2)),
    ]);

    let client = Client::builder(http)
        .credentials(Credentials::from_env()?)
        .retry_predicate(Box::new(predicate))
        .build()?;

    match client
        .distance_matrix(
            Params::new()
                .param_piped("origins", ["Vancouver BC", "Seattle"])
                .param_piped("destinations", ["San Francisco", "Victoria BC"])
                .param("mode", "bicycling"),
        )
        .await
    {
        Ok(response) => println!(
            "Rows: {} after {} attempt(s)",
            response
                .data
                .get("rows")
                .and_then(|rows| rows.as_array())
                .map_or(0, Vec::len),
            response.attempts
        ),
        Err(Error::Api { status, message }) => {
            println!("Service rejected the request: {} ({:?})", status, message)
        }
        Err(e) => println!("Request failed: {}", e),
    }

    Ok(())
}
