//! Sharing one caller-owned connection pool across concurrent calls.
//!
//! This example shows how to:
//! - Hand a `reqwest::Client` pool to the Maps client without giving up
//!   ownership
//! - Issue many calls concurrently from one runtime
//! - Derive a client that sends an experience ID
//! - Cancel a call with a deadline
//!
//! Run with: `GOOGLE_MAPS_API_KEY=AIza... cargo run --example shared_transport`

use async_googlemaps::{Client, Credentials, Error, Params};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("async_googlemaps=info,shared_transport=info")
        .init();

    // The pool lives here; the Maps client only borrows a handle to it.
    let http = reqwest::Client::builder()
        .pool_max_idle_per_host(8)
        .build()
        .map_err(Error::network)?;

    let client = Client::builder(http.clone())
        .credentials(Credentials::from_env()?)
        .queries_per_second(10)
        .build()?;

    println!("=== Concurrent time zone lookups ===");
    let cities = [
        ("Sydney", "-33.8688,151.2093"),
        ("Tokyo", "35.6762,139.6503"),
        ("London", "51.5072,-0.1276"),
        ("New York", "40.7128,-74.0060"),
    ];

    let mut calls = tokio::task::JoinSet::new();
    for (name, location) in cities {
        let client = client.clone();
        calls.spawn(async move {
            let result = client
                .timezone(
                    Params::new()
                        .param("location", location)
                        .param("timestamp", 1_700_000_000),
                )
                .await;
            (name, result)
        });
    }
    while let Some(joined) = calls.join_next().await {
        match joined {
            Ok((name, Ok(response))) => {
                println!("{}: {:?}", name, response.data.get("timeZoneId"))
            }
            Ok((name, Err(e))) => println!("{}: failed: {}", name, e),
            Err(e) => println!("task failed: {}", e),
        }
    }
    println!();

    println!("=== Experience ID ===");
    let tagged = client.with_experience_id(["checkout-flow"]);
    println!("Tagged client sends: {:?}", tagged.experience_id());
    println!("Original client sends: {:?}", client.experience_id());
    tagged
        .places_autocomplete(Params::new().param("input", "Pizza near Par"))
        .await?;
    println!();

    println!("=== Deadline ===");
    // Dropping the call on timeout abandons its in-flight exchange.
    match tokio::time::timeout(
        Duration::from_millis(50),
        client.directions(
            Params::new()
                .param("origin", "Sydney Town Hall")
                .param("destination", "Parramatta, NSW"),
        ),
    )
    .await
    {
        Ok(result) => println!("Finished in time: {}", result.is_ok()),
        Err(_) => println!("Cancelled after 50ms"),
    }

    // All calls are done; the pool can go.
    drop(client);
    drop(tagged);
    drop(http);

    Ok(())
}
