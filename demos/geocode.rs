//! Geocoding, reverse geocoding and a static map.
//!
//! This example shows how to:
//! - Build a client from the `GOOGLE_MAPS_API_KEY` environment variable
//! - Call JSON APIs and read the decoded body
//! - Download image bytes from the Maps Static API
//! - Tell exhausted retries apart from permanent failures
//!
//! Run with: `GOOGLE_MAPS_API_KEY=AIza... cargo run --example geocode`

use async_googlemaps::{Client, Credentials, Error, Params};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("async_googlemaps=debug,geocode=info")
        .init();

    let http = reqwest::Client::new();
    let client = Client::builder(http.clone())
        .credentials(Credentials::from_env()?)
        .timeout(Duration::from_secs(10))
        .build()?;

    println!("=== Geocode ===");
    let response = client
        .geocode(Params::new().param("address", "1600 Amphitheatre Parkway, Mountain View, CA"))
        .await?;

    let location = response
        .data
        .get("results")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("geometry"))
        .and_then(|g| g.get("location"))
        .cloned();
    println!("Location: {:?}", location);
    println!("Latency: {:?} over {} attempt(s)", response.latency, response.attempts);
    println!();

    println!("=== Reverse geocode ===");
    let response = client
        .reverse_geocode(
            Params::new()
                .param("latlng", "40.714224,-73.961452")
                .param_piped("result_type", ["street_address", "premise"]),
        )
        .await?;
    let results = response.data.get("results").and_then(|r| r.as_array());
    for result in results.into_iter().flatten().take(3) {
        println!("- {}", result["formatted_address"]);
    }
    println!();

    println!("=== Static map ===");
    match client
        .static_map(
            Params::new()
                .param("center", "Brooklyn Bridge, New York, NY")
                .param("zoom", 13)
                .param("size", "600x300"),
        )
        .await
    {
        Ok(image) => println!(
            "Downloaded {} bytes ({:?})",
            image.data.len(),
            image.header("content-type")
        ),
        Err(e) if e.is_exhausted() => {
            println!("Gave up after {:?} attempts: {}", e.attempts(), e)
        }
        Err(e) => println!("Request rejected: {}", e),
    }

    Ok(())
}
