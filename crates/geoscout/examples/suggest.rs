//! Search-box suggestions against the live provider
//!
//! This example demonstrates:
//! - Building a client from `GEOAPIFY_*` environment variables
//! - Probing the provider before use
//! - Mixing recent searches, a local store and autocomplete into one list
//! - Labelling the device position with reverse geocoding
//!
//! Run with `GEOAPIFY_API_KEY=... cargo run --example suggest -- "jalan amp"`.

use std::sync::Arc;

use geoscout::{
    GeoCoordinate, GeocodingClient, GeocodingConfigBuilder, InMemoryStore, PropertyRow,
    RecentSearches, SuggestionAggregator, SuggestionConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    geoscout::init_logging(tracing::Level::INFO)?;

    let term = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "kuala".to_string());

    let config = GeocodingConfigBuilder::from_env().build();
    let client = Arc::new(GeocodingClient::new(config)?);
    if !client.check_service().await {
        println!("Geocoding service unavailable, showing local suggestions only");
    }

    // A couple of listings standing in for the real datastore
    let store = InMemoryStore::new().with_properties([
        PropertyRow {
            address: Some("Kuala Terengganu".to_string()),
            building_name: Some("Menara Pantai".to_string()),
            property_type: Some("Apartment".to_string()),
            home_type: Some("Entire place".to_string()),
        },
        PropertyRow {
            address: Some("Jalan Ampang, Kuala Lumpur".to_string()),
            building_name: Some("Ampang Residences".to_string()),
            property_type: Some("Condominium".to_string()),
            home_type: Some("Private room".to_string()),
        },
    ]);
    let aggregator = SuggestionAggregator::new(SuggestionConfig::default(), store)
        .with_geocoder(Arc::clone(&client));

    let mut recent = RecentSearches::new();
    recent.add("Kuala Lumpur");
    recent.add("Mersing");

    let position = GeoCoordinate::or_default(None);
    println!("Near {}:", client.reverse_geocode_label(position).await?);

    println!("\nSuggestions for '{term}':");
    let suggestions = aggregator
        .fetch_near(&term, recent.entries(), Some(position))
        .await;
    if suggestions.is_empty() {
        println!("  (none)");
    }
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!(
            "  {}. {} [{:?}, {}]",
            i + 1,
            suggestion.text,
            suggestion.kind,
            suggestion.source
        );
    }

    Ok(())
}
