//! Geoscout - Geocoding and Address Reconciliation
//!
//! Geoscout turns free-text address queries into ranked location candidates and scores
//! how well a stored property address agrees with a geocoder result. It is built to
//! sit behind a debounced search box: short queries never reach the provider, every
//! endpoint class has its own rate-limit slot, and a failing provider degrades the
//! suggestion list instead of breaking it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use geoscout::{
//!     GeocodingClient, GeocodingConfigBuilder, InMemoryStore, PropertyRow, RecentSearches,
//!     SuggestionAggregator, SuggestionConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), geoscout::error::GeoscoutError> {
//!     let config = GeocodingConfigBuilder::malaysia().api_key("my-key").build();
//!     let client = Arc::new(GeocodingClient::new(config)?);
//!
//!     let store = InMemoryStore::new().with_properties([PropertyRow {
//!         address: Some("Kuala Terengganu".to_string()),
//!         ..PropertyRow::default()
//!     }]);
//!     let aggregator = SuggestionAggregator::new(SuggestionConfig::default(), store)
//!         .with_geocoder(client);
//!
//!     let mut recent = RecentSearches::new();
//!     recent.add("Kuala Lumpur");
//!
//!     for suggestion in aggregator.fetch("kuala", recent.entries()).await {
//!         println!("{} ({})", suggestion.text, suggestion.source);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Components
//!
//! - [`GeocodingClient`]: autocomplete, forward and reverse geocoding against a
//!   Geoapify-compatible provider
//! - [`AddressMatcher`]: weighted building and street agreement between a
//!   [`PropertyRecord`] and an [`AddressFeature`]
//! - [`SuggestionAggregator`]: recent searches, datastore rows and autocomplete merged
//!   into one deduplicated list
//!
//! Transport, retries and rate limiting live in the [`transport`] subcrate.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
pub mod error;
mod geocoding;
mod location;
mod matching;
mod suggest;

pub use config::{
    EndpointConfig, GEOAPIFY_AUTOCOMPLETE_URL, GEOAPIFY_REVERSE_URL, GEOAPIFY_SEARCH_URL,
    GeocodingConfig, GeocodingConfigBuilder, MALAYSIA_FILTER, MatchWeights, SuggestionConfig,
    SuggestionConfigBuilder,
};
pub use geocoding::{Endpoint, GeocodingClient, GeocodingError};
pub use geoscout_transport as transport;
pub use location::{AddressComponents, AddressFeature, GeoCoordinate};
pub use matching::{
    AddressMatcher, MatchResult, PropertyRecord, Verification, levenshtein, similarity,
};
pub use suggest::{
    AddressRow, InMemoryStore, PropertyRow, PropertyStore, RecentSearches, RequestSequence,
    RequestToken, SOURCE_ADDRESSES, SOURCE_GEOCODED, SOURCE_PROPERTIES, SOURCE_RECENT,
    StoreError, Suggestion, SuggestionAggregator, SuggestionKind,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for Geoscout.
///
/// `RUST_LOG` wins over `level` when set. HTTP client internals are capped at `warn`.
/// Safe to call more than once; only the first call installs a subscriber.
///
/// ```rust
/// use geoscout::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), geoscout::error::GeoscoutError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::GeoscoutError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install subscriber: {e}"))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[test]
    fn test_reexports_fit_together() {
        setup_test_env();

        let matcher = AddressMatcher::new(MatchWeights::default());
        let feature = AddressFeature::new("Jalan Ampang", GeoCoordinate::DEFAULT_POSITION, "p1")
            .with_components(AddressComponents {
                street: Some("Jalan Ampang".to_string()),
                ..AddressComponents::default()
            });
        let result = matcher.best_match(&PropertyRecord::new("jalan ampang"), &[feature]);
        assert_eq!(result.verification(), Verification::Verified);
    }
}
