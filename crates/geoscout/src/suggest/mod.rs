//! Merged, ranked search suggestions for a search box.
//!
//! Candidates come from three places: the caller's recent searches, the local
//! datastore and provider autocomplete. They are deduplicated on their
//! case-insensitive trimmed text, ranked and truncated. A failing source only
//! removes its own contribution.

use std::sync::Arc;

use ahash::AHashSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use geoscout_transport::Transport;

use crate::{
    config::SuggestionConfig,
    geocoding::GeocodingClient,
    location::{AddressFeature, GeoCoordinate},
};

mod recent;
mod store;

pub use recent::{RecentSearches, RequestSequence, RequestToken};
pub use store::{AddressRow, InMemoryStore, PropertyRow, PropertyStore, StoreError};

pub const SOURCE_RECENT: &str = "Recent Search";
pub const SOURCE_PROPERTIES: &str = "Properties Database";
pub const SOURCE_ADDRESSES: &str = "Address Database";
pub const SOURCE_GEOCODED: &str = "Geocoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionKind {
    Recent,
    Database,
    Geocoded,
}

impl SuggestionKind {
    const fn rank(self) -> u8 {
        match self {
            Self::Recent => 0,
            Self::Database => 1,
            Self::Geocoded => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
    /// Human-readable origin, e.g. "Properties Database"
    pub source: String,
    /// Only set for geocoded suggestions
    pub coordinate: Option<GeoCoordinate>,
    pub property_type: Option<String>,
    pub home_type: Option<String>,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, kind: SuggestionKind, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            source: source.into(),
            coordinate: None,
            property_type: None,
            home_type: None,
        }
    }

    fn recent(text: &str) -> Self {
        Self::new(text, SuggestionKind::Recent, SOURCE_RECENT)
    }

    fn from_property(text: &str, row: &PropertyRow) -> Self {
        Self {
            property_type: row.property_type.clone(),
            home_type: row.home_type.clone(),
            ..Self::new(text, SuggestionKind::Database, SOURCE_PROPERTIES)
        }
    }

    fn from_feature(feature: AddressFeature) -> Self {
        let coordinate = feature.coordinate();
        Self {
            coordinate: Some(coordinate),
            ..Self::new(
                String::from(feature.formatted_address()),
                SuggestionKind::Geocoded,
                SOURCE_GEOCODED,
            )
        }
    }

    fn normalized_text(&self) -> String {
        self.text.trim().to_lowercase()
    }
}

/// Combines recent searches, a [`PropertyStore`] and (optionally) a [`GeocodingClient`].
///
/// Holds no per-request state, so one instance can serve overlapping calls. Pair it
/// with a [`RequestSequence`] to drop stale completions.
#[derive(Debug)]
pub struct SuggestionAggregator<S, T> {
    config: SuggestionConfig,
    store: S,
    geocoder: Option<Arc<GeocodingClient<T>>>,
}

impl<S: PropertyStore, T: Transport> SuggestionAggregator<S, T> {
    /// Local sources only until a geocoder is attached.
    pub const fn new(config: SuggestionConfig, store: S) -> Self {
        Self {
            config,
            store,
            geocoder: None,
        }
    }

    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<GeocodingClient<T>>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub const fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Suggestions for `term`, best first. Never fails; an unusable term or every
    /// source failing yields an empty list.
    pub async fn fetch(&self, term: &str, recent: &[String]) -> Vec<Suggestion> {
        self.fetch_near(term, recent, None).await
    }

    /// [`Self::fetch`] with geocoded candidates biased towards `focus`.
    #[instrument(name = "Fetch suggestions", skip(self, recent), fields(recent = recent.len()), level = "debug")]
    pub async fn fetch_near(
        &self,
        term: &str,
        recent: &[String],
        focus: Option<GeoCoordinate>,
    ) -> Vec<Suggestion> {
        let term = term.trim();
        if term.chars().count() < self.config.min_term_len {
            return Vec::new();
        }
        let needle = term.to_lowercase();

        let recent_matches = recent
            .iter()
            .filter(|entry| entry.to_lowercase().contains(&needle))
            .take(self.config.recent_limit)
            .map(|entry| Suggestion::recent(entry));

        let (database, geocoded) = tokio::join!(
            self.database_candidates(&needle),
            self.geocoded_candidates(term, focus)
        );
        debug!(
            database = database.len(),
            geocoded = geocoded.len(),
            "Collected suggestion candidates"
        );

        let candidates = recent_matches.chain(database).chain(geocoded);
        rank(dedupe(candidates), &needle, self.config.max_suggestions)
    }

    /// Property rows first. The address table is only scanned when no property matched.
    async fn database_candidates(&self, needle: &str) -> Vec<Suggestion> {
        let limit = self.config.store_scan_limit;
        let matches = |value: &str| value.to_lowercase().contains(needle);

        let properties = self.store.properties(limit).await.unwrap_or_else(|error| {
            warn!(%error, "Property lookup failed");
            Vec::new()
        });

        let mut found = Vec::new();
        for row in &properties {
            let address = row.address.as_deref().filter(|a| !a.is_empty());
            if let Some(address) = address.filter(|a| matches(*a)) {
                found.push(Suggestion::from_property(address, row));
            }
            if let Some(building) = row.building_name.as_deref().filter(|b| !b.is_empty())
                && Some(building) != address
                && matches(building)
            {
                found.push(Suggestion::from_property(building, row));
            }
        }
        if !found.is_empty() {
            return found;
        }

        match self.store.addresses(limit).await {
            Ok(rows) => rows
                .iter()
                .flat_map(AddressRow::fields)
                .filter(|value| matches(*value))
                .map(|value| Suggestion::new(value, SuggestionKind::Database, SOURCE_ADDRESSES))
                .collect(),
            Err(error) => {
                warn!(%error, "Address lookup failed");
                Vec::new()
            }
        }
    }

    async fn geocoded_candidates(&self, term: &str, focus: Option<GeoCoordinate>) -> Vec<Suggestion> {
        if !self.config.geocoding_enabled || term.chars().count() < self.config.min_geocode_len {
            return Vec::new();
        }
        let Some(geocoder) = &self.geocoder else {
            return Vec::new();
        };

        match geocoder.autocomplete(term, focus).await {
            Ok(features) => features
                .into_iter()
                .take(self.config.geocoded_limit)
                .map(Suggestion::from_feature)
                .collect(),
            Err(error) => {
                warn!(%error, "Geocoded suggestions unavailable");
                Vec::new()
            }
        }
    }
}

/// First occurrence of each normalized text wins.
fn dedupe(candidates: impl IntoIterator<Item = Suggestion>) -> Vec<Suggestion> {
    let mut seen = AHashSet::new();
    candidates
        .into_iter()
        .filter(|suggestion| seen.insert(suggestion.normalized_text()))
        .collect()
}

/// Stable ordering: recent first, then exact match, prefix match, source kind and
/// finally shorter text.
fn rank(suggestions: Vec<Suggestion>, needle: &str, max: usize) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .sorted_by_cached_key(|suggestion| {
            let text = suggestion.normalized_text();
            (
                suggestion.kind != SuggestionKind::Recent,
                text != needle,
                !text.starts_with(needle),
                suggestion.kind.rank(),
                suggestion.text.trim().chars().count(),
            )
        })
        .take(max)
        .collect()
}
