use std::time::Duration;

use crate::{error::GeoscoutError, geocoding::Endpoint};

pub const GEOAPIFY_AUTOCOMPLETE_URL: &str = "https://api.geoapify.com/v1/geocode/autocomplete";
pub const GEOAPIFY_SEARCH_URL: &str = "https://api.geoapify.com/v1/geocode/search";
pub const GEOAPIFY_REVERSE_URL: &str = "https://api.geoapify.com/v1/geocode/reverse";

/// Country restriction used by the Malaysian preset.
pub const MALAYSIA_FILTER: &str = "countrycode:my";

/// Settings for one upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    /// Sent as the `apiKey` query parameter when present
    pub api_key: Option<String>,
    /// Value of the `limit` query parameter
    pub limit: u32,
    /// Minimum spacing between two requests to this endpoint
    pub min_interval: Duration,
}

impl EndpointConfig {
    fn new(base_url: &str, limit: u32) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            limit,
            min_interval: Duration::from_millis(300),
        }
    }
}

/// Configuration for [`crate::GeocodingClient`].
///
/// Use [`GeocodingConfigBuilder`] to create one; the default targets the public
/// Geoapify endpoints with no API key and no country filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodingConfig {
    pub autocomplete: EndpointConfig,
    pub search: EndpointConfig,
    pub reverse: EndpointConfig,
    /// Provider `filter` parameter, e.g. `countrycode:my`. Not applied to reverse lookups.
    pub country_filter: Option<String>,
    /// Deadline for each individual HTTP attempt
    pub timeout: Duration,
    /// Extra attempts after a transport failure
    pub max_retries: u32,
    /// Retry `n` waits `backoff_base * (n + 1)`
    pub backoff_base: Duration,
    /// Text queries shorter than this (after trimming) never reach the provider
    pub min_query_len: usize,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            autocomplete: EndpointConfig::new(GEOAPIFY_AUTOCOMPLETE_URL, 10),
            search: EndpointConfig::new(GEOAPIFY_SEARCH_URL, 10),
            reverse: EndpointConfig::new(GEOAPIFY_REVERSE_URL, 1),
            country_filter: None,
            timeout: Duration::from_millis(10_000),
            max_retries: 2,
            backoff_base: Duration::from_millis(2000),
            min_query_len: 3,
        }
    }
}

impl GeocodingConfig {
    pub fn builder() -> GeocodingConfigBuilder {
        GeocodingConfigBuilder::new()
    }

    #[must_use]
    pub const fn endpoint(&self, endpoint: Endpoint) -> &EndpointConfig {
        match endpoint {
            Endpoint::Autocomplete => &self.autocomplete,
            Endpoint::Search => &self.search,
            Endpoint::Reverse => &self.reverse,
        }
    }

    const fn endpoint_mut(&mut self, endpoint: Endpoint) -> &mut EndpointConfig {
        match endpoint {
            Endpoint::Autocomplete => &mut self.autocomplete,
            Endpoint::Search => &mut self.search,
            Endpoint::Reverse => &mut self.reverse,
        }
    }
}

/// Builder for [`GeocodingConfig`] with a few presets.
#[derive(Debug, Clone, Default)]
pub struct GeocodingConfigBuilder {
    config: GeocodingConfig,
}

impl GeocodingConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GeocodingConfig::default(),
        }
    }

    /// Public Geoapify endpoints (same as [`Self::new`]).
    pub fn geoapify() -> Self {
        Self::new()
    }

    /// Geoapify restricted to Malaysian results.
    pub fn malaysia() -> Self {
        Self::geoapify().country_filter(MALAYSIA_FILTER)
    }

    /// Geoapify configured from the process environment.
    ///
    /// `GEOAPIFY_API_KEY` applies to every endpoint; `GEOAPIFY_API_KEY_AUTOCOMPLETE`,
    /// `GEOAPIFY_API_KEY_GEOCODING` and `GEOAPIFY_API_KEY_REVERSE` override it per
    /// endpoint. `GEOAPIFY_AUTOCOMPLETE_URL`, `GEOAPIFY_GEOCODING_URL` and
    /// `GEOAPIFY_REVERSE_URL` replace the base URLs.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut builder = Self::geoapify();

        if let Some(key) = lookup("GEOAPIFY_API_KEY") {
            builder = builder.api_key(key);
        }
        for (endpoint, key_var, url_var) in [
            (
                Endpoint::Autocomplete,
                "GEOAPIFY_API_KEY_AUTOCOMPLETE",
                "GEOAPIFY_AUTOCOMPLETE_URL",
            ),
            (
                Endpoint::Search,
                "GEOAPIFY_API_KEY_GEOCODING",
                "GEOAPIFY_GEOCODING_URL",
            ),
            (
                Endpoint::Reverse,
                "GEOAPIFY_API_KEY_REVERSE",
                "GEOAPIFY_REVERSE_URL",
            ),
        ] {
            if let Some(key) = lookup(key_var) {
                builder = builder.endpoint_api_key(endpoint, key);
            }
            if let Some(url) = lookup(url_var) {
                builder = builder.base_url(endpoint, url);
            }
        }
        builder
    }

    /// Use the same API key for every endpoint
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        for endpoint in Endpoint::ALL {
            self.config.endpoint_mut(endpoint).api_key = Some(key.clone());
        }
        self
    }

    pub fn endpoint_api_key(mut self, endpoint: Endpoint, key: impl Into<String>) -> Self {
        self.config.endpoint_mut(endpoint).api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, endpoint: Endpoint, url: impl Into<String>) -> Self {
        self.config.endpoint_mut(endpoint).base_url = url.into();
        self
    }

    pub fn limit(mut self, endpoint: Endpoint, limit: u32) -> Self {
        self.config.endpoint_mut(endpoint).limit = limit;
        self
    }

    pub fn min_interval(mut self, endpoint: Endpoint, interval: Duration) -> Self {
        self.config.endpoint_mut(endpoint).min_interval = interval;
        self
    }

    pub fn country_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.country_filter = Some(filter.into());
        self
    }

    pub fn no_country_filter(mut self) -> Self {
        self.config.country_filter = None;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn backoff_base(mut self, backoff_base: Duration) -> Self {
        self.config.backoff_base = backoff_base;
        self
    }

    pub fn min_query_len(mut self, min_query_len: usize) -> Self {
        self.config.min_query_len = min_query_len;
        self
    }

    pub fn build(self) -> GeocodingConfig {
        self.config
    }
}

/// Configuration for [`crate::SuggestionAggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionConfig {
    /// Terms shorter than this (after trimming) produce no suggestions at all
    pub min_term_len: usize,
    /// Terms shorter than this skip the geocoding source
    pub min_geocode_len: usize,
    /// Maximum number of recent searches mixed in
    pub recent_limit: usize,
    /// Maximum number of provider results mixed in
    pub geocoded_limit: usize,
    /// Length of the returned list
    pub max_suggestions: usize,
    /// Rows requested from each datastore table
    pub store_scan_limit: usize,
    pub geocoding_enabled: bool,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            min_term_len: 2,
            min_geocode_len: 3,
            recent_limit: 2,
            geocoded_limit: 4,
            max_suggestions: 8,
            store_scan_limit: 50,
            geocoding_enabled: true,
        }
    }
}

impl SuggestionConfig {
    pub fn builder() -> SuggestionConfigBuilder {
        SuggestionConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionConfigBuilder {
    config: SuggestionConfig,
}

impl SuggestionConfigBuilder {
    /// Local sources only
    pub fn offline() -> Self {
        Self::default().geocoding(false)
    }

    pub fn min_term_len(mut self, len: usize) -> Self {
        self.config.min_term_len = len;
        self
    }

    pub fn min_geocode_len(mut self, len: usize) -> Self {
        self.config.min_geocode_len = len;
        self
    }

    pub fn recent_limit(mut self, limit: usize) -> Self {
        self.config.recent_limit = limit;
        self
    }

    pub fn geocoded_limit(mut self, limit: usize) -> Self {
        self.config.geocoded_limit = limit;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.config.max_suggestions = max;
        self
    }

    pub fn store_scan_limit(mut self, limit: usize) -> Self {
        self.config.store_scan_limit = limit;
        self
    }

    pub fn geocoding(mut self, enabled: bool) -> Self {
        self.config.geocoding_enabled = enabled;
        self
    }

    pub fn build(self) -> SuggestionConfig {
        self.config
    }
}

/// Relative weights of the address matcher's sub-scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    building: f64,
    street: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            building: 0.3,
            street: 0.4,
        }
    }
}

impl MatchWeights {
    /// Weights need not sum to 1; the matcher normalises by the weights in play.
    pub fn new(building: f64, street: f64) -> Result<Self, GeoscoutError> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(building) || !valid(street) {
            return Err(GeoscoutError::ConfigError(format!(
                "Match weights must be finite and non-negative, got building={building}, street={street}"
            )));
        }
        let sum = building + street;
        if !sum.is_finite() {
            return Err(GeoscoutError::ConfigError(format!(
                "Match weights overflow when combined: building={building}, street={street}"
            )));
        }
        if sum <= 0.0 {
            return Err(GeoscoutError::ConfigError(
                "At least one match weight must be positive".to_string(),
            ));
        }
        Ok(Self { building, street })
    }

    pub const fn building(&self) -> f64 {
        self.building
    }

    pub const fn street(&self) -> f64 {
        self.street
    }
}
