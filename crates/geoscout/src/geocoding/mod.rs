//! Client for the upstream geocoding provider.
//!
//! Three operations are exposed: forward geocoding ([`GeocodingClient::geocode_address`]),
//! as-you-type autocomplete ([`GeocodingClient::autocomplete`]) and reverse geocoding
//! ([`GeocodingClient::reverse_geocode`]). Every call validates its input, waits on the
//! endpoint's rate-limit slot, builds the provider URL and delegates to the
//! [`HttpRequestExecutor`], which owns timeouts and retries. Nothing is retried here.

use std::{fmt, sync::Arc};

pub use error::GeocodingError;
use error::Result;
#[cfg(feature = "reqwest-transport")]
use geoscout_transport::ReqwestTransport;
use geoscout_transport::{HttpRequestExecutor, RateLimiter, Transport, redact_url};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    config::GeocodingConfig,
    error::GeoscoutError,
    location::{AddressFeature, GeoCoordinate},
};

mod wire;

use wire::FeatureCollection;

/// Upstream endpoint class. Each one has its own rate-limit slot and quota pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Autocomplete,
    Search,
    Reverse,
}

impl Endpoint {
    pub const ALL: [Self; 3] = [Self::Autocomplete, Self::Search, Self::Reverse];

    /// Name of the operation served by this endpoint, as used in error messages.
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::Autocomplete => "autocomplete",
            Self::Search => "geocode",
            Self::Reverse => "reverse geocode",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// Query used by [`GeocodingClient::check_service`].
const PROBE_QUERY: &str = "Kuala Lumpur";
const PROBE_FOCUS: GeoCoordinate = GeoCoordinate::new(3.1390, 101.6869);

#[derive(Debug, Clone)]
struct EndpointUrls {
    autocomplete: Url,
    search: Url,
    reverse: Url,
}

impl EndpointUrls {
    fn parse(config: &GeocodingConfig) -> std::result::Result<Self, GeoscoutError> {
        let parse = |endpoint: Endpoint| {
            let base = &config.endpoint(endpoint).base_url;
            Url::parse(base).map_err(|e| {
                GeoscoutError::ConfigError(format!("Invalid {endpoint} base URL '{base}': {e}"))
            })
        };
        Ok(Self {
            autocomplete: parse(Endpoint::Autocomplete)?,
            search: parse(Endpoint::Search)?,
            reverse: parse(Endpoint::Reverse)?,
        })
    }

    const fn get(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Autocomplete => &self.autocomplete,
            Endpoint::Search => &self.search,
            Endpoint::Reverse => &self.reverse,
        }
    }
}

/// Geocoding client over a [`Transport`].
///
/// # Examples
///
/// ```rust,no_run
/// use geoscout::{GeoCoordinate, GeocodingClient, GeocodingConfigBuilder};
///
/// # async fn run() -> Result<(), geoscout::error::GeoscoutError> {
/// let config = GeocodingConfigBuilder::malaysia().api_key("my-key").build();
/// let client = GeocodingClient::new(config)?;
///
/// let near_kl = GeoCoordinate::new(3.1390, 101.6869);
/// for feature in client.autocomplete("jalan amp", Some(near_kl)).await? {
///     println!("{feature}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GeocodingClient<T> {
    config: GeocodingConfig,
    urls: EndpointUrls,
    limiter: Arc<RateLimiter<Endpoint>>,
    executor: HttpRequestExecutor<T>,
}

#[cfg(feature = "reqwest-transport")]
impl GeocodingClient<ReqwestTransport> {
    /// Create a client backed by reqwest.
    pub fn new(config: GeocodingConfig) -> std::result::Result<Self, GeoscoutError> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }
}

impl<T: Transport> GeocodingClient<T> {
    /// Create a client over any transport. Fails if a base URL does not parse or an
    /// endpoint's result limit is zero.
    pub fn with_transport(
        config: GeocodingConfig,
        transport: T,
    ) -> std::result::Result<Self, GeoscoutError> {
        let urls = EndpointUrls::parse(&config)?;
        if let Some(endpoint) = Endpoint::ALL
            .into_iter()
            .find(|e| config.endpoint(*e).limit == 0)
        {
            return Err(GeoscoutError::ConfigError(format!(
                "Result limit for {endpoint} must be at least 1"
            )));
        }

        let limiter = Endpoint::ALL.into_iter().fold(
            RateLimiter::new(config.autocomplete.min_interval),
            |limiter, endpoint| {
                limiter.with_interval(endpoint, config.endpoint(endpoint).min_interval)
            },
        );
        let executor = HttpRequestExecutor::new(transport).with_backoff_base(config.backoff_base);

        Ok(Self {
            config,
            urls,
            limiter: Arc::new(limiter),
            executor,
        })
    }

    /// Share one rate limiter between several clients so that they respect a common
    /// quota. The limiter's own intervals replace the ones from this client's config.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter<Endpoint>>) -> Self {
        self.limiter = limiter;
        self
    }

    pub const fn rate_limiter(&self) -> &Arc<RateLimiter<Endpoint>> {
        &self.limiter
    }

    pub const fn config(&self) -> &GeocodingConfig {
        &self.config
    }

    pub const fn transport(&self) -> &T {
        self.executor.transport()
    }

    /// As-you-type suggestions for `text`, optionally biased towards `focus`.
    ///
    /// Returns an empty list without any request when the trimmed text is shorter
    /// than the configured minimum. An invalid `focus` is ignored.
    #[instrument(name = "Autocomplete", skip(self), level = "debug")]
    pub async fn autocomplete(
        &self,
        text: &str,
        focus: Option<GeoCoordinate>,
    ) -> Result<Vec<AddressFeature>> {
        self.text_query(Endpoint::Autocomplete, text, focus).await
    }

    /// One-shot resolution of a complete address. Same guards as [`Self::autocomplete`].
    #[instrument(name = "Geocode address", skip(self), level = "debug")]
    pub async fn geocode_address(
        &self,
        text: &str,
        focus: Option<GeoCoordinate>,
    ) -> Result<Vec<AddressFeature>> {
        self.text_query(Endpoint::Search, text, focus).await
    }

    /// The best address at `coordinate`, or `None` if the provider knows of nothing
    /// there (open water, for instance).
    ///
    /// An invalid coordinate is rejected with [`GeocodingError::InvalidInput`] before
    /// any request is made.
    #[instrument(name = "Reverse geocode", skip(self), level = "debug")]
    pub async fn reverse_geocode(&self, coordinate: GeoCoordinate) -> Result<Option<AddressFeature>> {
        if !coordinate.is_valid() {
            warn!(?coordinate, "Rejecting invalid coordinates");
            return Err(GeocodingError::InvalidInput(format!(
                "coordinates out of range: lat={}, lng={}",
                coordinate.lat, coordinate.lng
            )));
        }

        let endpoint = Endpoint::Reverse;
        let limit = self.config.reverse.limit.to_string();
        let mut params = vec![
            ("lat", coordinate.lat.to_string()),
            ("lon", coordinate.lng.to_string()),
            ("limit", limit),
        ];
        self.push_common_params(endpoint, &mut params);

        let feature = self.fetch(endpoint, &params).await?.into_iter().next();
        if feature.is_none() {
            warn!(?coordinate, "No reverse geocoding results");
        }
        Ok(feature)
    }

    /// Human-readable label for `coordinate`: the provider's formatted address, or the
    /// coordinate itself (6 decimal places) when no address is found or the request
    /// fails. Invalid coordinates are still an error.
    pub async fn reverse_geocode_label(&self, coordinate: GeoCoordinate) -> Result<String> {
        match self.reverse_geocode(coordinate).await {
            Ok(Some(feature)) => Ok(feature.formatted_address().to_string()),
            Ok(None) => Ok(coordinate.to_string()),
            Err(err @ GeocodingError::InvalidInput(_)) => Err(err),
            Err(err) => {
                warn!(error = %err, "Reverse geocoding failed, using coordinate label");
                Ok(coordinate.to_string())
            }
        }
    }

    /// Whether the provider currently answers a known-good query with results.
    pub async fn check_service(&self) -> bool {
        match self.geocode_address(PROBE_QUERY, Some(PROBE_FOCUS)).await {
            Ok(features) if !features.is_empty() => {
                info!(first = %features[0].formatted_address(), "Geocoding service is working");
                true
            }
            Ok(_) => {
                warn!("Geocoding service returned no results for the probe query");
                false
            }
            Err(err) => {
                warn!(error = %err, "Geocoding service probe failed");
                false
            }
        }
    }

    async fn text_query(
        &self,
        endpoint: Endpoint,
        text: &str,
        focus: Option<GeoCoordinate>,
    ) -> Result<Vec<AddressFeature>> {
        let text = text.trim();
        if text.chars().count() < self.config.min_query_len {
            debug!(text, "Query too short, skipping provider");
            return Ok(Vec::new());
        }

        let mut params = vec![
            ("text", text.to_string()),
            ("limit", self.config.endpoint(endpoint).limit.to_string()),
        ];
        if let Some(filter) = &self.config.country_filter {
            params.push(("filter", filter.clone()));
        }
        match focus {
            Some(point) if point.is_valid() => {
                params.push(("bias", format!("proximity:{},{}", point.lng, point.lat)));
            }
            Some(point) => debug!(?point, "Ignoring invalid focus point"),
            None => {}
        }
        self.push_common_params(endpoint, &mut params);

        self.fetch(endpoint, &params).await
    }

    fn push_common_params(&self, endpoint: Endpoint, params: &mut Vec<(&'static str, String)>) {
        if let Some(key) = &self.config.endpoint(endpoint).api_key {
            params.push(("apiKey", key.clone()));
        }
        params.push(("format", "geojson".to_string()));
    }

    async fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&'static str, String)],
    ) -> Result<Vec<AddressFeature>> {
        let mut url = self.urls.get(endpoint).clone();
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));

        self.limiter.acquire(&endpoint).await;
        debug!(url = %redact_url(&url), "Calling provider");

        let collection: FeatureCollection = self
            .executor
            .execute(&url, self.config.timeout, self.config.max_retries)
            .await
            .map_err(|cause| {
                warn!(operation = %endpoint, error = %cause, "Provider request failed");
                GeocodingError::Failure {
                    operation: endpoint,
                    cause,
                }
            })?;

        let features = collection.into_features();
        debug!(operation = %endpoint, count = features.len(), "Provider answered");
        Ok(features)
    }
}

mod error {
    use geoscout_transport::RequestError;
    use thiserror::Error;

    use super::Endpoint;

    #[derive(Error, Debug)]
    pub enum GeocodingError {
        #[error("Invalid input: {0}")]
        InvalidInput(String),
        #[error("{operation} failed: {cause}")]
        Failure {
            operation: Endpoint,
            #[source]
            cause: RequestError,
        },
    }

    impl GeocodingError {
        /// The operation that failed, if a request was attempted at all.
        #[must_use]
        pub const fn operation(&self) -> Option<Endpoint> {
            match self {
                Self::InvalidInput(_) => None,
                Self::Failure { operation, .. } => Some(*operation),
            }
        }

        #[must_use]
        pub const fn request_error(&self) -> Option<&RequestError> {
            match self {
                Self::InvalidInput(_) => None,
                Self::Failure { cause, .. } => Some(cause),
            }
        }
    }

    pub type Result<T> = std::result::Result<T, GeocodingError>;
}
