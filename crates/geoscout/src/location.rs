//! Location primitives shared by the geocoding client, the matcher and the suggestion
//! aggregator.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A WGS84 position in decimal degrees.
///
/// Values are not checked on construction; anything that talks to a provider must
/// call [`GeoCoordinate::is_valid`] first. Invalid coordinates are never sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude, valid in `[-90, 90]`
    pub lat: f64,
    /// Longitude, valid in `[-180, 180]`
    pub lng: f64,
}

impl GeoCoordinate {
    /// Fallback map position (Mersing, Johor) used when no device position is available.
    pub const DEFAULT_POSITION: Self = Self::new(2.430917, 103.836113);

    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON `[lon, lat]` pair.
    #[must_use]
    pub const fn from_lon_lat([lon, lat]: [f64; 2]) -> Self {
        Self { lat, lng: lon }
    }

    /// Both components finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// `Some(self)` if valid.
    #[must_use]
    pub fn validated(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }

    /// Best-effort position: the device position if it is present and valid,
    /// otherwise [`Self::DEFAULT_POSITION`].
    #[must_use]
    pub fn or_default(device: Option<Self>) -> Self {
        match device.and_then(Self::validated) {
            Some(position) => position,
            None => {
                debug!(?device, "No usable device position, using default");
                Self::DEFAULT_POSITION
            }
        }
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Structured parts of an address. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub house_number: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

/// A single geocoder result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressFeature {
    formatted_address: String,
    coordinate: GeoCoordinate,
    components: AddressComponents,
    place_id: String,
    confidence: Option<f64>,
}

impl AddressFeature {
    pub fn new(
        formatted_address: impl Into<String>,
        coordinate: GeoCoordinate,
        place_id: impl Into<String>,
    ) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            coordinate,
            components: AddressComponents::default(),
            place_id: place_id.into(),
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_components(mut self, components: AddressComponents) -> Self {
        self.components = components;
        self
    }

    /// Confidence outside `[0, 1]` (or NaN) is discarded.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = (0.0..=1.0).contains(&confidence).then_some(confidence);
        self
    }

    #[must_use]
    pub fn formatted_address(&self) -> &str {
        &self.formatted_address
    }

    #[must_use]
    pub const fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }

    #[must_use]
    pub const fn components(&self) -> &AddressComponents {
        &self.components
    }

    #[must_use]
    pub fn place_id(&self) -> &str {
        &self.place_id
    }

    #[must_use]
    pub const fn confidence(&self) -> Option<f64> {
        self.confidence
    }
}

impl fmt::Display for AddressFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.formatted_address, self.coordinate)
    }
}
