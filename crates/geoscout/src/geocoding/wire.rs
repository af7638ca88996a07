//! Provider response envelope (GeoJSON `FeatureCollection`).
//!
//! Only the properties the crate consumes are named; everything else in the
//! provider's `properties` bag is dropped during deserialization.

use serde::Deserialize;
use tracing::warn;

use crate::location::{AddressComponents, AddressFeature, GeoCoordinate};

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<WireFeature>,
}

#[derive(Debug, Deserialize)]
pub struct WireFeature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: `[lon, lat]`, optionally followed by altitude
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(default)]
    formatted: String,
    housenumber: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    #[serde(default)]
    place_id: String,
    confidence: Option<f64>,
}

impl FeatureCollection {
    /// Map every usable feature, preserving provider order.
    pub fn into_features(self) -> Vec<AddressFeature> {
        self.features
            .into_iter()
            .filter_map(WireFeature::into_feature)
            .collect()
    }
}

impl WireFeature {
    /// `None` when the feature carries a short or out-of-range position.
    pub fn into_feature(self) -> Option<AddressFeature> {
        let &[lon, lat, ..] = self.geometry.coordinates.as_slice() else {
            warn!(
                place_id = %self.properties.place_id,
                coordinates = ?self.geometry.coordinates,
                "Dropping feature without a position"
            );
            return None;
        };
        let coordinate = GeoCoordinate::from_lon_lat([lon, lat]);
        if !coordinate.is_valid() {
            warn!(
                place_id = %self.properties.place_id,
                ?coordinate,
                "Dropping feature with invalid coordinates"
            );
            return None;
        }

        let Properties {
            formatted,
            housenumber,
            street,
            city,
            state,
            postcode,
            country,
            place_id,
            confidence,
        } = self.properties;

        let formatted = if formatted.trim().is_empty() {
            coordinate.to_string()
        } else {
            formatted
        };
        let components = AddressComponents {
            house_number: housenumber,
            street,
            city,
            state,
            postcode,
            country,
        };

        let feature = AddressFeature::new(formatted, coordinate, place_id).with_components(components);
        Some(match confidence {
            Some(confidence) => feature.with_confidence(confidence),
            None => feature,
        })
    }
}
