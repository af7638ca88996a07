//! Reconciliation of locally stored property addresses against geocoder results.
//!
//! Scoring is pure and deterministic. Missing data on either side removes that
//! sub-score from the average instead of counting against the record.

mod distance;

pub use distance::{levenshtein, similarity};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{config::MatchWeights, location::AddressFeature};

/// The part of a stored property the matcher looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub building_name: Option<String>,
    pub street_address: String,
}

impl PropertyRecord {
    pub fn new(street_address: impl Into<String>) -> Self {
        Self {
            building_name: None,
            street_address: street_address.into(),
        }
    }

    #[must_use]
    pub fn with_building_name(mut self, building_name: impl Into<String>) -> Self {
        self.building_name = Some(building_name.into());
        self
    }
}

/// Outcome of matching one record against a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// In `[0, 1]`
    pub score: f64,
    pub best_feature: Option<AddressFeature>,
}

impl MatchResult {
    pub fn verification(&self) -> Verification {
        Verification::from_score(self.score)
    }
}

/// Badge tier derived from a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verification {
    /// score > 0.8
    Verified,
    /// 0.5 < score <= 0.8
    Partial,
    Poor,
}

impl Verification {
    pub const VERIFIED_ABOVE: f64 = 0.8;
    pub const PARTIAL_ABOVE: f64 = 0.5;

    pub fn from_score(score: f64) -> Self {
        if score > Self::VERIFIED_ABOVE {
            Self::Verified
        } else if score > Self::PARTIAL_ABOVE {
            Self::Partial
        } else {
            Self::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AddressMatcher {
    weights: MatchWeights,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AddressMatcher {
    pub const fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub const fn weights(&self) -> MatchWeights {
        self.weights
    }

    /// Weighted agreement between `record` and `feature`, in `[0, 1]`.
    ///
    /// * building: does the record's building name contain the feature's house number
    ///   (case-insensitive)? Scores 1 or 0.
    /// * street: normalised edit-distance similarity of the street fields.
    ///
    /// Returns exactly 0 when no sub-score is comparable.
    pub fn score(&self, record: &PropertyRecord, feature: &AddressFeature) -> f64 {
        let components = feature.components();
        let mut total = 0.0;
        let mut active = 0.0;

        if let (Some(building), Some(house_number)) = (
            non_blank(record.building_name.as_deref()),
            non_blank(components.house_number.as_deref()),
        ) {
            let contained = building
                .to_lowercase()
                .contains(&house_number.to_lowercase());
            if contained {
                total += self.weights.building();
            }
            active += self.weights.building();
        }

        if let (Some(record_street), Some(feature_street)) = (
            non_blank(Some(&record.street_address)),
            non_blank(components.street.as_deref()),
        ) {
            total += self.weights.street() * similarity(record_street, feature_street);
            active += self.weights.street();
        }

        if active <= 0.0 || !active.is_finite() {
            return 0.0;
        }
        let score = total / active;
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 1.0)
    }

    /// Highest-scoring feature. Ties keep the earliest candidate.
    #[instrument(skip(self, features), fields(candidates = features.len()), level = "debug")]
    pub fn best_match(&self, record: &PropertyRecord, features: &[AddressFeature]) -> MatchResult {
        let best = features
            .iter()
            .map(|feature| (self.score(record, feature), feature))
            .fold(None::<(f64, &AddressFeature)>, |best, candidate| match best {
                Some((score, _)) if score >= candidate.0 => best,
                _ => Some(candidate),
            });

        let result = match best {
            Some((score, feature)) => MatchResult {
                score,
                best_feature: Some(feature.clone()),
            },
            None => MatchResult {
                score: 0.0,
                best_feature: None,
            },
        };
        debug!(score = result.score, "Best match selected");
        result
    }

    /// [`Self::best_match`] for every `(record, candidates)` pair, in parallel.
    /// Output order follows input order.
    pub fn verify_batch(&self, batch: &[(PropertyRecord, Vec<AddressFeature>)]) -> Vec<MatchResult> {
        batch
            .par_iter()
            .map(|(record, features)| self.best_match(record, features))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{AddressComponents, GeoCoordinate};

    fn feature(house_number: Option<&str>, street: Option<&str>) -> AddressFeature {
        AddressFeature::new(
            "Somewhere, Kuala Lumpur",
            GeoCoordinate::new(3.1390, 101.6869),
            "place",
        )
        .with_components(AddressComponents {
            house_number: house_number.map(str::to_string),
            street: street.map(str::to_string),
            ..AddressComponents::default()
        })
    }

    #[test]
    fn test_full_match() {
        let matcher = AddressMatcher::default();
        let record = PropertyRecord::new("Jalan Ampang").with_building_name("Menara 12");
        let score = matcher.score(&record, &feature(Some("12"), Some("jalan ampang")));
        assert_eq!(score, 1.0);
        assert_eq!(Verification::from_score(score), Verification::Verified);
    }

    #[test]
    fn test_no_comparable_fields_is_zero() {
        let matcher = AddressMatcher::default();
        let record = PropertyRecord::new("");
        assert_eq!(matcher.score(&record, &feature(Some("12"), Some("Jalan Ampang"))), 0.0);

        let record = PropertyRecord::new("Jalan Ampang").with_building_name("Menara");
        assert_eq!(matcher.score(&record, &feature(None, None)), 0.0);

        let record = PropertyRecord::new("   ").with_building_name("  ");
        assert_eq!(matcher.score(&record, &feature(Some(" "), Some(""))), 0.0);
    }

    #[test]
    fn test_missing_fields_are_excluded_not_penalised() {
        let matcher = AddressMatcher::default();
        // No building name: only the street is compared.
        let record = PropertyRecord::new("Jalan Ampang");
        assert_eq!(matcher.score(&record, &feature(Some("12"), Some("Jalan Ampang"))), 1.0);

        // No street on the feature: only the building is compared.
        let record = PropertyRecord::new("Jalan Ampang").with_building_name("Block 7A");
        assert_eq!(matcher.score(&record, &feature(Some("7a"), None)), 1.0);
        assert_eq!(matcher.score(&record, &feature(Some("8"), None)), 0.0);
    }

    #[test]
    fn test_weighted_combination() {
        let matcher = AddressMatcher::default();
        let record = PropertyRecord::new("Jalan Ampang").with_building_name("Menara 5");
        // Building misses, street identical: 0.4 / 0.7.
        let score = matcher.score(&record, &feature(Some("12"), Some("Jalan Ampang")));
        assert!((score - 0.4 / 0.7).abs() < 1e-12);
        assert_eq!(Verification::from_score(score), Verification::Partial);

        // Building hits, street partly similar.
        let street_similarity = similarity("Jalan Ampang", "Jln Ampang");
        let score = matcher.score(
            &PropertyRecord::new("Jalan Ampang").with_building_name("Menara 12"),
            &feature(Some("12"), Some("Jln Ampang")),
        );
        let expected = (0.3 + 0.4 * street_similarity) / 0.7;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_custom_weights() {
        let matcher = AddressMatcher::new(MatchWeights::new(0.0, 1.0).unwrap());
        let record = PropertyRecord::new("Jalan Ampang").with_building_name("Menara 5");
        assert_eq!(matcher.score(&record, &feature(Some("12"), Some("Jalan Ampang"))), 1.0);
    }

    #[test]
    fn test_extreme_weights_stay_bounded() {
        assert!(MatchWeights::new(f64::MAX, f64::MAX).is_err());

        let half = f64::MAX / 2.0;
        let matcher = AddressMatcher::new(MatchWeights::new(half, half).unwrap());
        let record = PropertyRecord::new("Jalan Ampang").with_building_name("Menara 12");
        for candidate in [
            feature(Some("12"), Some("Jalan Ampang")),
            feature(Some("12"), Some("Jln Ampang")),
            feature(Some("7"), Some("Lorong Zzz")),
            feature(None, Some("Jalan Ampang")),
        ] {
            let score = matcher.score(&record, &candidate);
            assert!((0.0..=1.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn test_score_is_bounded() {
        let matcher = AddressMatcher::default();
        let streets = ["", "a", "Jalan Ampang", "Persiaran KLCC", "xyz"];
        let buildings = [None, Some(""), Some("Tower 1"), Some("1")];
        let numbers = [None, Some("1"), Some("99")];
        for street in streets {
            for building in buildings {
                for number in numbers {
                    for feature_street in streets {
                        let mut record = PropertyRecord::new(street);
                        record.building_name = building.map(str::to_string);
                        let s = matcher.score(&record, &feature(number, Some(feature_street)));
                        assert!((0.0..=1.0).contains(&s), "score {s} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn test_verification_thresholds() {
        assert_eq!(Verification::from_score(1.0), Verification::Verified);
        assert_eq!(Verification::from_score(0.81), Verification::Verified);
        assert_eq!(Verification::from_score(0.8), Verification::Partial);
        assert_eq!(Verification::from_score(0.51), Verification::Partial);
        assert_eq!(Verification::from_score(0.5), Verification::Poor);
        assert_eq!(Verification::from_score(0.0), Verification::Poor);
    }

    #[test]
    fn test_best_match_prefers_highest_then_first() {
        let matcher = AddressMatcher::default();
        let record = PropertyRecord::new("Jalan Ampang");
        let candidates = vec![
            feature(None, Some("Jalan Tun Razak")).with_confidence(0.1),
            feature(None, Some("Jalan Ampang")).with_confidence(0.2),
            feature(None, Some("jalan ampang")).with_confidence(0.3),
        ];
        let result = matcher.best_match(&record, &candidates);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.best_feature.unwrap().confidence(), Some(0.2));

        let empty = matcher.best_match(&record, &[]);
        assert_eq!(empty.score, 0.0);
        assert!(empty.best_feature.is_none());
        assert_eq!(empty.verification(), Verification::Poor);
    }

    #[test]
    fn test_verify_batch_preserves_order() {
        let matcher = AddressMatcher::default();
        let batch: Vec<_> = (0..32)
            .map(|i| {
                let street = if i % 2 == 0 { "Jalan Ampang" } else { "Lorong Zzz" };
                (
                    PropertyRecord::new(street),
                    vec![feature(None, Some("Jalan Ampang"))],
                )
            })
            .collect();

        let results = matcher.verify_batch(&batch);
        assert_eq!(results.len(), 32);
        for (i, result) in results.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(result.verification(), Verification::Verified);
            } else {
                assert_ne!(result.verification(), Verification::Verified);
            }
        }
    }
}
