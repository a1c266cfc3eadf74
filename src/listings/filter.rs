use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::model::{Category, Listing, Location};
use crate::core::metrics::MarketplaceMetrics;

pub const DEFAULT_PRICE_MIN: f64 = 0.0;
pub const DEFAULT_PRICE_MAX: f64 = 5000.0;

/// User-chosen predicate bundle. `None` for category/location means "all".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub search: String,
    #[serde(with = "all_or")]
    pub category: Option<Category>,
    #[serde(with = "all_or")]
    pub location: Option<Location>,
    pub price_range: (f64, f64),
    pub min_rating: f64,
    pub barter_only: bool,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: None,
            location: None,
            price_range: (DEFAULT_PRICE_MIN, DEFAULT_PRICE_MAX),
            min_rating: 0.0,
            barter_only: false,
        }
    }
}

impl FilterSpec {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of criteria narrowing the result, shown on the filter badge.
    pub fn active_count(&self) -> usize {
        [
            !self.search.is_empty(),
            self.category.is_some(),
            self.location.is_some(),
            self.price_range.0 > DEFAULT_PRICE_MIN || self.price_range.1 < DEFAULT_PRICE_MAX,
            self.min_rating > 0.0,
            self.barter_only,
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Effective price bounds. Unusable input means no price restriction.
    fn price_bounds(&self) -> (f64, f64) {
        let (min, max) = self.price_range;
        if min.is_nan() || max.is_nan() || min > max {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        (min, max)
    }

    fn rating_floor(&self) -> f64 {
        if self.min_rating.is_nan() {
            0.0
        } else {
            self.min_rating
        }
    }

    /// Evaluate every predicate against one listing.
    pub fn evaluate(&self, listing: &Listing) -> PredicateReport {
        let term = self.search.to_lowercase();
        let (min_price, max_price) = self.price_bounds();

        PredicateReport {
            search: term.is_empty()
                || listing.title.to_lowercase().contains(&term)
                || listing.description.to_lowercase().contains(&term)
                || listing.tags.iter().any(|tag| tag.to_lowercase().contains(&term)),
            category: self.category.map_or(true, |c| listing.category == c),
            location: self.location.map_or(true, |l| listing.location == l),
            price: listing.price >= min_price && listing.price <= max_price,
            rating: listing.seller_reputation >= self.rating_floor(),
            barter: !self.barter_only || listing.barter_enabled,
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.evaluate(listing).passed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateReport {
    pub search: bool,
    pub category: bool,
    pub location: bool,
    pub price: bool,
    pub rating: bool,
    pub barter: bool,
}

impl PredicateReport {
    pub fn passed(&self) -> bool {
        self.search && self.category && self.location && self.price && self.rating && self.barter
    }

    pub fn failed(&self) -> Vec<&'static str> {
        [
            ("search", self.search),
            ("category", self.category),
            ("location", self.location),
            ("price", self.price),
            ("rating", self.rating),
            ("barter", self.barter),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Stable filter: survivors keep their input order.
pub fn apply(listings: &[Listing], spec: &FilterSpec) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| spec.matches(listing))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilterEngine {
    metrics: Option<Arc<MarketplaceMetrics>>,
}

impl ListingFilterEngine {
    pub fn new() -> Self {
        Self { metrics: None }
    }

    pub fn with_metrics(metrics: Arc<MarketplaceMetrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    pub fn apply(&self, listings: &[Listing], spec: &FilterSpec) -> Vec<Listing> {
        let filtered = apply(listings, spec);

        if let Some(metrics) = &self.metrics {
            metrics.increment_filter_runs();
        }

        tracing::debug!(
            "🔎 Filtered {} -> {} listings ({} active filters)",
            listings.len(),
            filtered.len(),
            spec.active_count()
        );

        filtered
    }
}

/// (De)serializes `Option<T>` as `"all"` for `None`. Unknown values read as `None`.
mod all_or {
    use serde::de::{DeserializeOwned, IntoDeserializer};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str("all"),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.eq_ignore_ascii_case("all") {
            return Ok(None);
        }

        let parsed: Result<T, serde::de::value::Error> = T::deserialize(raw.as_str().into_deserializer());
        match parsed {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                tracing::warn!("Ignoring unknown filter value '{}'", raw);
                Ok(None)
            }
        }
    }
}
