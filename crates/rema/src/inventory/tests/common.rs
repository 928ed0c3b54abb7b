use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::inventory::domain::{Property, PropertyDraft, PropertyId};
use crate::inventory::repository::{PropertyRepository, RepositoryError};
use crate::inventory::service::{InventoryService, InventorySettings};
use crate::inventory::store::InMemoryPropertyStore;
use crate::valuation::{
    Bedrooms, FeatureNormalizer, FeatureSet, Furnishing, InferenceError, ListingKind,
    NormalizerConfig, PriceModel, PricePredictor, PropertyType, PropertyValuation,
    ValuationEngine, ValuationPolicy,
};

pub(super) const MODEL_VERSION: &str = "per-sqm-test";
pub(super) const UNPRICED_CITY: &str = "Atlantis";

/// Prices every listing at a flat rate per square meter; knows no city called Atlantis.
pub(super) struct PerSquareMeterModel(pub(super) f64);

impl PriceModel for PerSquareMeterModel {
    fn version(&self) -> &str {
        MODEL_VERSION
    }

    fn estimate(&self, features: &FeatureSet) -> Result<f64, InferenceError> {
        if features.city == UNPRICED_CITY {
            return Err(InferenceError::UnseenCategory {
                field: "city",
                value: features.city.clone(),
            });
        }
        Ok(self.0 * features.surface_area)
    }
}

/// Atlantis is in the normalizer's vocabulary so the model itself gets to reject it.
pub(super) fn valuation_engine() -> Arc<ValuationEngine> {
    Arc::new(ValuationEngine::new(
        FeatureNormalizer::new(NormalizerConfig::with_cities(["Amman", "Irbid", UNPRICED_CITY])),
        PricePredictor::new(Arc::new(PerSquareMeterModel(1_000.0))),
        ValuationPolicy::default(),
    ))
}

pub(super) fn service_over<R>(repository: Arc<R>) -> InventoryService<R>
where
    R: PropertyRepository + 'static,
{
    InventoryService::new(repository, valuation_engine(), InventorySettings::default())
}

pub(super) fn seeded_service(
    properties: Vec<Property>,
) -> (InventoryService<InMemoryPropertyStore>, Arc<InMemoryPropertyStore>) {
    let store = Arc::new(InMemoryPropertyStore::with_properties(properties));
    (service_over(store.clone()), store)
}

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Unvalued Amman apartment created `id` days after the epoch.
pub(super) fn listing(id: u64) -> Property {
    Property {
        id: PropertyId(id),
        city: "Amman".to_string(),
        neighborhood: "Khalda".to_string(),
        property_type: PropertyType::Apartment,
        listing: ListingKind::Sale,
        surface_area: 120.0,
        bedrooms: Bedrooms::Count(3),
        bathrooms: 2,
        furnishing: Furnishing::Unfurnished,
        floor: None,
        price: 100_000.0,
        currency: "JOD".to_string(),
        location: None,
        description: String::new(),
        images: Vec::new(),
        created_at: epoch() + Duration::days(id as i64),
        valuation: None,
    }
}

/// Listing priced at `price` against a stored prediction of `predicted`.
pub(super) fn valued(id: u64, price: f64, predicted: f64) -> Property {
    let mut property = listing(id);
    property.price = price;
    property.valuation = Some(PropertyValuation {
        predicted_price: predicted,
        model_version: MODEL_VERSION.to_string(),
        assessment: ValuationPolicy::default().classify(Some(price), predicted),
    });
    property
}

pub(super) fn draft(city: &str, surface_area: f64, price: f64) -> PropertyDraft {
    PropertyDraft {
        id: None,
        city: city.to_string(),
        neighborhood: "Abdoun".to_string(),
        property_type: PropertyType::Apartment,
        listing: ListingKind::Sale,
        surface_area,
        bedrooms: Bedrooms::Count(2),
        bathrooms: 1,
        furnishing: Furnishing::Furnished,
        floor: Some("ground floor".to_string()),
        price,
        location: None,
        description: "Bright flat near the park".to_string(),
        images: vec!["a.jpg".to_string()],
        created_at: Some(epoch()),
    }
}

pub(super) fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub(super) fn ids(properties: &[Property]) -> Vec<u64> {
    properties.iter().map(|property| property.id.0).collect()
}

/// Store whose listings disappear between the scan and the page fetch.
pub(super) struct VanishingRepository {
    pub(super) inner: InMemoryPropertyStore,
    pub(super) vanished: Vec<PropertyId>,
}

impl PropertyRepository for VanishingRepository {
    fn scan(&self) -> Result<Vec<Property>, RepositoryError> {
        self.inner.scan()
    }

    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        if self.vanished.contains(&id) {
            return Ok(None);
        }
        self.inner.fetch(id)
    }

    fn fetch_many(&self, ids: &[PropertyId]) -> Result<Vec<Property>, RepositoryError> {
        let remaining: Vec<PropertyId> = ids
            .iter()
            .copied()
            .filter(|id| !self.vanished.contains(id))
            .collect();
        self.inner.fetch_many(&remaining)
    }

    fn insert(&self, id: Option<PropertyId>, property: Property) -> Result<Property, RepositoryError> {
        self.inner.insert(id, property)
    }

    fn update(&self, property: Property) -> Result<(), RepositoryError> {
        if self.vanished.contains(&property.id) {
            return Err(RepositoryError::NotFound);
        }
        self.inner.update(property)
    }

    fn delete(&self, id: PropertyId) -> Result<Property, RepositoryError> {
        self.inner.delete(id)
    }
}

pub(super) struct UnavailableRepository;

impl PropertyRepository for UnavailableRepository {
    fn scan(&self) -> Result<Vec<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch_many(&self, _ids: &[PropertyId]) -> Result<Vec<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn insert(&self, _id: Option<PropertyId>, _property: Property) -> Result<Property, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn update(&self, _property: Property) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn delete(&self, _id: PropertyId) -> Result<Property, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
