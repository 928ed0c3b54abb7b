use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::valuation::features::{FeatureNormalizer, FeatureSet};
use crate::valuation::model::HedonicModel;
use crate::valuation::predictor::{InferenceError, PriceModel, PricePredictor};
use crate::valuation::vocabulary::{Bedrooms, Furnishing, ListingKind, PropertyType};
use crate::valuation::{ValuationEngine, ValuationPolicy};

pub(super) const BUNDLED_MODEL: &str = include_str!("../../../assets/hedonic_model.json");

/// Model returning the same estimate for every input.
pub(super) struct FixedModel(pub(super) f64);

impl PriceModel for FixedModel {
    fn version(&self) -> &str {
        "fixed-test"
    }

    fn estimate(&self, _features: &FeatureSet) -> Result<f64, InferenceError> {
        Ok(self.0)
    }
}

/// Model that cannot evaluate anything.
pub(super) struct FailingModel;

impl PriceModel for FailingModel {
    fn version(&self) -> &str {
        "failing-test"
    }

    fn estimate(&self, features: &FeatureSet) -> Result<f64, InferenceError> {
        Err(InferenceError::UnseenCategory {
            field: "city",
            value: features.city.clone(),
        })
    }
}

pub(super) fn bundled_model() -> HedonicModel {
    HedonicModel::from_json_str(BUNDLED_MODEL).expect("bundled model artifact loads")
}

/// Normalizer over the bundled model's cities.
pub(super) fn normalizer() -> FeatureNormalizer {
    FeatureNormalizer::for_model(&bundled_model())
}

pub(super) fn engine_with(model: impl PriceModel + 'static) -> ValuationEngine {
    ValuationEngine::new(
        normalizer(),
        PricePredictor::new(Arc::new(model)),
        ValuationPolicy::default(),
    )
}

pub(super) fn bundled_engine() -> ValuationEngine {
    engine_with(bundled_model())
}

pub(super) fn amman_apartment() -> FeatureSet {
    FeatureSet {
        city: "Amman".to_string(),
        neighborhood: "Khalda".to_string(),
        property_type: PropertyType::Apartment,
        listing: ListingKind::Sale,
        surface_area: 150.0,
        bedrooms: Bedrooms::Count(3),
        bathrooms: 2,
        furnishing: Furnishing::Unfurnished,
        floor: "second floor".to_string(),
    }
}

pub(super) fn calculator_payload() -> Map<String, Value> {
    object(json!({
        "city": "Amman",
        "neighborhood": "Khalda",
        "type": "apartment",
        "listing": "sale",
        "surface_area": 150,
        "bedroom": "3",
        "bathroom": 2,
        "furnishing": "unfurnished",
        "floor": "second floor",
    }))
}

pub(super) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
