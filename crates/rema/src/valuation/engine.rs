use super::classifier::{
    serialize_optional_one_decimal, ValuationAssessment, ValuationCategory, ValuationPolicy,
};
use super::features::{value_number, FeatureNormalizer, FeatureSet, FieldError, ValidationError};
use super::model::HedonicModel;
use super::predictor::{InferenceError, PricePredictor};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Keys accepted for the optional asking price on a prediction payload.
const LISTED_PRICE_KEYS: &[&str] = &["listed_price", "user_price", "asking_price"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Normalized features plus the asking price used only for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub features: FeatureSet,
    pub listed_price: Option<f64>,
    pub defaulted: Vec<&'static str>,
}

impl PredictionRequest {
    pub fn from_payload(
        normalizer: &FeatureNormalizer,
        payload: &Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();
        let listed_price = match listed_price(payload) {
            Ok(price) => price,
            Err(error) => {
                errors.push(error);
                None
            }
        };

        match normalizer.normalize(payload) {
            Ok(normalized) if errors.is_empty() => Ok(Self {
                features: normalized.features,
                listed_price,
                defaulted: normalized.defaulted,
            }),
            Ok(_) => Err(ValidationError { fields: errors }),
            Err(mut validation) => {
                validation.fields.extend(errors);
                Err(validation)
            }
        }
    }
}

fn listed_price(payload: &Map<String, Value>) -> Result<Option<f64>, FieldError> {
    for (key, value) in payload {
        let key = key.trim().to_ascii_lowercase();
        if !LISTED_PRICE_KEYS.contains(&key.as_str()) {
            continue;
        }
        return value_number(value).map_err(|message| FieldError {
            field: "listed_price",
            message,
        });
    }
    Ok(None)
}

/// Stored valuation fields for a listing. The category and percentage only
/// exist when there was a positive listed price to compare against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyValuation {
    pub predicted_price: f64,
    pub model_version: String,
    pub assessment: Option<ValuationAssessment>,
}

impl PropertyValuation {
    pub fn category(&self) -> Option<ValuationCategory> {
        self.assessment.map(|assessment| assessment.category)
    }

    pub fn percentage(&self) -> Option<f64> {
        self.assessment.map(|assessment| assessment.percentage)
    }
}

/// Response for a live price estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub valuation: Option<ValuationCategory>,
    #[serde(serialize_with = "serialize_optional_one_decimal")]
    pub valuation_percentage: Option<f64>,
    pub confidence: Confidence,
    pub model_version: String,
    pub defaulted_fields: Vec<&'static str>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Normalizer, predictor and banding policy composed into the single
/// valuation path used by both the calculator and inventory ingestion.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    normalizer: FeatureNormalizer,
    predictor: PricePredictor,
    policy: ValuationPolicy,
}

impl ValuationEngine {
    pub fn new(normalizer: FeatureNormalizer, predictor: PricePredictor, policy: ValuationPolicy) -> Self {
        Self {
            normalizer,
            predictor,
            policy,
        }
    }

    /// Engine over `model` whose normalizer knows exactly the model's cities.
    pub fn from_model(model: HedonicModel, policy: ValuationPolicy) -> Self {
        let normalizer = FeatureNormalizer::for_model(&model);
        Self::new(normalizer, PricePredictor::new(Arc::new(model)), policy)
    }

    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> ValuationPolicy {
        self.policy
    }

    pub fn model_version(&self) -> &str {
        self.predictor.model_version()
    }

    /// Live estimate from a loose attribute payload.
    pub fn appraise(&self, payload: &Map<String, Value>) -> Result<PredictionResult, PredictionError> {
        let request = PredictionRequest::from_payload(&self.normalizer, payload)?;
        Ok(self.appraise_request(&request)?)
    }

    pub fn appraise_request(&self, request: &PredictionRequest) -> Result<PredictionResult, InferenceError> {
        let valuation = self.value_features(&request.features, request.listed_price)?;
        let confidence = confidence_for(request);

        debug!(
            predicted_price = valuation.predicted_price,
            model_version = %valuation.model_version,
            defaulted = request.defaulted.len(),
            "price estimate computed"
        );

        Ok(PredictionResult {
            predicted_price: valuation.predicted_price,
            valuation: valuation.category(),
            valuation_percentage: valuation.percentage(),
            confidence,
            model_version: valuation.model_version,
            defaulted_fields: request.defaulted.clone(),
        })
    }

    /// Prediction plus classification for already-typed features.
    ///
    /// The city goes through the same fallback as live payloads, so a stored
    /// listing and an estimate for identical attributes price identically.
    pub fn value_features(
        &self,
        features: &FeatureSet,
        listed_price: Option<f64>,
    ) -> Result<PropertyValuation, InferenceError> {
        let city = self.normalizer.model_city(&features.city);
        let predicted_price = if city == features.city {
            self.predictor.predict(features)?
        } else {
            self.predictor.predict(&FeatureSet {
                city,
                ..features.clone()
            })?
        };
        Ok(PropertyValuation {
            predicted_price,
            model_version: self.predictor.model_version().to_string(),
            assessment: self.policy.classify(listed_price, predicted_price),
        })
    }
}

fn confidence_for(request: &PredictionRequest) -> Confidence {
    let defaulted = |field: &str| request.defaulted.iter().any(|name| *name == field);
    let area = request.features.surface_area;

    if defaulted("surface_area") || request.defaulted.len() >= 4 {
        Confidence::Low
    } else if area > 50.0 && area < 500.0 && !defaulted("city") && !defaulted("type") {
        Confidence::High
    } else {
        Confidence::Medium
    }
}
