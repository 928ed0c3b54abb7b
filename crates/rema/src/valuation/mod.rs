//! Feature normalization, price prediction, and valuation banding.

pub mod classifier;
pub mod engine;
pub mod features;
pub mod model;
pub mod predictor;
pub mod router;
pub mod vocabulary;

#[cfg(test)]
mod tests;

pub use classifier::{ValuationAssessment, ValuationCategory, ValuationPolicy};
pub use engine::{
    Confidence, PredictionError, PredictionRequest, PredictionResult, PropertyValuation,
    ValuationEngine,
};
pub use features::{
    FeatureNormalizer, FeatureSet, FieldError, NormalizedFeatures, NormalizerConfig,
    ValidationError,
};
pub use model::{HedonicModel, ModelLoadError};
pub use predictor::{InferenceError, PriceModel, PricePredictor};
pub use router::prediction_router;
pub use vocabulary::{Bedrooms, Furnishing, ListingKind, ModelPropertyClass, PropertyType};
