use super::features::FeatureSet;
use std::fmt;
use std::sync::Arc;

/// Opaque trained model. Implementations must be pure: identical features give
/// identical estimates.
pub trait PriceModel: Send + Sync {
    fn version(&self) -> &str;
    fn estimate(&self, features: &FeatureSet) -> Result<f64, InferenceError>;
}

/// Per-request inference failure. Never replaced by a fallback price.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("model has no encoding for {field} '{value}'")]
    UnseenCategory { field: &'static str, value: String },
    #[error("model produced a non-finite estimate ({0})")]
    NonFinite(f64),
    #[error("model produced a negative estimate ({0})")]
    Negative(f64),
    #[error("model evaluation failed: {0}")]
    Failed(String),
}

/// Guarded entry point over the model handle loaded at startup.
#[derive(Clone)]
pub struct PricePredictor {
    model: Arc<dyn PriceModel>,
}

impl fmt::Debug for PricePredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricePredictor")
            .field("model_version", &self.model.version())
            .finish()
    }
}

impl PricePredictor {
    pub fn new(model: Arc<dyn PriceModel>) -> Self {
        Self { model }
    }

    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    /// Predicted price in whole currency units. Non-finite and negative model
    /// output is rejected before it can reach classification.
    pub fn predict(&self, features: &FeatureSet) -> Result<f64, InferenceError> {
        let estimate = self.model.estimate(features)?;
        if !estimate.is_finite() {
            return Err(InferenceError::NonFinite(estimate));
        }
        if estimate < 0.0 {
            return Err(InferenceError::Negative(estimate));
        }
        Ok(estimate.round())
    }
}
