use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Default width of the fair band, in percent either side of the prediction.
pub const DEFAULT_THRESHOLD_PCT: f64 = 10.0;

/// Floating-point noise absorbed at the band boundaries so that a listing
/// priced at exactly `predicted * (1 + threshold)` is overvalued.
const BAND_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationCategory {
    Undervalued,
    Fair,
    Overvalued,
}

impl ValuationCategory {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Undervalued => "undervalued",
            Self::Fair => "fair",
            Self::Overvalued => "overvalued",
        }
    }
}

impl fmt::Display for ValuationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Listed price compared with the predicted price.
///
/// `percentage` is signed and unrounded: negative means the listing asks less
/// than the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationAssessment {
    pub category: ValuationCategory,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub percentage: f64,
}

impl ValuationAssessment {
    /// Discount or premium size as shown to users.
    pub fn magnitude(&self) -> f64 {
        self.percentage.abs()
    }

    pub fn display_percentage(&self) -> f64 {
        round_one_decimal(self.percentage)
    }

    pub fn is_undervalued(&self) -> bool {
        self.category == ValuationCategory::Undervalued
    }
}

/// Banding rule shared by ingestion and live estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationPolicy {
    threshold_pct: f64,
}

impl ValuationPolicy {
    pub fn new(threshold_pct: f64) -> Self {
        let sanitized = if threshold_pct.is_finite() && threshold_pct > 0.0 {
            threshold_pct
        } else {
            DEFAULT_THRESHOLD_PCT
        };

        Self {
            threshold_pct: sanitized,
        }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    /// Returns `None` when there is nothing to compare: no listed price, a
    /// listed price of zero or less, or an unusable prediction.
    pub fn classify(&self, listed_price: Option<f64>, predicted_price: f64) -> Option<ValuationAssessment> {
        let listed = listed_price.filter(|price| price.is_finite() && *price > 0.0)?;
        if !predicted_price.is_finite() || predicted_price <= 0.0 {
            return None;
        }

        let percentage = (listed - predicted_price) / predicted_price * 100.0;
        Some(ValuationAssessment {
            category: self.category_for(percentage),
            percentage,
        })
    }

    pub fn category_for(&self, percentage: f64) -> ValuationCategory {
        if percentage <= -self.threshold_pct + BAND_TOLERANCE {
            ValuationCategory::Undervalued
        } else if percentage >= self.threshold_pct - BAND_TOLERANCE {
            ValuationCategory::Overvalued
        } else {
            ValuationCategory::Fair
        }
    }
}

impl Default for ValuationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PCT)
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn serialize_one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_one_decimal(*value))
}

pub(crate) fn serialize_optional_one_decimal<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_some(&round_one_decimal(*value)),
        None => serializer.serialize_none(),
    }
}
