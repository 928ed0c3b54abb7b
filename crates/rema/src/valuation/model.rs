use super::features::FeatureSet;
use super::predictor::{InferenceError, PriceModel};
use super::vocabulary::{fold, ListingKind, PropertyType};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The model artifact could not be loaded; the process must not serve predictions.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model artifact {} could not be read: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {} is malformed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {} is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
struct NumericWeights {
    log_surface_area: f64,
    bedrooms: f64,
    bathrooms: f64,
    floor_level: f64,
    furnishing: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct HedonicArtifact {
    version: String,
    intercept: f64,
    weights: NumericWeights,
    property_class: HashMap<String, f64>,
    listing: HashMap<String, f64>,
    city: HashMap<String, f64>,
    #[serde(default)]
    neighborhood: HashMap<String, f64>,
}

/// Log-linear hedonic price model read from a JSON artifact.
///
/// `ln(1 + price)` is the sum of an intercept, weighted numeric features, and
/// offsets for the model property class, listing kind, city and neighborhood.
/// Cities, classes and listing kinds missing from the artifact are rejected;
/// an unknown neighborhood contributes nothing.
#[derive(Debug, Clone)]
pub struct HedonicModel {
    version: String,
    intercept: f64,
    weights: NumericWeights,
    property_class: HashMap<String, f64>,
    listing: HashMap<String, f64>,
    city: HashMap<String, f64>,
    city_names: Vec<String>,
    neighborhood: HashMap<String, f64>,
}

impl HedonicModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|source| ModelLoadError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelLoadError> {
        Self::parse(raw, PathBuf::from("<inline>"))
    }

    fn parse(raw: &str, path: PathBuf) -> Result<Self, ModelLoadError> {
        let artifact: HedonicArtifact =
            serde_json::from_str(raw).map_err(|source| ModelLoadError::Parse {
                path: path.clone(),
                source,
            })?;
        Self::from_artifact(artifact).map_err(|reason| ModelLoadError::Invalid { path, reason })
    }

    fn from_artifact(artifact: HedonicArtifact) -> Result<Self, String> {
        if artifact.version.trim().is_empty() {
            return Err("version must not be empty".to_string());
        }

        let weights = &artifact.weights;
        let numeric = [
            artifact.intercept,
            weights.log_surface_area,
            weights.bedrooms,
            weights.bathrooms,
            weights.floor_level,
            weights.furnishing,
        ];
        if numeric.iter().any(|value| !value.is_finite()) {
            return Err("intercept and weights must be finite".to_string());
        }

        let property_class = folded_offsets("property_class", artifact.property_class)?;
        for property_type in PropertyType::ordered() {
            let label = property_type.model_class().label();
            if !property_class.contains_key(label) {
                return Err(format!("property_class is missing '{label}'"));
            }
        }

        let listing = folded_offsets("listing", artifact.listing)?;
        for kind in ListingKind::ordered() {
            if !listing.contains_key(kind.key()) {
                return Err(format!("listing is missing '{}'", kind.key()));
            }
        }

        let mut city_names: Vec<String> = artifact
            .city
            .keys()
            .map(|name| name.trim().to_string())
            .collect();
        city_names.sort();
        let city = folded_offsets("city", artifact.city)?;
        if city.is_empty() {
            return Err("city offsets must not be empty".to_string());
        }
        let neighborhood = folded_offsets("neighborhood", artifact.neighborhood)?;

        Ok(Self {
            version: artifact.version,
            intercept: artifact.intercept,
            weights: artifact.weights,
            property_class,
            listing,
            city,
            city_names,
            neighborhood,
        })
    }

    /// City names the artifact carries offsets for, as spelled in the artifact.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.city_names.iter().map(String::as_str)
    }
}

fn folded_offsets(
    table: &str,
    offsets: HashMap<String, f64>,
) -> Result<HashMap<String, f64>, String> {
    offsets
        .into_iter()
        .map(|(key, value)| {
            if value.is_finite() {
                Ok((fold(&key), value))
            } else {
                Err(format!("{table} offset for '{key}' must be finite"))
            }
        })
        .collect()
}

impl PriceModel for HedonicModel {
    fn version(&self) -> &str {
        &self.version
    }

    fn estimate(&self, features: &FeatureSet) -> Result<f64, InferenceError> {
        let class = features.property_type.model_class().label();
        let class_offset =
            self.property_class
                .get(class)
                .ok_or_else(|| InferenceError::UnseenCategory {
                    field: "type",
                    value: class.to_string(),
                })?;
        let listing_offset = self.listing.get(features.listing.key()).ok_or_else(|| {
            InferenceError::UnseenCategory {
                field: "listing",
                value: features.listing.key().to_string(),
            }
        })?;
        let city_offset =
            self.city
                .get(&fold(&features.city))
                .ok_or_else(|| InferenceError::UnseenCategory {
                    field: "city",
                    value: features.city.clone(),
                })?;
        let neighborhood_offset = self
            .neighborhood
            .get(&fold(&features.neighborhood))
            .copied()
            .unwrap_or(0.0);

        let weights = &self.weights;
        let log_price = self.intercept
            + weights.log_surface_area * features.surface_area.ln_1p()
            + weights.bedrooms * features.bedrooms.model_value()
            + weights.bathrooms * f64::from(features.bathrooms)
            + weights.floor_level * features.floor_level()
            + weights.furnishing * features.furnishing.level()
            + class_offset
            + listing_offset
            + city_offset
            + neighborhood_offset;

        Ok(log_price.exp_m1())
    }
}
