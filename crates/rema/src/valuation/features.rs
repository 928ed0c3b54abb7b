use super::model::HedonicModel;
use super::vocabulary::{fold, Bedrooms, Furnishing, ListingKind, PropertyType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DEFAULT_CITY: &str = "Amman";
pub const DEFAULT_NEIGHBORHOOD: &str = "Unknown";
pub const DEFAULT_FLOOR: &str = "first floor";
pub const DEFAULT_SURFACE_AREA: f64 = 100.0;
pub const DEFAULT_BEDROOMS: Bedrooms = Bedrooms::Count(1);
pub const DEFAULT_BATHROOMS: u32 = 1;

/// Strictly typed attribute record consumed by the price model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub city: String,
    pub neighborhood: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub listing: ListingKind,
    pub surface_area: f64,
    #[serde(rename = "bedroom")]
    pub bedrooms: Bedrooms,
    #[serde(rename = "bathroom")]
    pub bathrooms: u32,
    pub furnishing: Furnishing,
    pub floor: String,
}

impl FeatureSet {
    /// Numeric floor level parsed from the free-text floor description.
    pub fn floor_level(&self) -> f64 {
        floor_level(&self.floor)
    }
}

pub(crate) fn floor_level(raw: &str) -> f64 {
    const ORDINALS: &[(&str, f64)] = &[
        ("first", 1.0),
        ("second", 2.0),
        ("third", 3.0),
        ("fourth", 4.0),
        ("fifth", 5.0),
        ("sixth", 6.0),
        ("seventh", 7.0),
        ("eighth", 8.0),
        ("ninth", 9.0),
        ("tenth", 10.0),
    ];

    let value = raw.to_lowercase();
    if value.contains("basement") {
        return -1.0;
    }
    if value.contains("ground") && value.contains("semi") {
        return 0.5;
    }
    if value.contains("ground") {
        return 0.0;
    }

    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if let Ok(level) = digits.parse::<f64>() {
        return level;
    }

    ORDINALS
        .iter()
        .find(|(word, _)| value.split_whitespace().any(|token| token == *word))
        .map(|(_, level)| *level)
        .unwrap_or(0.0)
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Input could not be turned into a usable record; lists every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|error| error.field).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .fields
            .iter()
            .map(|error| format!("{} {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {details}")
    }
}

impl std::error::Error for ValidationError {}

/// Defaults and vocabulary applied by [`FeatureNormalizer`].
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub default_city: String,
    pub known_cities: BTreeSet<String>,
}

impl NormalizerConfig {
    /// Falls back to Amman for any city outside `cities`.
    pub fn with_cities<I, S>(cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            known_cities: cities.into_iter().map(Into::into).collect(),
        }
    }
}

/// Output of normalization, including which fields fell back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatures {
    pub features: FeatureSet,
    pub defaulted: Vec<&'static str>,
}

impl NormalizedFeatures {
    pub fn was_defaulted(&self, field: &str) -> bool {
        self.defaulted.iter().any(|name| *name == field)
    }
}

/// Turns a loose attribute bag into a [`FeatureSet`].
///
/// Missing or unrecognized categorical values fall back to defaults instead of
/// failing, so partially filled calculator forms still get an estimate. Only
/// values that cannot be read at all (non-numeric areas, negative counts,
/// unreadable bedroom counts) are rejected.
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    config: NormalizerConfig,
}

impl FeatureNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalizer whose city vocabulary is exactly the cities `model` can price.
    pub fn for_model(model: &HedonicModel) -> Self {
        Self::new(NormalizerConfig::with_cities(model.cities()))
    }

    /// City the model will be asked about: the known spelling of `raw`, or the default city.
    pub fn model_city(&self, raw: &str) -> String {
        self.known_city(raw)
            .unwrap_or_else(|| self.config.default_city.clone())
    }

    pub fn normalize(&self, raw: &Map<String, Value>) -> Result<NormalizedFeatures, ValidationError> {
        let values = canonical_values(raw);
        let mut errors = Vec::new();
        let mut defaulted = Vec::new();

        let city = match values.get("city").and_then(|value| value_text(value)) {
            Some(text) => match self.known_city(&text) {
                Some(city) => city,
                None => {
                    defaulted.push("city");
                    self.config.default_city.clone()
                }
            },
            None => {
                defaulted.push("city");
                self.config.default_city.clone()
            }
        };

        let neighborhood = match values.get("neighborhood").and_then(|value| value_text(value)) {
            Some(text) => title_case(&text),
            None => {
                defaulted.push("neighborhood");
                DEFAULT_NEIGHBORHOOD.to_string()
            }
        };

        let property_type = values
            .get("type")
            .and_then(|value| value_text(value))
            .and_then(|text| PropertyType::parse(&text))
            .unwrap_or_else(|| {
                defaulted.push("type");
                PropertyType::Apartment
            });

        let listing = values
            .get("listing")
            .and_then(|value| value_text(value))
            .and_then(|text| ListingKind::parse(&text))
            .unwrap_or_else(|| {
                defaulted.push("listing");
                ListingKind::Sale
            });

        let furnishing = values
            .get("furnishing")
            .and_then(|value| value_text(value))
            .and_then(|text| Furnishing::parse(&text))
            .unwrap_or_else(|| {
                defaulted.push("furnishing");
                Furnishing::Unfurnished
            });

        let floor = match values.get("floor").and_then(|value| value_text(value)) {
            Some(text) => text,
            None => {
                defaulted.push("floor");
                DEFAULT_FLOOR.to_string()
            }
        };

        let surface_area = match values.get("surface_area").map(|value| value_number(value)) {
            Some(Ok(Some(area))) if area >= 0.0 => area,
            Some(Ok(Some(_))) => {
                errors.push(field_error("surface_area", "must be non-negative"));
                DEFAULT_SURFACE_AREA
            }
            Some(Err(message)) => {
                errors.push(field_error("surface_area", message));
                DEFAULT_SURFACE_AREA
            }
            Some(Ok(None)) | None => {
                defaulted.push("surface_area");
                DEFAULT_SURFACE_AREA
            }
        };

        let bathrooms = match values.get("bathroom").map(|value| value_number(value)) {
            Some(Ok(Some(count))) if count < 0.0 => {
                errors.push(field_error("bathroom", "must be non-negative"));
                DEFAULT_BATHROOMS
            }
            Some(Ok(Some(count))) if count.fract() != 0.0 || count > f64::from(u32::MAX) => {
                errors.push(field_error("bathroom", "must be a whole number"));
                DEFAULT_BATHROOMS
            }
            Some(Ok(Some(count))) => count as u32,
            Some(Err(message)) => {
                errors.push(field_error("bathroom", message));
                DEFAULT_BATHROOMS
            }
            Some(Ok(None)) | None => {
                defaulted.push("bathroom");
                DEFAULT_BATHROOMS
            }
        };

        let bedrooms = match values.get("bedroom").map(|value| bedroom_value(value)) {
            Some(Ok(Some(bedrooms))) => bedrooms,
            Some(Err(message)) => {
                errors.push(field_error("bedroom", message));
                DEFAULT_BEDROOMS
            }
            Some(Ok(None)) | None => {
                defaulted.push("bedroom");
                DEFAULT_BEDROOMS
            }
        };

        if !errors.is_empty() {
            return Err(ValidationError { fields: errors });
        }

        Ok(NormalizedFeatures {
            features: FeatureSet {
                city,
                neighborhood,
                property_type,
                listing,
                surface_area,
                bedrooms,
                bathrooms,
                furnishing,
                floor,
            },
            defaulted,
        })
    }

    fn known_city(&self, raw: &str) -> Option<String> {
        let wanted = title_case(raw).to_lowercase();
        self.config
            .known_cities
            .iter()
            .find(|city| city.to_lowercase() == wanted)
            .cloned()
    }
}

/// Maps incoming keys onto the canonical schema; the first non-empty alias wins.
fn canonical_values(raw: &Map<String, Value>) -> BTreeMap<&'static str, &Value> {
    let mut values = BTreeMap::new();
    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        if let Some(canonical) = canonical_key(key) {
            values.entry(canonical).or_insert(value);
        }
    }
    values
}

pub(crate) fn canonical_key(raw: &str) -> Option<&'static str> {
    let key = fold(raw).replace(' ', "_");
    let canonical = match key.as_str() {
        "city" => "city",
        "neighborhood" | "neighbourhood" | "district" | "area_name" => "neighborhood",
        "type" | "property_type" | "kind" => "type",
        "listing" | "listing_type" | "listing_kind" => "listing",
        "surface_area" | "area" | "size" | "sqm" | "surface" => "surface_area",
        "bedroom" | "bedrooms" | "beds" => "bedroom",
        "bathroom" | "bathrooms" | "baths" => "bathroom",
        "furnishing" | "furnished" => "furnishing",
        "floor" => "floor",
        _ => return None,
    };
    Some(canonical)
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Reads a number from a JSON number or a numeric string; blank strings count as absent.
pub(crate) fn value_number(value: &Value) -> Result<Option<f64>, String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim().replace(',', "");
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(number) => Some(number),
                Err(_) => return Err(format!("'{}' is not a number", text.trim())),
            }
        }
        Value::Null => return Ok(None),
        other => return Err(format!("expected a number, found {other}")),
    };

    match number {
        Some(number) if number.is_finite() => Ok(Some(number)),
        _ => Err("must be a finite number".to_string()),
    }
}

fn bedroom_value(value: &Value) -> Result<Option<Bedrooms>, String> {
    match value {
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Bedrooms::parse(text)
            .map(Some)
            .ok_or_else(|| format!("'{}' must be a whole number or 'studio'", text.trim())),
        Value::Number(_) => match value_number(value)? {
            Some(count) if count >= 0.0 && count.fract() == 0.0 && count <= f64::from(u32::MAX) => {
                Ok(Some(Bedrooms::Count(count as u32)))
            }
            _ => Err("must be a whole number or 'studio'".to_string()),
        },
        other => Err(format!("expected a number or 'studio', found {other}")),
    }
}

fn field_error(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}

/// Capitalizes the first letter of every word and hyphenated part; `ma'an` stays `Ma'an`.
pub(crate) fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut capitalize = true;
    for word_char in value.split_whitespace().collect::<Vec<_>>().join(" ").chars() {
        if capitalize {
            output.extend(word_char.to_uppercase());
        } else {
            output.extend(word_char.to_lowercase());
        }
        capitalize = word_char == ' ' || word_char == '-';
    }
    output
}
