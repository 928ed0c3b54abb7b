use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::valuation::classifier::serialize_optional_one_decimal;
use crate::valuation::features::{
    DEFAULT_BATHROOMS, DEFAULT_BEDROOMS, DEFAULT_FLOOR, DEFAULT_NEIGHBORHOOD,
};
use crate::valuation::{
    Bedrooms, FeatureSet, Furnishing, ListingKind, PropertyType, PropertyValuation,
    ValuationCategory,
};

/// Store-assigned listing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Canonical listing record.
///
/// The valuation is `None` until the listing has been run through the
/// valuation engine, or when the model could not price it.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: PropertyId,
    pub city: String,
    pub neighborhood: String,
    pub property_type: PropertyType,
    pub listing: ListingKind,
    pub surface_area: f64,
    pub bedrooms: Bedrooms,
    pub bathrooms: u32,
    pub furnishing: Furnishing,
    pub floor: Option<String>,
    pub price: f64,
    pub currency: String,
    pub location: Option<GeoPoint>,
    pub description: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub valuation: Option<PropertyValuation>,
}

impl Property {
    /// Model inputs for this listing. Stored records are already typed; only a
    /// blank neighborhood or floor is defaulted here, and the engine applies
    /// its usual city fallback.
    pub fn features(&self) -> FeatureSet {
        let neighborhood = if self.neighborhood.trim().is_empty() {
            DEFAULT_NEIGHBORHOOD.to_string()
        } else {
            self.neighborhood.clone()
        };

        FeatureSet {
            city: self.city.clone(),
            neighborhood,
            property_type: self.property_type,
            listing: self.listing,
            surface_area: self.surface_area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            furnishing: self.furnishing,
            floor: self
                .floor
                .clone()
                .unwrap_or_else(|| DEFAULT_FLOOR.to_string()),
        }
    }

    pub fn listed_price(&self) -> Option<f64> {
        (self.price > 0.0).then_some(self.price)
    }

    pub fn predicted_price(&self) -> Option<f64> {
        self.valuation.as_ref().map(|valuation| valuation.predicted_price)
    }

    pub fn category(&self) -> Option<ValuationCategory> {
        self.valuation.as_ref().and_then(PropertyValuation::category)
    }

    pub fn valuation_percentage(&self) -> Option<f64> {
        self.valuation.as_ref().and_then(PropertyValuation::percentage)
    }

    pub fn is_undervalued(&self) -> bool {
        self.category() == Some(ValuationCategory::Undervalued)
    }

    pub fn price_per_sqm(&self) -> Option<f64> {
        (self.price > 0.0 && self.surface_area > 0.0).then(|| self.price / self.surface_area)
    }

    pub fn view(&self) -> PropertyView<'_> {
        PropertyView {
            id: self.id,
            city: &self.city,
            neighborhood: &self.neighborhood,
            property_type: self.property_type,
            listing: self.listing,
            surface_area: self.surface_area,
            bedroom: self.bedrooms,
            bathroom: self.bathrooms,
            furnishing: self.furnishing,
            floor: self.floor.as_deref(),
            price: self.price,
            currency: &self.currency,
            latitude: self.location.map(|point| point.latitude),
            longitude: self.location.map(|point| point.longitude),
            description: &self.description,
            images: &self.images,
            created_at: self.created_at,
            predicted_price: self.predicted_price(),
            valuation: self.category(),
            valuation_percentage: self.valuation_percentage(),
            model_version: self
                .valuation
                .as_ref()
                .map(|valuation| valuation.model_version.as_str()),
        }
    }
}

/// Wire representation with the valuation flattened into nullable fields.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyView<'a> {
    pub id: PropertyId,
    pub city: &'a str,
    pub neighborhood: &'a str,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub listing: ListingKind,
    pub surface_area: f64,
    pub bedroom: Bedrooms,
    pub bathroom: u32,
    pub furnishing: Furnishing,
    pub floor: Option<&'a str>,
    pub price: f64,
    pub currency: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: &'a str,
    pub images: &'a [String],
    pub created_at: DateTime<Utc>,
    pub predicted_price: Option<f64>,
    pub valuation: Option<ValuationCategory>,
    #[serde(serialize_with = "serialize_optional_one_decimal")]
    pub valuation_percentage: Option<f64>,
    pub model_version: Option<&'a str>,
}

/// Listing attributes supplied on create or import. The id and timestamp are
/// assigned by the store and clock when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyDraft {
    #[serde(default)]
    pub id: Option<PropertyId>,
    pub city: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default = "default_listing")]
    pub listing: ListingKind,
    pub surface_area: f64,
    #[serde(rename = "bedroom", default = "default_bedrooms")]
    pub bedrooms: Bedrooms,
    #[serde(rename = "bathroom", default = "default_bathrooms")]
    pub bathrooms: u32,
    #[serde(default = "default_furnishing")]
    pub furnishing: Furnishing,
    #[serde(default)]
    pub floor: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_listing() -> ListingKind {
    ListingKind::Sale
}

fn default_bedrooms() -> Bedrooms {
    DEFAULT_BEDROOMS
}

fn default_bathrooms() -> u32 {
    DEFAULT_BATHROOMS
}

fn default_furnishing() -> Furnishing {
    Furnishing::Unfurnished
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing: Option<ListingKind>,
    pub surface_area: Option<f64>,
    pub bedrooms: Option<Bedrooms>,
    pub bathrooms: Option<u32>,
    pub furnishing: Option<Furnishing>,
    pub floor: Option<String>,
    pub price: Option<f64>,
    pub location: Option<GeoPoint>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

impl PropertyPatch {
    /// True when the patch touches the price or any model input.
    pub fn affects_valuation(&self) -> bool {
        self.price.is_some()
            || self.city.is_some()
            || self.neighborhood.is_some()
            || self.property_type.is_some()
            || self.listing.is_some()
            || self.surface_area.is_some()
            || self.bedrooms.is_some()
            || self.bathrooms.is_some()
            || self.furnishing.is_some()
            || self.floor.is_some()
    }

    pub(crate) fn apply(self, property: &mut Property) {
        if let Some(city) = self.city {
            property.city = city;
        }
        if let Some(neighborhood) = self.neighborhood {
            property.neighborhood = neighborhood;
        }
        if let Some(property_type) = self.property_type {
            property.property_type = property_type;
        }
        if let Some(listing) = self.listing {
            property.listing = listing;
        }
        if let Some(surface_area) = self.surface_area {
            property.surface_area = surface_area;
        }
        if let Some(bedrooms) = self.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            property.bathrooms = bathrooms;
        }
        if let Some(furnishing) = self.furnishing {
            property.furnishing = furnishing;
        }
        if let Some(floor) = self.floor {
            property.floor = Some(floor);
        }
        if let Some(price) = self.price {
            property.price = price;
        }
        if let Some(location) = self.location {
            property.location = Some(location);
        }
        if let Some(description) = self.description {
            property.description = description;
        }
        if let Some(images) = self.images {
            property.images = images;
        }
    }
}
