use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::domain::Property;
use crate::valuation::classifier::round_one_decimal;
use crate::valuation::{Bedrooms, Furnishing, ListingKind, PropertyType, ValuationCategory};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write inventory CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write inventory CSV: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: u64,
    #[serde(rename = "type")]
    property_type: PropertyType,
    furnishing: Furnishing,
    surface_area: f64,
    bedroom: Bedrooms,
    bathroom: u32,
    floor: Option<&'a str>,
    price: f64,
    currency: &'a str,
    city: &'a str,
    neighborhood: &'a str,
    listing: ListingKind,
    latitude: Option<f64>,
    longitude: Option<f64>,
    description: &'a str,
    images: String,
    created_at: String,
    predicted_price: Option<f64>,
    valuation: Option<ValuationCategory>,
    valuation_percentage: Option<f64>,
    model_version: Option<&'a str>,
}

impl<'a> ExportRow<'a> {
    fn from_property(property: &'a Property) -> Self {
        Self {
            id: property.id.0,
            property_type: property.property_type,
            furnishing: property.furnishing,
            surface_area: property.surface_area,
            bedroom: property.bedrooms,
            bathroom: property.bathrooms,
            floor: property.floor.as_deref(),
            price: property.price,
            currency: &property.currency,
            city: &property.city,
            neighborhood: &property.neighborhood,
            listing: property.listing,
            latitude: property.location.map(|point| point.latitude),
            longitude: property.location.map(|point| point.longitude),
            description: &property.description,
            images: property.images.join("|"),
            created_at: property.created_at.to_rfc3339(),
            predicted_price: property.predicted_price(),
            valuation: property.category(),
            valuation_percentage: property.valuation_percentage().map(round_one_decimal),
            model_version: property
                .valuation
                .as_ref()
                .map(|valuation| valuation.model_version.as_str()),
        }
    }
}

/// Writes listings with flattened valuation columns; the output re-imports cleanly.
pub fn write_csv<W: Write>(writer: W, properties: &[Property]) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for property in properties {
        csv_writer.serialize(ExportRow::from_property(property))?;
    }
    csv_writer.flush()?;
    Ok(properties.len())
}

pub fn write_csv_path<P: AsRef<Path>>(path: P, properties: &[Property]) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(file, properties)
}
