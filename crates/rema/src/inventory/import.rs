use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use super::domain::{GeoPoint, PropertyDraft, PropertyId};
use super::repository::{PropertyRepository, RepositoryError};
use super::service::{InventoryService, InventoryServiceError};
use crate::valuation::features::{title_case, DEFAULT_BATHROOMS, DEFAULT_BEDROOMS};
use crate::valuation::{Bedrooms, Furnishing, ListingKind, PropertyType};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Repository(RepositoryError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read inventory file: {}", err),
            ImportError::Csv(err) => write!(f, "invalid inventory CSV data: {}", err),
            ImportError::Repository(err) => {
                write!(f, "could not store imported listings: {}", err)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Repository(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

/// Counts reported after a batch load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    /// Imported listings the model could not price.
    pub unvalued: usize,
}

/// Batch loader for listing CSV exports.
pub struct InventoryImporter;

impl InventoryImporter {
    pub fn from_path<P, R>(path: P, service: &InventoryService<R>) -> Result<ImportSummary, ImportError>
    where
        P: AsRef<Path>,
        R: PropertyRepository + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service)
    }

    /// Values and stores every usable row. Unusable rows and duplicate ids
    /// are skipped and counted rather than aborting the load.
    pub fn from_reader<Rd, R>(reader: Rd, service: &InventoryService<R>) -> Result<ImportSummary, ImportError>
    where
        Rd: Read,
        R: PropertyRepository + 'static,
    {
        let (drafts, skipped) = parse_drafts(reader)?;
        let mut summary = ImportSummary {
            skipped,
            ..ImportSummary::default()
        };

        for draft in drafts {
            let id = draft.id;
            match service.create(draft) {
                Ok(property) => {
                    summary.imported += 1;
                    if property.valuation.is_none() {
                        summary.unvalued += 1;
                    }
                }
                Err(InventoryServiceError::Repository(RepositoryError::Unavailable(reason))) => {
                    return Err(RepositoryError::Unavailable(reason).into());
                }
                Err(error) => {
                    warn!(property_id = ?id.map(|id| id.0), %error, "skipping listing");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            unvalued = summary.unvalued,
            "inventory imported"
        );
        Ok(summary)
    }
}

/// Parses rows into drafts, returning them with the number of rows skipped.
pub fn parse_drafts<R: Read>(reader: R) -> Result<(Vec<PropertyDraft>, usize), ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut drafts = Vec::new();
    let mut skipped = 0;

    for (index, record) in csv_reader.deserialize::<ListingRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = match record {
            Ok(row) => row,
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                warn!(line, %error, "skipping unreadable row");
                skipped += 1;
                continue;
            }
        };

        match row.into_draft() {
            Ok(draft) => drafts.push(draft),
            Err(reason) => {
                warn!(line, %reason, "skipping row");
                skipped += 1;
            }
        }
    }

    Ok((drafts, skipped))
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    furnishing: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    surface_area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bedroom: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    bathroom: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    floor: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    neighborhood: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    listing: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    latitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    longitude: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    images: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl ListingRow {
    fn into_draft(self) -> Result<PropertyDraft, String> {
        let id = match self.id.as_deref() {
            Some(raw) => Some(PropertyId(
                raw.parse::<u64>()
                    .map_err(|_| format!("id '{raw}' is not a positive integer"))?,
            )),
            None => None,
        };

        let city = self
            .city
            .as_deref()
            .map(title_case)
            .ok_or_else(|| "city is missing".to_string())?;
        let raw_type = self
            .property_type
            .as_deref()
            .ok_or_else(|| "type is missing".to_string())?;
        let property_type = PropertyType::parse(raw_type)
            .ok_or_else(|| format!("type '{raw_type}' is not recognized"))?;

        let surface_area = match self.surface_area.as_deref().map(parse_number) {
            Some(Some(area)) if area > 0.0 => area,
            _ => return Err("surface_area must be a positive number".to_string()),
        };
        let price = match self.price.as_deref().map(parse_number) {
            Some(Some(price)) if price >= 0.0 => price,
            _ => return Err("price is missing or not a number".to_string()),
        };

        let bedrooms = match self.bedroom.as_deref() {
            Some(raw) => {
                Bedrooms::parse(raw).ok_or_else(|| format!("bedroom '{raw}' is not readable"))?
            }
            None => DEFAULT_BEDROOMS,
        };
        let bathrooms = match self.bathroom.as_deref().map(parse_number) {
            Some(Some(count)) if count >= 0.0 && count.fract() == 0.0 => count as u32,
            Some(_) => return Err("bathroom must be a whole non-negative number".to_string()),
            None => DEFAULT_BATHROOMS,
        };

        let listing = self
            .listing
            .as_deref()
            .and_then(ListingKind::parse)
            .unwrap_or(ListingKind::Sale);
        let furnishing = self
            .furnishing
            .as_deref()
            .and_then(Furnishing::parse)
            .unwrap_or(Furnishing::Unfurnished);

        let location = match (
            self.latitude.as_deref().and_then(parse_number),
            self.longitude.as_deref().and_then(parse_number),
        ) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        let images = self
            .images
            .as_deref()
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|image| !image.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(PropertyDraft {
            id,
            city,
            neighborhood: self.neighborhood.as_deref().map(title_case).unwrap_or_default(),
            property_type,
            listing,
            surface_area,
            bedrooms,
            bathrooms,
            furnishing,
            floor: self.floor,
            price,
            location,
            description: self.description.unwrap_or_default(),
            images,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}
