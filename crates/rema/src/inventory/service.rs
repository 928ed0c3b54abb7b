use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::catalog::{FilterOptionCatalog, FilterOptions, DEFAULT_FACET_TTL};
use super::domain::{Property, PropertyDraft, PropertyId, PropertyPatch, PropertyView};
use super::engine::InventoryQueryEngine;
use super::query::{InvalidQueryError, Page, QueryLimits, QuerySpec};
use super::repository::{PropertyRepository, RepositoryError};
use crate::config::InventoryConfig;
use crate::valuation::{
    FieldError, ListingKind, PropertyValuation, ValidationError, ValuationCategory,
    ValuationEngine,
};

pub const DEFAULT_SIMILAR_LIMIT: usize = 3;
pub const MAX_SIMILAR_LIMIT: usize = 10;
const SIMILAR_PRICE_BAND: (f64, f64) = (0.5, 1.5);

/// Deployment-level inventory settings.
#[derive(Debug, Clone)]
pub struct InventorySettings {
    pub currency: String,
    pub limits: QueryLimits,
    pub facet_cache_ttl: Duration,
}

impl InventorySettings {
    pub fn from_config(config: &InventoryConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            limits: QueryLimits::new(config.default_page_size, config.max_page_size),
            facet_cache_ttl: config.facet_cache_ttl,
        }
    }
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            currency: "JOD".to_string(),
            limits: QueryLimits::default(),
            facet_cache_ttl: DEFAULT_FACET_TTL,
        }
    }
}

/// Listing counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total: usize,
    pub for_sale: usize,
    pub for_rent: usize,
    pub valued: usize,
    pub undervalued: usize,
    pub fair: usize,
    pub overvalued: usize,
}

/// One listing in a side-by-side comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    pub property: Property,
    pub price_per_sqm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub entries: Vec<ComparisonEntry>,
    /// Listing with the lowest positive price per square meter.
    pub best_value: Option<PropertyId>,
}

impl Comparison {
    pub fn view(&self) -> ComparisonView<'_> {
        ComparisonView {
            properties: self
                .entries
                .iter()
                .map(|entry| ComparisonEntryView {
                    property: entry.property.view(),
                    price_per_sqm: entry.price_per_sqm.map(f64::round),
                })
                .collect(),
            best_value: self.best_value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView<'a> {
    pub properties: Vec<ComparisonEntryView<'a>>,
    pub best_value: Option<PropertyId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntryView<'a> {
    #[serde(flatten)]
    pub property: PropertyView<'a>,
    pub price_per_sqm: Option<f64>,
}

/// Outcome of recomputing every stored valuation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevaluationSummary {
    /// Listings valued and written back.
    pub updated: usize,
    /// Listings the model could not price; their stale valuation was removed.
    pub cleared: usize,
    /// Listings that could not be written back, usually because they were deleted mid-run.
    pub failed: usize,
}

/// Service composing the repository, query engine, facet catalog and valuation engine.
pub struct InventoryService<R> {
    repository: Arc<R>,
    valuation: Arc<ValuationEngine>,
    queries: InventoryQueryEngine<R>,
    catalog: FilterOptionCatalog<R>,
    settings: InventorySettings,
}

impl<R> InventoryService<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>, valuation: Arc<ValuationEngine>, settings: InventorySettings) -> Self {
        let queries = InventoryQueryEngine::new(repository.clone());
        let catalog = FilterOptionCatalog::new(repository.clone(), settings.facet_cache_ttl);
        Self {
            repository,
            valuation,
            queries,
            catalog,
            settings,
        }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.settings.limits
    }

    pub fn valuation_engine(&self) -> &ValuationEngine {
        &self.valuation
    }

    pub fn get(&self, id: PropertyId) -> Result<Property, InventoryServiceError> {
        let property = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(property)
    }

    pub fn all(&self) -> Result<Vec<Property>, InventoryServiceError> {
        Ok(self.repository.scan()?)
    }

    pub fn list_properties(&self, spec: &QuerySpec) -> Result<Page<Property>, InventoryServiceError> {
        self.check_paging(spec)?;
        Ok(self.queries.resolve(spec)?)
    }

    /// Undervalued listings ranked by discount, whatever view `spec` was built for.
    pub fn list_opportunities(&self, spec: &QuerySpec) -> Result<Page<Property>, InventoryServiceError> {
        let spec = spec.clone().into_opportunities();
        self.check_paging(&spec)?;
        Ok(self.queries.resolve(&spec)?)
    }

    fn check_paging(&self, spec: &QuerySpec) -> Result<(), InvalidQueryError> {
        if spec.page == 0 {
            return Err(InvalidQueryError::new("page", "must be at least 1"));
        }
        if spec.page_size == 0 || spec.page_size > self.settings.limits.max_page_size {
            return Err(InvalidQueryError::new(
                "page_size",
                format!("must be between 1 and {}", self.settings.limits.max_page_size),
            ));
        }
        Ok(())
    }

    /// Listings in the same city, preferring the same type, closest in price.
    pub fn similar(&self, id: PropertyId, limit: usize) -> Result<Vec<Property>, InventoryServiceError> {
        if !(1..=MAX_SIMILAR_LIMIT).contains(&limit) {
            return Err(InvalidQueryError::new(
                "limit",
                format!("must be between 1 and {MAX_SIMILAR_LIMIT}"),
            )
            .into());
        }

        let source = self.get(id)?;
        let mut candidates: Vec<Property> = self
            .repository
            .scan()?
            .into_iter()
            .filter(|candidate| candidate.id != source.id)
            .filter(|candidate| candidate.city.trim().eq_ignore_ascii_case(source.city.trim()))
            .collect();

        let same_type = candidates
            .iter()
            .filter(|candidate| candidate.property_type == source.property_type)
            .count();
        if same_type >= limit {
            candidates.retain(|candidate| candidate.property_type == source.property_type);
        }

        match source.listed_price() {
            Some(price) => {
                let (low, high) = (price * SIMILAR_PRICE_BAND.0, price * SIMILAR_PRICE_BAND.1);
                candidates.retain(|candidate| candidate.price >= low && candidate.price <= high);
                candidates.sort_by(|left, right| {
                    (left.price - price)
                        .abs()
                        .total_cmp(&(right.price - price).abs())
                        .then(left.id.cmp(&right.id))
                });
            }
            None => candidates.sort_by_key(|candidate| candidate.id),
        }

        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Side-by-side view of 2 or 3 distinct listings; repeated ids count once.
    pub fn compare(&self, ids: &[PropertyId]) -> Result<Comparison, InventoryServiceError> {
        let mut distinct: Vec<PropertyId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !distinct.contains(id) {
                distinct.push(*id);
            }
        }
        if !(2..=3).contains(&distinct.len()) {
            return Err(InvalidQueryError::new("ids", "compare takes 2 or 3 property ids").into());
        }

        let mut entries = Vec::with_capacity(distinct.len());
        for id in distinct {
            if let Some(property) = self.repository.fetch(id)? {
                let price_per_sqm = property.price_per_sqm();
                entries.push(ComparisonEntry {
                    property,
                    price_per_sqm,
                });
            }
        }

        if entries.len() < 2 {
            return Err(InvalidQueryError::new(
                "ids",
                "fewer than two of the requested properties exist",
            )
            .into());
        }

        let best_value = entries
            .iter()
            .filter_map(|entry| entry.price_per_sqm.map(|value| (entry.property.id, value)))
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(id, _)| id);

        Ok(Comparison {
            entries,
            best_value,
        })
    }

    pub fn stats(&self) -> Result<InventoryStats, InventoryServiceError> {
        let mut stats = InventoryStats::default();
        for property in self.repository.scan()? {
            stats.total += 1;
            match property.listing {
                ListingKind::Sale => stats.for_sale += 1,
                ListingKind::Rent => stats.for_rent += 1,
            }
            if let Some(category) = property.category() {
                stats.valued += 1;
                match category {
                    ValuationCategory::Undervalued => stats.undervalued += 1,
                    ValuationCategory::Fair => stats.fair += 1,
                    ValuationCategory::Overvalued => stats.overvalued += 1,
                }
            }
        }
        Ok(stats)
    }

    pub fn filter_options(&self) -> Result<FilterOptions, InventoryServiceError> {
        Ok(self.catalog.options()?)
    }

    /// Validates, values and stores a new listing.
    pub fn create(&self, draft: PropertyDraft) -> Result<Property, InventoryServiceError> {
        let id = draft.id;
        let mut property = Property {
            id: id.unwrap_or(PropertyId(0)),
            city: draft.city.trim().to_string(),
            neighborhood: draft.neighborhood.trim().to_string(),
            property_type: draft.property_type,
            listing: draft.listing,
            surface_area: draft.surface_area,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            furnishing: draft.furnishing,
            floor: draft.floor.filter(|floor| !floor.trim().is_empty()),
            price: draft.price,
            currency: self.settings.currency.clone(),
            location: draft.location,
            description: draft.description,
            images: draft.images,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
            valuation: None,
        };
        validate_property(&property)?;
        property.valuation = self.appraise(&property);

        let stored = self.repository.insert(id, property)?;
        self.catalog.invalidate()?;
        Ok(stored)
    }

    /// Applies `patch`, recomputing the valuation when price or a model input changed.
    pub fn update(&self, id: PropertyId, patch: PropertyPatch) -> Result<Property, InventoryServiceError> {
        let mut property = self.get(id)?;
        let revalue = patch.affects_valuation();
        patch.apply(&mut property);
        validate_property(&property)?;

        if revalue {
            property.valuation = self.appraise(&property);
        }

        self.repository.update(property.clone())?;
        self.catalog.invalidate()?;
        Ok(property)
    }

    pub fn delete(&self, id: PropertyId) -> Result<Property, InventoryServiceError> {
        let removed = self.repository.delete(id)?;
        self.catalog.invalidate()?;
        info!(property_id = %id, "property deleted");
        Ok(removed)
    }

    /// Recomputes every stored valuation with the current model.
    pub fn revalue_all(&self) -> Result<RevaluationSummary, InventoryServiceError> {
        let mut summary = RevaluationSummary::default();
        for mut property in self.repository.scan()? {
            property.valuation = self.appraise(&property);
            let valued = property.valuation.is_some();
            let id = property.id;

            match self.repository.update(property) {
                Ok(()) if valued => summary.updated += 1,
                Ok(()) => summary.cleared += 1,
                Err(RepositoryError::NotFound) => {
                    warn!(property_id = %id, "property vanished during revaluation");
                    summary.failed += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }

        info!(
            updated = summary.updated,
            cleared = summary.cleared,
            failed = summary.failed,
            "inventory revalued"
        );
        Ok(summary)
    }

    /// Values a stored listing. Inference failures leave the valuation empty.
    fn appraise(&self, property: &Property) -> Option<PropertyValuation> {
        match self
            .valuation
            .value_features(&property.features(), property.listed_price())
        {
            Ok(valuation) => Some(valuation),
            Err(error) => {
                warn!(property_id = %property.id, %error, "listing could not be valued");
                None
            }
        }
    }
}

fn validate_property(property: &Property) -> Result<(), ValidationError> {
    let mut fields = Vec::new();
    if property.city.trim().is_empty() {
        fields.push(("city", "must not be empty"));
    }
    if !property.surface_area.is_finite() || property.surface_area <= 0.0 {
        fields.push(("surface_area", "must be a positive number"));
    }
    if !property.price.is_finite() || property.price < 0.0 {
        fields.push(("price", "must be a non-negative number"));
    }
    into_validation(fields)
}

fn into_validation(fields: Vec<(&'static str, &str)>) -> Result<(), ValidationError> {
    if fields.is_empty() {
        return Ok(());
    }
    Err(ValidationError {
        fields: fields
            .into_iter()
            .map(|(field, message)| FieldError {
                field,
                message: message.to_string(),
            })
            .collect(),
    })
}

/// Error raised by the inventory service.
#[derive(Debug, thiserror::Error)]
pub enum InventoryServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidQuery(#[from] InvalidQueryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
