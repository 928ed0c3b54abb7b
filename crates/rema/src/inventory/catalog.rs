use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use super::repository::{PropertyRepository, RepositoryError};
use crate::valuation::{ListingKind, PropertyType};

pub const DEFAULT_FACET_TTL: Duration = Duration::from_secs(300);

/// Distinct facet values for filter menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub property_types: Vec<PropertyType>,
    pub listings: Vec<ListingKind>,
}

#[derive(Debug)]
struct CachedOptions {
    options: FilterOptions,
    computed_at: Instant,
}

/// Facet values derived from the live inventory, memoized for `ttl`.
///
/// Results may be up to `ttl` stale unless the write path calls
/// [`FilterOptionCatalog::invalidate`].
pub struct FilterOptionCatalog<R> {
    repository: Arc<R>,
    ttl: Duration,
    cache: RwLock<Option<CachedOptions>>,
}

impl<R> FilterOptionCatalog<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>, ttl: Duration) -> Self {
        Self {
            repository,
            ttl,
            cache: RwLock::new(None),
        }
    }

    pub fn options(&self) -> Result<FilterOptions, RepositoryError> {
        {
            let cache = self.cache.read().map_err(|_| poisoned())?;
            if let Some(cached) = cache.as_ref() {
                if cached.computed_at.elapsed() < self.ttl {
                    return Ok(cached.options.clone());
                }
            }
        }

        let options = self.compute()?;
        let mut cache = self.cache.write().map_err(|_| poisoned())?;
        *cache = Some(CachedOptions {
            options: options.clone(),
            computed_at: Instant::now(),
        });
        debug!(cities = options.cities.len(), "filter options recomputed");
        Ok(options)
    }

    pub fn invalidate(&self) -> Result<(), RepositoryError> {
        let mut cache = self.cache.write().map_err(|_| poisoned())?;
        *cache = None;
        Ok(())
    }

    fn compute(&self) -> Result<FilterOptions, RepositoryError> {
        let properties = self.repository.scan()?;

        // Keyed by lowercase so spelling variants collapse onto the first seen.
        let mut cities: BTreeMap<String, String> = BTreeMap::new();
        let mut property_types = BTreeSet::new();
        let mut listings = BTreeSet::new();
        for property in &properties {
            let city = property.city.trim();
            if !city.is_empty() {
                cities
                    .entry(city.to_lowercase())
                    .or_insert_with(|| city.to_string());
            }
            property_types.insert(property.property_type);
            listings.insert(property.listing);
        }

        Ok(FilterOptions {
            cities: cities.into_values().collect(),
            property_types: property_types.into_iter().collect(),
            listings: listings.into_iter().collect(),
        })
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("filter option cache lock poisoned".to_string())
}
