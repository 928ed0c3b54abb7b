//! Listing inventory: storage, the filter / sort / paginate query pipeline,
//! facet catalog, CSV batch loading, and the write path that keeps stored
//! valuations consistent with the price model.

pub mod catalog;
pub mod domain;
pub mod engine;
pub mod export;
pub mod import;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use catalog::{FilterOptionCatalog, FilterOptions};
pub use domain::{GeoPoint, Property, PropertyDraft, PropertyId, PropertyPatch, PropertyView};
pub use engine::InventoryQueryEngine;
pub use export::{write_csv, write_csv_path, ExportError};
pub use import::{parse_drafts, ImportError, ImportSummary, InventoryImporter};
pub use query::{
    BathroomFilter, BedroomFilter, InvalidQueryError, InventoryView, Page, PropertyFilters,
    QueryLimits, QuerySpec, SortKey,
};
pub use repository::{PropertyRepository, RepositoryError};
pub use router::inventory_router;
pub use service::{
    Comparison, ComparisonEntry, InventoryService, InventoryServiceError, InventorySettings,
    InventoryStats, RevaluationSummary,
};
pub use store::InMemoryPropertyStore;
