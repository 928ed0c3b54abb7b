use super::domain::{Property, PropertyId};

/// Storage abstraction so the query engine and service can be exercised in isolation.
pub trait PropertyRepository: Send + Sync {
    /// Snapshot of every stored listing, in id order.
    fn scan(&self) -> Result<Vec<Property>, RepositoryError>;
    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// Listings for `ids` in the order given. Ids that no longer exist are skipped.
    fn fetch_many(&self, ids: &[PropertyId]) -> Result<Vec<Property>, RepositoryError>;
    /// Stores `property` under `id`, or under the next free id when `id` is
    /// `None`. The record's own id field is overwritten with the stored id.
    fn insert(&self, id: Option<PropertyId>, property: Property) -> Result<Property, RepositoryError>;
    fn update(&self, property: Property) -> Result<(), RepositoryError>;
    fn delete(&self, id: PropertyId) -> Result<Property, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
