use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::domain::{Property, PropertyId};
use super::repository::{PropertyRepository, RepositoryError};

/// Process-local listing store keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryPropertyStore {
    records: RwLock<BTreeMap<PropertyId, Property>>,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store; a later record with a duplicate id replaces the earlier one.
    pub fn with_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        let records = properties
            .into_iter()
            .map(|property| (property.id, property))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<PropertyId, Property>>, RepositoryError> {
        self.records
            .read()
            .map_err(|_| RepositoryError::Unavailable("property store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<PropertyId, Property>>, RepositoryError> {
        self.records
            .write()
            .map_err(|_| RepositoryError::Unavailable("property store lock poisoned".to_string()))
    }
}

impl PropertyRepository for InMemoryPropertyStore {
    fn scan(&self) -> Result<Vec<Property>, RepositoryError> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn fetch(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn fetch_many(&self, ids: &[PropertyId]) -> Result<Vec<Property>, RepositoryError> {
        let records = self.read()?;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    fn insert(&self, id: Option<PropertyId>, mut property: Property) -> Result<Property, RepositoryError> {
        let mut records = self.write()?;
        let id = match id {
            Some(id) if records.contains_key(&id) => return Err(RepositoryError::Conflict),
            Some(id) => id,
            None => records
                .keys()
                .next_back()
                .map(|last| PropertyId(last.0 + 1))
                .unwrap_or(PropertyId(1)),
        };

        property.id = id;
        records.insert(id, property.clone());
        Ok(property)
    }

    fn update(&self, property: Property) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        match records.get_mut(&property.id) {
            Some(existing) => {
                *existing = property;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete(&self, id: PropertyId) -> Result<Property, RepositoryError> {
        self.write()?.remove(&id).ok_or(RepositoryError::NotFound)
    }
}
