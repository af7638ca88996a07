//! Read-only access to the local listing datastore.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Datastore unavailable: {0}")]
    Unavailable(String),
    #[error("Query on `{table}` failed: {message}")]
    Query { table: &'static str, message: String },
}

/// One row of the `properties` table, reduced to the searchable columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub address: Option<String>,
    pub building_name: Option<String>,
    pub property_type: Option<String>,
    pub home_type: Option<String>,
}

/// One row of the `address` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRow {
    pub street_address: Option<String>,
    pub full_address: Option<String>,
    pub unit_number: Option<String>,
    pub building_name: Option<String>,
    pub property_name: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub state: Option<String>,
}

impl AddressRow {
    /// Searchable fields in scan order, skipping empty columns.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        [
            &self.street_address,
            &self.full_address,
            &self.unit_number,
            &self.building_name,
            &self.property_name,
            &self.city,
            &self.area,
            &self.state,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter(|value| !value.is_empty())
    }
}

/// Source of locally stored listings.
///
/// Both scans return at most `limit` rows in the store's natural order. Filtering is
/// done by the caller.
pub trait PropertyStore: Send + Sync {
    fn properties(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<PropertyRow>, StoreError>> + Send;

    fn addresses(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AddressRow>, StoreError>> + Send;
}

/// A [`PropertyStore`] over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    properties: Vec<PropertyRow>,
    addresses: Vec<AddressRow>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_properties(mut self, rows: impl IntoIterator<Item = PropertyRow>) -> Self {
        self.properties.extend(rows);
        self
    }

    #[must_use]
    pub fn with_addresses(mut self, rows: impl IntoIterator<Item = AddressRow>) -> Self {
        self.addresses.extend(rows);
        self
    }

    pub fn push_property(&mut self, row: PropertyRow) {
        self.properties.push(row);
    }

    pub fn push_address(&mut self, row: AddressRow) {
        self.addresses.push(row);
    }
}

impl PropertyStore for InMemoryStore {
    async fn properties(&self, limit: usize) -> Result<Vec<PropertyRow>, StoreError> {
        Ok(self.properties.iter().take(limit).cloned().collect())
    }

    async fn addresses(&self, limit: usize) -> Result<Vec<AddressRow>, StoreError> {
        Ok(self.addresses.iter().take(limit).cloned().collect())
    }
}
