//! DocumentStore trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StorageError, StorageResult};

/// A stored entity: its fully resolved identity plus its document fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    /// Canonical reference, e.g. `cs:~joe/precise/wordpress-34`.
    pub id: String,
    pub owner: Option<String>,
    pub series: String,
    pub name: String,
    pub revision: u32,
    /// Top-level document fields (size, hash, meta, ...).
    pub fields: Map<String, Value>,
}

impl EntityDocument {
    pub fn new(
        id: impl Into<String>,
        owner: Option<String>,
        series: impl Into<String>,
        name: impl Into<String>,
        revision: u32,
    ) -> Self {
        Self {
            id: id.into(),
            owner,
            series: series.into(),
            name: name.into(),
            revision,
            fields: Map::new(),
        }
    }

    /// Adds a document field.
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Projects the document onto `fields`. An empty selection keeps every field.
    pub fn select(&self, fields: &[&str]) -> Map<String, Value> {
        if fields.is_empty() {
            return self.fields.clone();
        }
        fields
            .iter()
            .filter_map(|field| {
                self.fields
                    .get(*field)
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect()
    }
}

/// Filter for listing entities.
///
/// `owner` matches exactly, so `None` selects only unowned entities.
/// `series: None` matches every series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    pub owner: Option<String>,
    pub series: Option<String>,
    pub name: String,
}

impl EntityFilter {
    pub fn matches(&self, entity: &EntityDocument) -> bool {
        entity.name == self.name
            && entity.owner == self.owner
            && self
                .series
                .as_ref()
                .map_or(true, |series| *series == entity.series)
    }
}

/// Abstract document store interface.
///
/// Implementations must be thread-safe (Send + Sync) and support
/// async operations.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Stores a new entity.
    async fn put_entity(&self, entity: EntityDocument) -> StorageResult<()>;

    /// Reads the selected fields of the document stored under `id`.
    ///
    /// An empty `fields` slice selects the whole document.
    async fn get_document(&self, id: &str, fields: &[&str]) -> StorageResult<Map<String, Value>>;

    /// Lists entities matching the filter, highest revision first.
    async fn list_entities(&self, filter: &EntityFilter) -> StorageResult<Vec<EntityDocument>>;

    /// Number of stored entities.
    async fn count_entities(&self) -> StorageResult<usize>;

    /// Checks that the backend is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// Validates an entity before it is stored.
pub fn validate_entity(entity: &EntityDocument) -> StorageResult<()> {
    if entity.id.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: "entity id cannot be empty".to_string(),
        });
    }
    if entity.name.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "entity name cannot be empty".to_string(),
        });
    }
    if entity.series.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "entity series cannot be empty".to_string(),
        });
    }
    Ok(())
}
