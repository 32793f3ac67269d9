//! In-memory storage implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_entity, DocumentStore, EntityDocument, EntityFilter};

/// In-memory implementation of DocumentStore.
///
/// # Performance Characteristics
///
/// - **Put / get**: O(1) average (DashMap lookup)
/// - **List**: O(N) over all stored entities
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    /// Entities keyed by canonical reference.
    entities: DashMap<String, EntityDocument>,
}

impl MemoryDocumentStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    #[instrument(skip(self, entity), fields(id = %entity.id))]
    async fn put_entity(&self, entity: EntityDocument) -> StorageResult<()> {
        validate_entity(&entity)?;

        use dashmap::mapref::entry::Entry;
        match self.entities.entry(entity.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::EntityAlreadyExists { id: entity.id }),
            Entry::Vacant(slot) => {
                slot.insert(entity);
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_document(&self, id: &str, fields: &[&str]) -> StorageResult<Map<String, Value>> {
        self.entities
            .get(id)
            .map(|entity| entity.select(fields))
            .ok_or_else(|| StorageError::EntityNotFound { id: id.to_string() })
    }

    #[instrument(skip(self))]
    async fn list_entities(&self, filter: &EntityFilter) -> StorageResult<Vec<EntityDocument>> {
        let mut found: Vec<EntityDocument> = self
            .entities
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| {
            b.revision
                .cmp(&a.revision)
                .then_with(|| a.series.cmp(&b.series))
        });
        Ok(found)
    }

    async fn count_entities(&self) -> StorageResult<usize> {
        Ok(self.entities.len())
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
