//! Adapters that bridge storage layer to domain layer.
//!
//! The domain layer (pkgstore-domain) defines the collaborators the router
//! depends on:
//! - `EntityResolver`: complete partially specified references
//! - `DocumentReader`: read selected document fields
//!
//! The storage layer (pkgstore-storage) implements `DocumentStore`, keyed by
//! canonical reference strings. The adapters here implement the domain
//! traits on top of any `DocumentStore`.

use std::sync::Arc;

use async_trait::async_trait;

use pkgstore_domain::{
    Document, DocumentReader, DomainError, DomainResult, EntityRef, EntityResolver, FieldSelector,
};
use pkgstore_storage::{DocumentStore, EntityDocument, EntityFilter, StorageError};

fn storage_error(err: StorageError) -> String {
    format!("storage error: {}", err)
}

/// Builds an empty stored document for a fully resolved reference.
pub fn entity_document(id: &EntityRef) -> DomainResult<EntityDocument> {
    match (id.series(), id.revision()) {
        (Some(series), Some(revision)) => Ok(EntityDocument::new(
            id.to_string(),
            id.owner().map(str::to_string),
            series,
            id.name(),
            revision,
        )),
        _ => Err(DomainError::MalformedReference {
            reference: id.to_string(),
        }),
    }
}

/// Resolver that completes references from the entities in a `DocumentStore`.
///
/// A missing series or revision is taken from the newest stored entity with
/// the same owner and name (and series, when given). References that are
/// already complete are returned unchanged.
pub struct StoreResolver<S: DocumentStore> {
    storage: Arc<S>,
}

impl<S: DocumentStore> StoreResolver<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: DocumentStore> EntityResolver for StoreResolver<S> {
    async fn resolve(&self, id: EntityRef) -> DomainResult<EntityRef> {
        if id.is_resolved() {
            return Ok(id);
        }

        let filter = EntityFilter {
            owner: id.owner().map(str::to_string),
            series: id.series().map(str::to_string),
            name: id.name().to_string(),
        };
        let candidates = self
            .storage
            .list_entities(&filter)
            .await
            .map_err(|e| DomainError::ResolveFailed {
                message: storage_error(e),
            })?;

        // Candidates are listed newest first.
        let entity = candidates
            .into_iter()
            .find(|entity| id.revision().map_or(true, |revision| revision == entity.revision))
            .ok_or_else(|| DomainError::ResolveFailed {
                message: format!("no matching entity for {:?}", id.to_string()),
            })?;

        let id = match id.series() {
            Some(_) => id,
            None => id.with_series(entity.series)?,
        };
        Ok(id.with_revision(entity.revision))
    }
}

/// Adapter that implements `DocumentReader` using a `DocumentStore`.
pub struct StoreDocumentReader<S: DocumentStore> {
    storage: Arc<S>,
}

impl<S: DocumentStore> StoreDocumentReader<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentReader for StoreDocumentReader<S> {
    async fn read(&self, id: &EntityRef, selector: &FieldSelector) -> DomainResult<Document> {
        let fields: Vec<&str> = selector.iter().collect();
        let id = id.to_string();
        match self.storage.get_document(&id, &fields).await {
            Ok(fields) => Ok(Document::new(fields)),
            Err(StorageError::EntityNotFound { .. }) => Err(DomainError::DocumentNotFound { id }),
            Err(e) => Err(DomainError::ReadFailed {
                message: storage_error(e),
            }),
        }
    }
}
