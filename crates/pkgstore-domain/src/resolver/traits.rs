//! Traits for the collaborators the dispatch core depends on.

use async_trait::async_trait;

use crate::document::{Document, FieldSelector};
use crate::entity::EntityRef;
use crate::error::DomainResult;

/// Completes a partially specified reference.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Returns the reference with series and revision filled in, or fails
    /// with [`DomainError::ResolveFailed`](crate::DomainError::ResolveFailed).
    ///
    /// Called once per reference per request.
    async fn resolve(&self, id: EntityRef) -> DomainResult<EntityRef>;
}

/// Reads the selected fields of one entity's document from the backend.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Returns [`DomainError::DocumentNotFound`](crate::DomainError::DocumentNotFound)
    /// when the backend holds nothing for `id`.
    async fn read(&self, id: &EntityRef, selector: &FieldSelector) -> DomainResult<Document>;
}
