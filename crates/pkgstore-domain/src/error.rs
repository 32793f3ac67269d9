//! Domain error types for entity references and their collaborators.

use thiserror::Error;

/// Domain-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Entity name is empty or does not follow the name grammar.
    #[error("entity reference has invalid name: {name:?}")]
    InvalidName { name: String },

    /// Owner segment does not follow the user name grammar.
    #[error("entity reference has invalid user name: {reference:?}")]
    InvalidUser { reference: String },

    /// Series segment does not follow the series grammar.
    #[error("entity reference has invalid series: {series:?}")]
    InvalidSeries { series: String },

    /// Revision suffix is out of range.
    #[error("entity reference has invalid revision: {reference:?}")]
    InvalidRevision { reference: String },

    /// Reference has the wrong number of path elements.
    #[error("malformed entity reference: {reference:?}")]
    MalformedReference { reference: String },

    /// A resolver could not complete a partial reference.
    #[error("{message}")]
    ResolveFailed { message: String },

    /// The backend holds no document for the entity.
    #[error("entity not found: {id}")]
    DocumentNotFound { id: String },

    /// The backend read failed.
    #[error("{message}")]
    ReadFailed { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
