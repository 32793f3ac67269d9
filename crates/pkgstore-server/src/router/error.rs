//! Router error types.

use pkgstore_domain::DomainError;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors produced while dispatching a request.
///
/// Every kind reaches the client through the same `{message, code}`
/// envelope; see [`RouterError::to_envelope`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The entity path could not be parsed.
    #[error(transparent)]
    InvalidReference(DomainError),

    /// The resolver could not complete a partial reference.
    #[error(transparent)]
    Resolve(DomainError),

    /// No handler is registered for the path.
    #[error("not found")]
    NotFound,

    /// A `meta/any` include or a `get_metadata` name has no handler.
    #[error("unrecognized metadata name {name:?}")]
    UnrecognizedFacet { name: String },

    /// The request itself is malformed, such as a bulk request without ids.
    #[error("{message}")]
    BadRequest { message: String },

    /// A backend document read failed.
    #[error(transparent)]
    Backend(DomainError),

    /// The caller abandoned the request.
    #[error("request cancelled")]
    Cancelled,

    /// Any other error raised by a handler.
    #[error("{message}")]
    Handler {
        message: String,
        code: Option<String>,
    },
}

impl RouterError {
    /// A handler error without a code.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            code: None,
        }
    }

    /// A handler error carrying an error code.
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    pub(crate) fn no_ids() -> Self {
        Self::BadRequest {
            message: "no ids specified in meta request".to_string(),
        }
    }

    /// The error code, if the originating error carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Handler { code, .. } => code.as_deref().filter(|code| !code.is_empty()),
            _ => None,
        }
    }

    /// Whether the error is confined to one entity of a bulk request.
    pub fn is_per_entity(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// The JSON error envelope: `{"message": ..., "code": ...}`, with
    /// `code` omitted when there is none.
    pub fn to_envelope(&self) -> Value {
        match self.code() {
            Some(code) => json!({ "message": self.to_string(), "code": code }),
            None => json!({ "message": self.to_string() }),
        }
    }
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
