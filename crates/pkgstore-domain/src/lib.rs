//! pkgstore-domain: Core entity types for the package store
//!
//! This crate contains the values every other layer passes around:
//! - Entity references and the reference grammar
//! - Backend documents and field selectors
//! - Collaborator traits for resolving references and reading documents
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               pkgstore-domain               │
//! ├─────────────────────────────────────────────┤
//! │  entity/    - EntityRef & reference parser  │
//! │  document   - Document & FieldSelector      │
//! │  resolver/  - Resolver and reader traits    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod document;
pub mod entity;
pub mod error;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use document::{Document, FieldSelector};
pub use entity::{is_known_series, parse_reference, EntityRef, KNOWN_SERIES};
pub use error::{DomainError, DomainResult};
pub use resolver::{DefaultingResolver, DocumentReader, EntityResolver, IdentityResolver};
