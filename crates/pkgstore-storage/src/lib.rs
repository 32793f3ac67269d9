//! pkgstore-storage: Storage abstraction layer
//!
//! This crate provides the document store the metadata handlers read from:
//! - DocumentStore trait for storage operations
//! - In-memory implementation for tests and the `memory` backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              pkgstore-storage               │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - DocumentStore definition     │
//! │  memory.rs   - In-memory implementation     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The store knows entities only by their canonical reference string; the
//! API crate adapts it to the domain's `EntityRef`-based traits.

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryDocumentStore;
pub use traits::{DocumentStore, EntityDocument, EntityFilter};
