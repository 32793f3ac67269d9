//! pkgstore-server: Request dispatch and metadata aggregation
//!
//! This crate contains the transport-independent core of the service:
//! - Path splitting and handler key matching
//! - Global, id and meta handler registries
//! - The router that resolves entity references and dispatches requests
//! - `meta/<name>`, `meta/any` and bulk metadata requests
//! - Field-group batching of backend reads
//! - Configuration management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               pkgstore-server               │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  router/     - Request dispatch             │
//! │    path.rs      - Path & key splitting      │
//! │    request.rs   - Request & query params    │
//! │    reply.rs     - Replies & adapters        │
//! │    handlers.rs  - Handler registry          │
//! │    dispatch.rs  - Router                    │
//! │    meta.rs      - Metadata requests         │
//! │    group.rs     - Field-group batching      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod router;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use router::{
    handle_errors, handle_json, BulkIncludeHandler, FieldIncludeHandler, GlobalHandler, GroupKey,
    Handlers, IdHandler, MetaAnyResponse, MetaHandler, QueryParams, Reply, Request, Router,
    RouterError, RouterResult, STATUS_OK,
};
