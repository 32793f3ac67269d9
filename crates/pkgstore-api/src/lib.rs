//! pkgstore-api: HTTP API layer
//!
//! This crate provides the API layer including:
//! - HTTP endpoints via Axum, dispatched through the request router
//! - The v4 handler set (entity metadata facets, id and debug handlers)
//! - Adapters from the document store to the router's collaborators
//! - Middleware (request id, request logging)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                pkgstore-api                 │
//! ├─────────────────────────────────────────────┤
//! │  http/          - HTTP endpoints & envelope │
//! │  v4/            - v4 handler set            │
//! │  adapters.rs    - Storage -> domain bridge  │
//! │  middleware/    - Request id, logging       │
//! │  observability/ - Logging setup             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod http;
pub mod middleware;
pub mod observability;
pub mod v4;
