//! Request dispatch.
//!
//! A request path is routed in one of three ways:
//!
//! ```text
//! /<global-key>[/rest]                 -> GlobalHandler
//! /<entity>/<id-key>[/rest]            -> IdHandler (entity resolved first)
//! /<entity>/meta/<name>[/rest]         -> one facet
//! /<entity>/meta/any?include=...       -> several facets
//! /meta/<name|any>?id=...&id=...       -> bulk metadata, keyed by literal id
//! ```
//!
//! Facets are [`BulkIncludeHandler`]s. Field-select facets that share a
//! [`GroupKey`] are served by a single backend read per entity.

mod dispatch;
mod error;
mod group;
mod handlers;
mod meta;
mod path;
mod reply;
mod request;

pub use dispatch::Router;
pub use error::{RouterError, RouterResult};
pub use handlers::{
    BulkIncludeHandler, FieldIncludeHandler, GlobalHandler, GroupKey, Handlers, IdHandler,
    MetaHandler, TransformFn,
};
pub use meta::{MetaAnyResponse, ANY, ID_PARAM, INCLUDE_PARAM};
pub use path::{handler_key, split_id, split_path};
pub use reply::{handle_errors, handle_json, HandleErrors, HandleJson, Reply, STATUS_OK};
pub use request::{QueryParams, Request};

#[cfg(test)]
mod tests;
