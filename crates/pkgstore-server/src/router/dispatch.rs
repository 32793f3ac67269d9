//! Top-level request dispatch.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use pkgstore_domain::EntityResolver;
use tracing::debug;

use super::error::{RouterError, RouterResult};
use super::handlers::{BulkIncludeHandler, GlobalHandler, Handlers, IdHandler};
use super::path::{handler_key, split_id};
use super::reply::Reply;
use super::request::Request;

/// Key under which metadata requests are routed, both at the top level
/// (bulk) and below an entity (path-anchored).
pub(crate) const META_KEY: &str = "meta/";

enum GlobalRoute {
    BulkMeta,
    Handler(Arc<dyn GlobalHandler>),
}

enum IdRoute {
    Meta,
    Handler(Arc<dyn IdHandler>),
}

/// Routes requests to registered handlers.
///
/// The router holds only immutable configuration, so one instance serves
/// any number of concurrent requests.
pub struct Router {
    global: HashMap<String, GlobalRoute>,
    id: HashMap<String, IdRoute>,
    pub(crate) meta: HashMap<String, BulkIncludeHandler>,
    pub(crate) resolver: Arc<dyn EntityResolver>,
}

impl Router {
    /// Builds a router over `handlers`.
    ///
    /// `meta/` is always routed to the built-in metadata dispatch, in both
    /// the global and the id map, replacing any handler registered there.
    pub fn new(handlers: Handlers, resolver: Arc<dyn EntityResolver>) -> Self {
        let mut global: HashMap<String, GlobalRoute> = handlers
            .global
            .into_iter()
            .map(|(key, handler)| (key, GlobalRoute::Handler(handler)))
            .collect();
        global.insert(META_KEY.to_string(), GlobalRoute::BulkMeta);

        let mut id: HashMap<String, IdRoute> = handlers
            .id
            .into_iter()
            .map(|(key, handler)| (key, IdRoute::Handler(handler)))
            .collect();
        id.insert(META_KEY.to_string(), IdRoute::Meta);

        Self {
            global,
            id,
            meta: handlers.meta,
            resolver,
        }
    }

    /// Dispatches one request to exactly one handler.
    ///
    /// Dropping the returned future abandons any in-flight resolver and
    /// backend calls of this request.
    pub async fn dispatch(&self, request: &Request) -> RouterResult<Reply> {
        let (key, rest) = handler_key(&request.path);
        if let Some(route) = self.global.get(&key) {
            debug!(key = %key, "global dispatch");
            return match route {
                GlobalRoute::BulkMeta => self.serve_bulk_meta(rest, request).await.map(Reply::json),
                GlobalRoute::Handler(handler) => handler.handle(rest, request).await,
            };
        }

        let (id, rest) = split_id(&request.path).map_err(RouterError::InvalidReference)?;
        let id = self
            .resolver
            .resolve(id)
            .await
            .map_err(RouterError::Resolve)?;

        let (key, rest) = handler_key(rest);
        debug!(entity = %id, key = %key, "id dispatch");
        match self.id.get(&key) {
            Some(IdRoute::Meta) => self.serve_meta(&id, rest, request).await.map(Reply::json),
            Some(IdRoute::Handler(handler)) => handler.handle(&id, rest, request).await,
            None => Err(RouterError::NotFound),
        }
    }

    /// Dispatches `request` unless `cancel` completes first, in which case
    /// the request is abandoned with [`RouterError::Cancelled`].
    pub async fn dispatch_until<C>(&self, request: &Request, cancel: C) -> RouterResult<Reply>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            reply = self.dispatch(request) => reply,
            _ = cancel => {
                debug!(path = %request.path, "request cancelled");
                Err(RouterError::Cancelled)
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut global: Vec<&String> = self.global.keys().collect();
        let mut id: Vec<&String> = self.id.keys().collect();
        let mut meta: Vec<&String> = self.meta.keys().collect();
        global.sort_unstable();
        id.sort_unstable();
        meta.sort_unstable();
        f.debug_struct("Router")
            .field("global", &global)
            .field("id", &id)
            .field("meta", &meta)
            .finish_non_exhaustive()
    }
}
