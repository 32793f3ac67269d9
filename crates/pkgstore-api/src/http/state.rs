//! Application state for HTTP handlers.

use std::sync::Arc;

use pkgstore_server::Router;
use pkgstore_storage::DocumentStore;

use crate::adapters::StoreResolver;
use crate::v4::new_handlers;

/// Application state shared across all HTTP handlers.
///
/// # Type Parameters
///
/// * `S` - The storage backend implementing `DocumentStore`
#[derive(Clone)]
pub struct AppState<S: DocumentStore> {
    /// The storage backend.
    pub storage: Arc<S>,
    /// The request router every non-health request goes through.
    pub router: Arc<Router>,
}

impl<S: DocumentStore> AppState<S> {
    /// State serving the v4 handler set, resolving references against
    /// `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        let resolver = Arc::new(StoreResolver::new(Arc::clone(&storage)));
        let router = Router::new(new_handlers(Arc::clone(&storage)), resolver);
        Self::with_router(storage, router)
    }

    /// State serving a caller-built router.
    pub fn with_router(storage: Arc<S>, router: Router) -> Self {
        Self {
            storage,
            router: Arc::new(router),
        }
    }
}
