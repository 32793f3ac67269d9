//! Shared test utilities for pkgstore API tests.

// Helpers are shared by several test files; each is compiled on its own.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use pkgstore_api::adapters::entity_document;
use pkgstore_api::http::{create_router, AppState};
use pkgstore_domain::parse_reference;
use pkgstore_storage::{
    DocumentStore, EntityDocument, EntityFilter, MemoryDocumentStore, StorageResult,
};

/// Number of concurrent clients for load tests.
pub const CONCURRENT_CLIENT_COUNT: usize = 50;

/// In-memory store that counts document reads.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryDocumentStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn put_entity(&self, entity: EntityDocument) -> StorageResult<()> {
        self.inner.put_entity(entity).await
    }

    async fn get_document(&self, id: &str, fields: &[&str]) -> StorageResult<Map<String, Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_document(id, fields).await
    }

    async fn list_entities(&self, filter: &EntityFilter) -> StorageResult<Vec<EntityDocument>> {
        self.inner.list_entities(filter).await
    }

    async fn count_entities(&self) -> StorageResult<usize> {
        self.inner.count_entities().await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

/// Stores a small catalog:
///
/// | id                         | size | vcs |
/// |----------------------------|------|-----|
/// | `cs:precise/wordpress-23`  | 1000 | bzr |
/// | `cs:trusty/wordpress-24`   | 2000 | git |
/// | `cs:~joe/precise/mysql-1`  | 3000 | git |
/// | `cs:utopic/haproxy-5`      | 500  | hg  |
pub async fn seed_catalog<S: DocumentStore>(storage: &S) {
    let catalog = [
        ("precise/wordpress-23", 1000, "blog", "bzr"),
        ("trusty/wordpress-24", 2000, "blog", "git"),
        ("~joe/precise/mysql-1", 3000, "database", "git"),
        ("utopic/haproxy-5", 500, "proxy", "hg"),
    ];
    for (reference, size, summary, vcs) in catalog {
        let id = parse_reference(reference).unwrap();
        let doc = entity_document(&id)
            .unwrap()
            .with_field("size", json!(size))
            .with_field("hash", json!(format!("sha384-{}", size)))
            .with_field("meta", json!({ "Summary": summary }))
            .with_field("extrainfo", json!({ "vcs": vcs }));
        storage.put_entity(doc).await.unwrap();
    }
}

/// Create a test app over `storage`.
///
/// Each call creates a fresh `AppState` wrapping the shared storage,
/// which is the correct pattern for Axum's `oneshot` testing.
pub fn create_test_app<S: DocumentStore>(storage: &Arc<S>) -> axum::Router {
    create_router(AppState::new(Arc::clone(storage)))
}

/// Sends a GET request and decodes the JSON body.
pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}
