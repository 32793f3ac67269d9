//! Handler contracts and the registry that holds them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use pkgstore_domain::{Document, DocumentReader, EntityRef, FieldSelector};
use serde_json::Value;

use super::error::RouterResult;
use super::reply::Reply;
use super::request::{QueryParams, Request};

/// Handler for a path that does not start with an entity reference.
#[async_trait]
pub trait GlobalHandler: Send + Sync {
    /// `path` is what remains after the handler key; empty for exact keys.
    async fn handle(&self, path: &str, request: &Request) -> RouterResult<Reply>;
}

/// Handler operating on one resolved entity.
#[async_trait]
pub trait IdHandler: Send + Sync {
    async fn handle(&self, id: &EntityRef, path: &str, request: &Request) -> RouterResult<Reply>;
}

/// A self-contained metadata facet that does its own backend work.
#[async_trait]
pub trait MetaHandler: Send + Sync {
    async fn handle(&self, id: &EntityRef, path: &str, flags: &QueryParams) -> RouterResult<Value>;
}

/// Computes a facet value from a shared document.
pub type TransformFn =
    dyn Fn(&Document, &EntityRef, &str, &QueryParams) -> RouterResult<Value> + Send + Sync;

/// Opaque grouping key. Field-select handlers with equal keys share one
/// backend read per entity.
///
/// Any `Eq + Hash` value can serve as a key. Keys of different types never
/// compare equal, and string keys are stored as `String` whichever string
/// type built them.
#[derive(Clone)]
pub struct GroupKey(Arc<dyn KeyValue>);

impl GroupKey {
    pub fn new<K>(key: K) -> Self
    where
        K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(key))
    }

    /// The key value, if it is a `K`.
    pub fn downcast_ref<K: Any>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref()
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_key(other.0.as_ref())
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_key(state);
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupKey").field(&self.0).finish()
    }
}

impl From<&str> for GroupKey {
    fn from(key: &str) -> Self {
        Self::new(key.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Object-safe equality and hashing over an erased key.
trait KeyValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_key(&self, other: &dyn KeyValue) -> bool;
    fn hash_key(&self, state: &mut dyn Hasher);
}

impl<K> KeyValue for K
where
    K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_key(&self, other: &dyn KeyValue) -> bool {
        other.as_any().downcast_ref::<K>() == Some(self)
    }

    fn hash_key(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<K>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// A facet that reads selected document fields and transforms them.
#[derive(Clone)]
pub struct FieldIncludeHandler {
    key: GroupKey,
    fields: FieldSelector,
    reader: Arc<dyn DocumentReader>,
    transform: Arc<TransformFn>,
}

impl FieldIncludeHandler {
    pub fn new<F>(
        key: impl Into<GroupKey>,
        fields: impl IntoIterator<Item = impl Into<String>>,
        reader: Arc<dyn DocumentReader>,
        transform: F,
    ) -> Self
    where
        F: Fn(&Document, &EntityRef, &str, &QueryParams) -> RouterResult<Value>
            + Send
            + Sync
            + 'static,
    {
        Self {
            key: key.into(),
            fields: fields.into_iter().collect(),
            reader,
            transform: Arc::new(transform),
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn fields(&self) -> &FieldSelector {
        &self.fields
    }

    pub(crate) fn reader(&self) -> &Arc<dyn DocumentReader> {
        &self.reader
    }

    pub(crate) fn transform(
        &self,
        doc: &Document,
        id: &EntityRef,
        path: &str,
        flags: &QueryParams,
    ) -> RouterResult<Value> {
        (self.transform)(doc, id, path, flags)
    }
}

impl fmt::Debug for FieldIncludeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldIncludeHandler")
            .field("key", &self.key)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// A registered metadata facet.
#[derive(Clone)]
pub enum BulkIncludeHandler {
    /// Queried on its own, once per entity.
    Single(Arc<dyn MetaHandler>),
    /// Takes part in field-group batching.
    FieldSelect(FieldIncludeHandler),
}

impl BulkIncludeHandler {
    pub fn single(handler: impl MetaHandler + 'static) -> Self {
        Self::Single(Arc::new(handler))
    }

    /// Shorthand for [`FieldIncludeHandler::new`].
    pub fn field_select<F>(
        key: impl Into<GroupKey>,
        fields: impl IntoIterator<Item = impl Into<String>>,
        reader: Arc<dyn DocumentReader>,
        transform: F,
    ) -> Self
    where
        F: Fn(&Document, &EntityRef, &str, &QueryParams) -> RouterResult<Value>
            + Send
            + Sync
            + 'static,
    {
        Self::FieldSelect(FieldIncludeHandler::new(key, fields, reader, transform))
    }

    /// The grouping key; `None` for self-contained handlers.
    pub fn key(&self) -> Option<&GroupKey> {
        match self {
            Self::Single(_) => None,
            Self::FieldSelect(handler) => Some(handler.key()),
        }
    }

    pub fn fields(&self) -> Option<&FieldSelector> {
        match self {
            Self::Single(_) => None,
            Self::FieldSelect(handler) => Some(handler.fields()),
        }
    }
}

impl fmt::Debug for BulkIncludeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Single"),
            Self::FieldSelect(handler) => handler.fmt(f),
        }
    }
}

/// The three handler maps. Built once at startup and read-only after.
///
/// Keys ending in `/` are prefix keys; all others are exact.
#[derive(Clone, Default)]
pub struct Handlers {
    pub(crate) global: HashMap<String, Arc<dyn GlobalHandler>>,
    pub(crate) id: HashMap<String, Arc<dyn IdHandler>>,
    pub(crate) meta: HashMap<String, BulkIncludeHandler>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(mut self, key: impl Into<String>, handler: impl GlobalHandler + 'static) -> Self {
        self.global.insert(key.into(), Arc::new(handler));
        self
    }

    pub fn with_id(mut self, key: impl Into<String>, handler: impl IdHandler + 'static) -> Self {
        self.id.insert(key.into(), Arc::new(handler));
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, handler: BulkIncludeHandler) -> Self {
        self.meta.insert(key.into(), handler);
        self
    }

    /// Registered meta keys, sorted.
    pub fn meta_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.meta.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut global: Vec<&String> = self.global.keys().collect();
        let mut id: Vec<&String> = self.id.keys().collect();
        global.sort_unstable();
        id.sort_unstable();
        f.debug_struct("Handlers")
            .field("global", &global)
            .field("id", &id)
            .field("meta", &self.meta_keys())
            .finish()
    }
}
