//! Handler implementations for the v4 API.

use std::sync::Arc;

use async_trait::async_trait;
use pkgstore_domain::{Document, DocumentReader, DomainError, EntityRef};
use pkgstore_server::{
    BulkIncludeHandler, GlobalHandler, Handlers, IdHandler, MetaHandler, QueryParams, Reply,
    Request, RouterError, RouterResult, STATUS_OK,
};
use pkgstore_storage::{DocumentStore, EntityFilter, StorageError};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::adapters::StoreDocumentReader;

/// Grouping key shared by every facet backed by stored document fields.
pub const ENTITY_GROUP: &str = "entity";

const SIZE_FIELD: &str = "size";
const HASH_FIELD: &str = "hash";
const META_FIELD: &str = "meta";
const EXTRA_INFO_FIELD: &str = "extrainfo";

/// Builds the v4 handler registry on top of `storage`.
pub fn new_handlers<S: DocumentStore>(storage: Arc<S>) -> Handlers {
    let reader: Arc<dyn DocumentReader> = Arc::new(StoreDocumentReader::new(Arc::clone(&storage)));

    Handlers::new()
        .with_global("debug/", DebugHandler::new(Arc::clone(&storage)))
        .with_id("expand-id", ExpandIdHandler::new(storage))
        .with_meta("id", BulkIncludeHandler::single(ReferenceFacet::new(IdPart::All)))
        .with_meta("id-user", BulkIncludeHandler::single(ReferenceFacet::new(IdPart::User)))
        .with_meta("id-series", BulkIncludeHandler::single(ReferenceFacet::new(IdPart::Series)))
        .with_meta("id-name", BulkIncludeHandler::single(ReferenceFacet::new(IdPart::Name)))
        .with_meta(
            "id-revision",
            BulkIncludeHandler::single(ReferenceFacet::new(IdPart::Revision)),
        )
        .with_meta(
            "archive-size",
            BulkIncludeHandler::field_select(ENTITY_GROUP, [SIZE_FIELD], Arc::clone(&reader), archive_size),
        )
        .with_meta(
            "hash",
            BulkIncludeHandler::field_select(ENTITY_GROUP, [HASH_FIELD], Arc::clone(&reader), archive_hash),
        )
        .with_meta(
            "charm-metadata",
            BulkIncludeHandler::field_select(ENTITY_GROUP, [META_FIELD], Arc::clone(&reader), charm_metadata),
        )
        .with_meta(
            "extra-info",
            BulkIncludeHandler::field_select(ENTITY_GROUP, [EXTRA_INFO_FIELD], Arc::clone(&reader), extra_info),
        )
        .with_meta(
            "extra-info/",
            BulkIncludeHandler::field_select(ENTITY_GROUP, [EXTRA_INFO_FIELD], reader, extra_info),
        )
}

fn backend_error(err: StorageError) -> RouterError {
    RouterError::Backend(DomainError::ReadFailed {
        message: format!("storage error: {}", err),
    })
}

fn to_value<T: Serialize>(value: &T) -> RouterResult<Value> {
    serde_json::to_value(value).map_err(|e| RouterError::handler(e.to_string()))
}

fn field(doc: &Document, name: &str) -> Value {
    doc.get(name).cloned().unwrap_or(Value::Null)
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: &'static str,
    entities: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct IdResponse<'a> {
    id: &'a EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<&'a str>,
    name: &'a str,
    revision: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExpandedId {
    id: String,
}

/// Which part of the reference a [`ReferenceFacet`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPart {
    All,
    User,
    Series,
    Name,
    Revision,
}

/// A facet computed from the resolved reference alone.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceFacet {
    part: IdPart,
}

impl ReferenceFacet {
    pub fn new(part: IdPart) -> Self {
        Self { part }
    }
}

#[async_trait]
impl MetaHandler for ReferenceFacet {
    async fn handle(&self, id: &EntityRef, _path: &str, _flags: &QueryParams) -> RouterResult<Value> {
        let mut value = Map::new();
        match self.part {
            IdPart::All => {
                return to_value(&IdResponse {
                    id,
                    user: id.owner(),
                    series: id.series(),
                    name: id.name(),
                    revision: id.revision(),
                })
            }
            IdPart::User => {
                value.insert("User".to_string(), Value::from(id.owner().unwrap_or_default()));
            }
            IdPart::Series => {
                value.insert("Series".to_string(), Value::from(id.series().unwrap_or_default()));
            }
            IdPart::Name => {
                value.insert("Name".to_string(), Value::from(id.name()));
            }
            IdPart::Revision => {
                value.insert("Revision".to_string(), Value::from(id.revision()));
            }
        }
        Ok(Value::Object(value))
    }
}

fn archive_size(doc: &Document, _id: &EntityRef, _path: &str, _flags: &QueryParams) -> RouterResult<Value> {
    let mut value = Map::new();
    value.insert("Size".to_string(), field(doc, SIZE_FIELD));
    Ok(Value::Object(value))
}

fn archive_hash(doc: &Document, _id: &EntityRef, _path: &str, _flags: &QueryParams) -> RouterResult<Value> {
    let mut value = Map::new();
    value.insert("Sum".to_string(), field(doc, HASH_FIELD));
    Ok(Value::Object(value))
}

fn charm_metadata(doc: &Document, _id: &EntityRef, _path: &str, _flags: &QueryParams) -> RouterResult<Value> {
    Ok(field(doc, META_FIELD))
}

/// `extra-info` returns the whole object; `extra-info/<key>` one value of it.
fn extra_info(doc: &Document, _id: &EntityRef, path: &str, _flags: &QueryParams) -> RouterResult<Value> {
    let info = field(doc, EXTRA_INFO_FIELD);
    let key = path.trim_start_matches('/');
    if key.is_empty() {
        return Ok(match info {
            Value::Null => Value::Object(Map::new()),
            info => info,
        });
    }
    if key.contains('/') {
        return Err(RouterError::BadRequest {
            message: format!("bad extra-info key {:?}", key),
        });
    }
    Ok(info.get(key).cloned().unwrap_or(Value::Null))
}

/// Serves `debug/status`.
pub struct DebugHandler<S: DocumentStore> {
    storage: Arc<S>,
}

impl<S: DocumentStore> DebugHandler<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: DocumentStore> GlobalHandler for DebugHandler<S> {
    async fn handle(&self, path: &str, _request: &Request) -> RouterResult<Reply> {
        if path != "/status" {
            return Err(RouterError::NotFound);
        }
        let entities = self
            .storage
            .count_entities()
            .await
            .map_err(backend_error)?;
        Reply::serialize(
            STATUS_OK,
            &StatusResponse {
                version: env!("CARGO_PKG_VERSION"),
                entities,
            },
        )
    }
}

/// Lists every stored revision of an entity, newest first.
pub struct ExpandIdHandler<S: DocumentStore> {
    storage: Arc<S>,
}

impl<S: DocumentStore> ExpandIdHandler<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: DocumentStore> IdHandler for ExpandIdHandler<S> {
    async fn handle(&self, id: &EntityRef, _path: &str, _request: &Request) -> RouterResult<Reply> {
        let filter = EntityFilter {
            owner: id.owner().map(str::to_string),
            series: None,
            name: id.name().to_string(),
        };
        let entities = self
            .storage
            .list_entities(&filter)
            .await
            .map_err(backend_error)?;
        debug!(id = %id, count = entities.len(), "expanded id");

        let ids: Vec<ExpandedId> = entities
            .into_iter()
            .map(|entity| ExpandedId { id: entity.id })
            .collect();
        Reply::serialize(STATUS_OK, &ids)
    }
}
