//! Tests for request dispatch and metadata aggregation.

use super::*;
use async_trait::async_trait;
use pkgstore_domain::{
    DefaultingResolver, Document, DocumentReader, DomainError, DomainResult, EntityRef,
    EntityResolver, FieldSelector, IdentityResolver,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================
// Test Fixtures
// ============================================================

/// Reader that records every backend read and echoes the query back.
#[derive(Default)]
struct CountingReader {
    queries: AtomicUsize,
}

impl CountingReader {
    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentReader for CountingReader {
    async fn read(&self, id: &EntityRef, selector: &FieldSelector) -> DomainResult<Document> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if id.name() == "bad" {
            return Err(DomainError::DocumentNotFound { id: id.to_string() });
        }
        Ok([
            ("Id".to_string(), json!(id)),
            ("Selector".to_string(), json!(selector)),
        ]
        .into_iter()
        .collect())
    }
}

/// Reader whose reads never complete.
struct StalledReader;

#[async_trait]
impl DocumentReader for StalledReader {
    async fn read(&self, _id: &EntityRef, _selector: &FieldSelector) -> DomainResult<Document> {
        futures::future::pending().await
    }
}

struct FailingResolver;

#[async_trait]
impl EntityResolver for FailingResolver {
    async fn resolve(&self, _id: EntityRef) -> DomainResult<EntityRef> {
        Err(DomainError::ResolveFailed {
            message: "resolve URL error".to_string(),
        })
    }
}

/// Resolves everything except entities named "ghost".
struct GhostResolver;

#[async_trait]
impl EntityResolver for GhostResolver {
    async fn resolve(&self, id: EntityRef) -> DomainResult<EntityRef> {
        if id.name() == "ghost" {
            return Err(DomainError::ResolveFailed {
                message: format!("no matching entity for {:?}", id.to_string()),
            });
        }
        Ok(id)
    }
}

fn flags_value(flags: &QueryParams) -> Value {
    if flags.is_empty() {
        Value::Null
    } else {
        json!(flags)
    }
}

struct TestIdHandler;

#[async_trait]
impl IdHandler for TestIdHandler {
    async fn handle(&self, id: &EntityRef, path: &str, _request: &Request) -> RouterResult<Reply> {
        Ok(Reply::json(json!({"CharmURL": id.to_string(), "Path": path})))
    }
}

struct ErrorIdHandler;

#[async_trait]
impl IdHandler for ErrorIdHandler {
    async fn handle(&self, _id: &EntityRef, _path: &str, _request: &Request) -> RouterResult<Reply> {
        Err(RouterError::handler("errorIdHandler error"))
    }
}

struct TestMetaHandler;

#[async_trait]
impl MetaHandler for TestMetaHandler {
    async fn handle(&self, id: &EntityRef, path: &str, flags: &QueryParams) -> RouterResult<Value> {
        Ok(json!({"CharmURL": id.to_string(), "Path": path, "Flags": flags_value(flags)}))
    }
}

fn test_meta() -> BulkIncludeHandler {
    BulkIncludeHandler::single(TestMetaHandler)
}

/// Field-select handler that reports how it was called.
fn field_select(
    handler_id: &'static str,
    reader: &Arc<CountingReader>,
    fields: &[&str],
) -> BulkIncludeHandler {
    BulkIncludeHandler::field_select(
        "group",
        fields.iter().copied(),
        reader.clone(),
        move |doc, id, path, flags| {
            Ok(json!({
                "HandlerId": handler_id,
                "Doc": doc,
                "Id": id,
                "Path": path,
                "Flags": flags_value(flags),
            }))
        },
    )
}

fn field_info(handler_id: &str, id: &str, selector: &[&str], path: &str) -> Value {
    json!({
        "HandlerId": handler_id,
        "Doc": {"Id": id, "Selector": selector},
        "Id": id,
        "Path": path,
        "Flags": null,
    })
}

fn meta_info(id: &str, path: &str) -> Value {
    json!({"CharmURL": id, "Path": path, "Flags": null})
}

/// Builds a request from `path?query`.
fn request(url: &str) -> Request {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")));
    Request::new(path).with_params(QueryParams::from_pairs(pairs))
}

fn router(handlers: Handlers) -> Router {
    Router::new(handlers, Arc::new(IdentityResolver))
}

async fn call_ok(router: &Router, url: &str) -> Value {
    let reply = router.dispatch(&request(url)).await.unwrap();
    assert_eq!(reply.status, STATUS_OK);
    reply.body.unwrap()
}

async fn call_err(router: &Router, url: &str) -> RouterError {
    router.dispatch(&request(url)).await.unwrap_err()
}

// ============================================================
// Global and id dispatch
// ============================================================

#[tokio::test]
async fn test_global_handler() {
    let router = router(
        Handlers::new().with_global("foo", handle_json(|_| async { Ok(json!({"S": "hello"})) })),
    );
    assert_eq!(call_ok(&router, "/foo").await, json!({"S": "hello"}));
}

#[tokio::test]
async fn test_global_prefix_handler_sees_rest() {
    struct Echo;

    #[async_trait]
    impl GlobalHandler for Echo {
        async fn handle(&self, path: &str, request: &Request) -> RouterResult<Reply> {
            Ok(Reply::json(json!({"path": path, "full": request.path})))
        }
    }

    let router = router(Handlers::new().with_global("debug/", Echo));
    assert_eq!(
        call_ok(&router, "/debug/status").await,
        json!({"path": "/status", "full": "/debug/status"})
    );
}

#[tokio::test]
async fn test_id_handler() {
    let router = router(Handlers::new().with_id("foo", TestIdHandler));
    assert_eq!(
        call_ok(&router, "/precise/wordpress-34/foo").await,
        json!({"CharmURL": "cs:precise/wordpress-34", "Path": ""})
    );
}

#[tokio::test]
async fn test_id_handler_with_extra_path() {
    let router = router(Handlers::new().with_id("foo/", TestIdHandler));
    assert_eq!(
        call_ok(&router, "/precise/wordpress-34/foo/blah/arble").await,
        json!({"CharmURL": "cs:precise/wordpress-34", "Path": "/blah/arble"})
    );
}

#[tokio::test]
async fn test_id_handler_with_allowed_extra_path_but_none_given() {
    let router = router(Handlers::new().with_id("foo/", TestIdHandler));
    let err = call_err(&router, "/precise/wordpress-34/foo").await;
    assert_eq!(err, RouterError::NotFound);
    assert_eq!(err.to_envelope(), json!({"message": "not found"}));
}

#[tokio::test]
async fn test_id_handler_with_unwanted_extra_path() {
    let router = router(Handlers::new().with_id("foo", TestIdHandler));
    let err = call_err(&router, "/precise/wordpress-34/foo/blah").await;
    assert_eq!(err, RouterError::NotFound);
}

#[tokio::test]
async fn test_id_handler_with_user() {
    let router = router(
        Handlers::new()
            .with_id("foo", TestIdHandler)
            .with_id("bar/", TestIdHandler),
    );
    assert_eq!(
        call_ok(&router, "/~joe/precise/wordpress-34/foo").await,
        json!({"CharmURL": "cs:~joe/precise/wordpress-34", "Path": ""})
    );
    assert_eq!(
        call_ok(&router, "/~joe/precise/wordpress-34/bar/blah/arble").await,
        json!({"CharmURL": "cs:~joe/precise/wordpress-34", "Path": "/blah/arble"})
    );
}

#[tokio::test]
async fn test_id_handler_that_returns_an_error() {
    let router = router(Handlers::new().with_id("foo/", ErrorIdHandler));
    let err = call_err(&router, "/~joe/precise/wordpress-34/foo/blah/arble").await;
    assert_eq!(err.to_string(), "errorIdHandler error");
    assert_eq!(err.code(), None);
}

#[tokio::test]
async fn test_id_resolved_before_dispatch() {
    let router = Router::new(
        Handlers::new().with_id("foo", TestIdHandler),
        Arc::new(DefaultingResolver::new("precise", 34)),
    );
    assert_eq!(
        call_ok(&router, "/~joe/wordpress/foo").await,
        json!({"CharmURL": "cs:~joe/precise/wordpress-34", "Path": ""})
    );
}

#[tokio::test]
async fn test_id_with_error_on_resolving() {
    let router = Router::new(
        Handlers::new().with_id("foo", TestIdHandler),
        Arc::new(FailingResolver),
    );
    let err = call_err(&router, "/wordpress/meta").await;
    assert!(matches!(err, RouterError::Resolve(_)));
    assert_eq!(err.to_envelope(), json!({"message": "resolve URL error"}));
}

#[tokio::test]
async fn test_invalid_entity_path() {
    let router = router(Handlers::new().with_id("foo", TestIdHandler));
    let err = call_err(&router, "/~foo-bar-/wordpress/foo").await;
    assert!(matches!(err, RouterError::InvalidReference(_)));
    assert_eq!(
        err.to_string(),
        r#"entity reference has invalid user name: "~foo-bar-/wordpress""#
    );

    let err = call_err(&router, "/").await;
    assert!(matches!(err, RouterError::InvalidReference(_)));
}

// ============================================================
// Path-anchored metadata
// ============================================================

#[tokio::test]
async fn test_meta_handler() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    assert_eq!(
        call_ok(&router, "/precise/wordpress-42/meta/foo").await,
        meta_info("cs:precise/wordpress-42", "")
    );
}

#[tokio::test]
async fn test_meta_handler_with_additional_elements() {
    let router = router(Handlers::new().with_meta("foo/", test_meta()));
    assert_eq!(
        call_ok(&router, "/precise/wordpress-42/meta/foo/bar/baz").await,
        meta_info("cs:precise/wordpress-42", "/bar/baz")
    );
}

#[tokio::test]
async fn test_meta_handler_with_params() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    assert_eq!(
        call_ok(&router, "/precise/wordpress-42/meta/foo?one=a&two=b&one=c").await,
        json!({
            "CharmURL": "cs:precise/wordpress-42",
            "Path": "",
            "Flags": {"one": ["a", "c"], "two": ["b"]},
        })
    );
}

#[tokio::test]
async fn test_meta_handler_not_found() {
    let router = router(Handlers::new());
    let err = call_err(&router, "/precise/wordpress-42/meta/foo").await;
    assert_eq!(err, RouterError::NotFound);
}

#[tokio::test]
async fn test_meta_handler_with_field_selector() {
    let reader = Arc::new(CountingReader::default());
    let router = router(
        Handlers::new().with_meta("foo", field_select("handler1", &reader, &["field1", "field2"])),
    );
    assert_eq!(
        call_ok(&router, "/precise/wordpress-42/meta/foo").await,
        field_info("handler1", "cs:precise/wordpress-42", &["field1", "field2"], "")
    );
    assert_eq!(reader.queries(), 1);
}

#[tokio::test]
async fn test_meta_any_no_includes() {
    let reader = Arc::new(CountingReader::default());
    let router = router(Handlers::new().with_meta("foo", field_select("handler1", &reader, &["a"])));
    assert_eq!(
        call_ok(&router, "/precise/wordpress-42/meta/any").await,
        json!({"Id": "cs:precise/wordpress-42"})
    );
    assert_eq!(reader.queries(), 0);
}

#[tokio::test]
async fn test_meta_any_includes_sharing_a_key() {
    let reader = Arc::new(CountingReader::default());
    let router = router(
        Handlers::new()
            .with_meta("field1-1", field_select("handler1", &reader, &["field1"]))
            .with_meta("field2", field_select("handler2", &reader, &["field2"]))
            .with_meta("field1-2", field_select("handler3", &reader, &["field1"])),
    );
    let id = "cs:precise/wordpress-42";
    let selector = ["field1", "field2"];
    assert_eq!(
        call_ok(
            &router,
            "/precise/wordpress-42/meta/any?include=field1-1&include=field2&include=field1-2"
        )
        .await,
        json!({
            "Id": id,
            "Meta": {
                "field1-1": field_info("handler1", id, &selector, ""),
                "field2": field_info("handler2", id, &selector, ""),
                "field1-2": field_info("handler3", id, &selector, ""),
            },
        })
    );
    assert_eq!(reader.queries(), 1);
}

#[tokio::test]
async fn test_meta_any_includes_with_additional_path_elements() {
    let reader = Arc::new(CountingReader::default());
    let router = router(
        Handlers::new()
            .with_meta("item1/", field_select("handler1", &reader, &["field1"]))
            .with_meta("item2/", field_select("handler2", &reader, &["field2"]))
            .with_meta("item1", field_select("handler3", &reader, &["field3"])),
    );
    let id = "cs:precise/wordpress-42";
    let selector = ["field1", "field2", "field3"];
    assert_eq!(
        call_ok(
            &router,
            "/precise/wordpress-42/meta/any?include=item1/foo&include=item2/bar&include=item1"
        )
        .await,
        json!({
            "Id": id,
            "Meta": {
                "item1/foo": field_info("handler1", id, &selector, "/foo"),
                "item2/bar": field_info("handler2", id, &selector, "/bar"),
                "item1": field_info("handler3", id, &selector, ""),
            },
        })
    );
    assert_eq!(reader.queries(), 1);
}

#[tokio::test]
async fn test_meta_any_reads_once_per_key() {
    let reader = Arc::new(CountingReader::default());
    let other = BulkIncludeHandler::field_select("other", ["x"], reader.clone(), |_, _, _, _| {
        Ok(json!("other"))
    });
    let router = router(
        Handlers::new()
            .with_meta("a", field_select("handler1", &reader, &["a"]))
            .with_meta("b", field_select("handler2", &reader, &["b"]))
            .with_meta("x", other)
            .with_meta("single", test_meta()),
    );
    let body = call_ok(
        &router,
        "/precise/wordpress-42/meta/any?include=a&include=b&include=x&include=single&include=a",
    )
    .await;
    assert_eq!(reader.queries(), 2);
    assert_eq!(body["Meta"].as_object().unwrap().len(), 4);
    assert_eq!(body["Meta"]["x"], json!("other"));
    assert_eq!(
        body["Meta"]["single"],
        meta_info("cs:precise/wordpress-42", "")
    );
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum ReadGroup {
    Archive,
    Stats,
}

#[test]
fn test_group_key_equality() {
    assert_eq!(GroupKey::from("entity"), GroupKey::from("entity".to_string()));
    assert_ne!(GroupKey::from("entity"), GroupKey::from("stats"));
    assert_eq!(GroupKey::new(ReadGroup::Archive), GroupKey::new(ReadGroup::Archive));
    assert_ne!(GroupKey::new(ReadGroup::Archive), GroupKey::new(ReadGroup::Stats));
    assert_ne!(GroupKey::new(1u32), GroupKey::new(1u64));
    assert_eq!(
        GroupKey::new(ReadGroup::Stats).downcast_ref::<ReadGroup>(),
        Some(&ReadGroup::Stats)
    );
}

#[tokio::test]
async fn test_meta_any_groups_by_non_string_keys() {
    let reader = Arc::new(CountingReader::default());
    let facet = |key: ReadGroup, fields: &'static [&'static str]| {
        BulkIncludeHandler::field_select(
            GroupKey::new(key),
            fields.iter().copied(),
            reader.clone(),
            |doc, _, _, _| Ok(doc.get("Selector").cloned().unwrap_or(Value::Null)),
        )
    };
    let router = router(
        Handlers::new()
            .with_meta("size", facet(ReadGroup::Archive, &["size"]))
            .with_meta("hash", facet(ReadGroup::Archive, &["hash"]))
            .with_meta("downloads", facet(ReadGroup::Stats, &["downloads"])),
    );
    let body = call_ok(
        &router,
        "/precise/wordpress-42/meta/any?include=size&include=hash&include=downloads",
    )
    .await;
    assert_eq!(reader.queries(), 2);
    assert_eq!(body["Meta"]["size"], json!(["hash", "size"]));
    assert_eq!(body["Meta"]["hash"], json!(["hash", "size"]));
    assert_eq!(body["Meta"]["downloads"], json!(["downloads"]));
}

#[tokio::test]
async fn test_meta_any_passes_extra_flags() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    let body = call_ok(
        &router,
        "/precise/wordpress-42/meta/any?include=foo&arble=bletch",
    )
    .await;
    assert_eq!(body["Meta"]["foo"]["Flags"], json!({"arble": ["bletch"]}));
}

#[tokio::test]
async fn test_meta_any_unrecognized_include() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    let err = call_err(&router, "/precise/wordpress-42/meta/any?include=foo&include=mistaek").await;
    assert_eq!(
        err,
        RouterError::UnrecognizedFacet {
            name: "mistaek".to_string()
        }
    );
}

#[tokio::test]
async fn test_owner_is_part_of_identity() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    let unowned = call_ok(&router, "/precise/wordpress-42/meta/foo").await;
    let owned = call_ok(&router, "/~joe/precise/wordpress-42/meta/foo").await;
    assert_ne!(unowned, owned);
    assert_eq!(owned["CharmURL"], json!("cs:~joe/precise/wordpress-42"));
    assert_eq!(unowned["Path"], owned["Path"]);
    assert_eq!(unowned["Flags"], owned["Flags"]);
}

// ============================================================
// Bulk metadata
// ============================================================

#[tokio::test]
async fn test_bulk_meta_single_id() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    assert_eq!(
        call_ok(&router, "/meta/foo?id=precise/wordpress-42").await,
        json!({"precise/wordpress-42": meta_info("cs:precise/wordpress-42", "")})
    );
}

#[tokio::test]
async fn test_bulk_meta_several_ids() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    assert_eq!(
        call_ok(&router, "/meta/foo?id=precise/wordpress-42&id=quantal/foo-32").await,
        json!({
            "precise/wordpress-42": meta_info("cs:precise/wordpress-42", ""),
            "quantal/foo-32": meta_info("cs:quantal/foo-32", ""),
        })
    );
}

#[tokio::test]
async fn test_bulk_meta_any_several_ids() {
    let router = router(
        Handlers::new()
            .with_meta("foo", test_meta())
            .with_meta("bar/", test_meta()),
    );
    assert_eq!(
        call_ok(
            &router,
            "/meta/any?id=precise/wordpress-42&id=quantal/foo-32&include=foo&include=bar/something"
        )
        .await,
        json!({
            "precise/wordpress-42": {
                "Id": "cs:precise/wordpress-42",
                "Meta": {
                    "foo": meta_info("cs:precise/wordpress-42", ""),
                    "bar/something": meta_info("cs:precise/wordpress-42", "/something"),
                },
            },
            "quantal/foo-32": {
                "Id": "cs:quantal/foo-32",
                "Meta": {
                    "foo": meta_info("cs:quantal/foo-32", ""),
                    "bar/something": meta_info("cs:quantal/foo-32", "/something"),
                },
            },
        })
    );
}

#[tokio::test]
async fn test_bulk_meta_with_unresolved_id() {
    let router = Router::new(
        Handlers::new().with_meta("foo/", test_meta()),
        Arc::new(DefaultingResolver::new("precise", 100)),
    );
    assert_eq!(
        call_ok(&router, "/meta/foo/bar?id=wordpress").await,
        json!({"wordpress": meta_info("cs:precise/wordpress-100", "/bar")})
    );
}

#[tokio::test]
async fn test_bulk_meta_with_extra_flags() {
    let router = Router::new(
        Handlers::new().with_meta("foo/", test_meta()),
        Arc::new(DefaultingResolver::new("precise", 100)),
    );
    assert_eq!(
        call_ok(&router, "/meta/foo/bar?id=wordpress&arble=bletch&z=w&z=p").await,
        json!({
            "wordpress": {
                "CharmURL": "cs:precise/wordpress-100",
                "Path": "/bar",
                "Flags": {"arble": ["bletch"], "z": ["w", "p"]},
            },
        })
    );
}

#[tokio::test]
async fn test_bulk_meta_with_no_ids() {
    let router = router(Handlers::new().with_meta("foo/", test_meta()));
    let err = call_err(&router, "/meta/foo/bar").await;
    assert!(matches!(err, RouterError::BadRequest { .. }));
    assert_eq!(
        err.to_envelope(),
        json!({"message": "no ids specified in meta request"})
    );
}

#[tokio::test]
async fn test_bulk_meta_reads_once_per_entity() {
    let reader = Arc::new(CountingReader::default());
    let router = router(
        Handlers::new()
            .with_meta("a", field_select("handler1", &reader, &["a"]))
            .with_meta("b", field_select("handler2", &reader, &["b"])),
    );
    let body = call_ok(
        &router,
        "/meta/any?id=precise/wordpress-42&id=trusty/mysql-1&id=precise/wordpress-42&include=a&include=b",
    )
    .await;
    // One read per distinct literal id.
    assert_eq!(reader.queries(), 2);
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_meta_isolates_backend_failure() {
    let reader = Arc::new(CountingReader::default());
    let router = router(
        Handlers::new().with_meta("foo", field_select("handler1", &reader, &["field1"])),
    );
    let body = call_ok(&router, "/meta/foo?id=precise/wordpress-42&id=precise/bad-1").await;
    assert_eq!(
        body["precise/wordpress-42"],
        field_info("handler1", "cs:precise/wordpress-42", &["field1"], "")
    );
    assert_eq!(
        body["precise/bad-1"],
        json!({"message": "entity not found: cs:precise/bad-1"})
    );
}

#[tokio::test]
async fn test_bulk_meta_resolve_failure_fails_request() {
    let router = Router::new(
        Handlers::new().with_meta("foo", test_meta()),
        Arc::new(GhostResolver),
    );
    let err = call_err(&router, "/meta/foo?id=precise/wordpress-42&id=ghost&id=~joe/ghost").await;
    assert!(matches!(err, RouterError::Resolve(_)));
    assert_eq!(err.to_string(), r#"no matching entity for "cs:ghost""#);
}

#[tokio::test]
async fn test_bulk_meta_invalid_id_fails_request() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    let err = call_err(&router, "/meta/foo?id=precise/wordpress-42&id=~bad-/wordpress").await;
    assert!(matches!(err, RouterError::InvalidReference(_)));
}

#[tokio::test]
async fn test_bulk_meta_unknown_facet_is_not_found() {
    let router = router(Handlers::new().with_meta("foo", test_meta()));
    let err = call_err(&router, "/meta/nope?id=precise/wordpress-42").await;
    assert_eq!(err, RouterError::NotFound);
}

// ============================================================
// get_metadata
// ============================================================

fn metadata_router(reader: &Arc<CountingReader>) -> Router {
    router(
        Handlers::new()
            .with_meta("item1", field_select("handler1", reader, &["item1"]))
            .with_meta("item2", field_select("handler2", reader, &["item2"]))
            .with_meta("test", test_meta()),
    )
}

#[tokio::test]
async fn test_get_metadata_no_names() {
    let reader = Arc::new(CountingReader::default());
    let router = metadata_router(&reader);
    let id: EntityRef = "precise/wordpress-34".parse().unwrap();

    let result = router.get_metadata(&id, &[]).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(reader.queries(), 0);
}

#[tokio::test]
async fn test_get_metadata_batches_reads() {
    let reader = Arc::new(CountingReader::default());
    let router = metadata_router(&reader);
    let id: EntityRef = "~rog/precise/wordpress-2".parse().unwrap();

    let result = router
        .get_metadata(&id, &["item1", "item2", "test"])
        .await
        .unwrap();

    let url = "cs:~rog/precise/wordpress-2";
    assert_eq!(
        Value::Object(result),
        json!({
            "item1": field_info("handler1", url, &["item1", "item2"], ""),
            "item2": field_info("handler2", url, &["item1", "item2"], ""),
            "test": meta_info(url, ""),
        })
    );
    assert_eq!(reader.queries(), 1);
}

#[tokio::test]
async fn test_get_metadata_unrecognized_name() {
    let reader = Arc::new(CountingReader::default());
    let router = metadata_router(&reader);
    let id: EntityRef = "~rog/precise/wordpress-2".parse().unwrap();

    let err = router
        .get_metadata(&id, &["item1", "mistaek"])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), r#"unrecognized metadata name "mistaek""#);
    assert_eq!(reader.queries(), 0);
}

// ============================================================
// Cancellation
// ============================================================

fn stalled_router() -> Router {
    router(
        Handlers::new()
            .with_meta(
                "slow",
                BulkIncludeHandler::field_select("slow", ["x"], Arc::new(StalledReader), |_, _, _, _| {
                    Ok(Value::Null)
                }),
            )
            .with_meta("foo", test_meta()),
    )
}

#[tokio::test]
async fn test_dispatch_until_cancelled() {
    let router = stalled_router();
    let err = router
        .dispatch_until(&request("/precise/wordpress-42/meta/slow"), async {})
        .await
        .unwrap_err();
    assert_eq!(err, RouterError::Cancelled);
    assert_eq!(err.to_string(), "request cancelled");
}

#[tokio::test]
async fn test_dispatch_until_completes_first() {
    let router = stalled_router();
    let reply = router
        .dispatch_until(
            &request("/precise/wordpress-42/meta/foo"),
            futures::future::pending(),
        )
        .await
        .unwrap();
    assert_eq!(reply.body, Some(meta_info("cs:precise/wordpress-42", "")));
}

#[tokio::test]
async fn test_abandoned_request_does_not_affect_others() {
    let router = Arc::new(stalled_router());

    let slow = {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            tokio::time::timeout(
                Duration::from_millis(20),
                router.dispatch(&request("/meta/slow?id=precise/wordpress-42")),
            )
            .await
        })
    };
    let fast = call_ok(&router, "/meta/foo?id=precise/wordpress-42").await;

    assert!(slow.await.unwrap().is_err());
    assert_eq!(
        fast,
        json!({"precise/wordpress-42": meta_info("cs:precise/wordpress-42", "")})
    );
}
