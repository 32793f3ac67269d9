//! Metadata requests: `meta/<name>`, `meta/any` and their bulk forms.

use std::collections::HashSet;

use futures::future::join_all;
use pkgstore_domain::{parse_reference, EntityRef};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::dispatch::Router;
use super::error::{RouterError, RouterResult};
use super::group::{query_facets, FacetCall};
use super::path::handler_key;
use super::request::{QueryParams, Request};

/// Facet name that selects several facets through `include` parameters.
pub const ANY: &str = "any";

/// Query parameter naming the entities of a bulk request.
pub const ID_PARAM: &str = "id";

/// Query parameter naming the facets of a `meta/any` request.
pub const INCLUDE_PARAM: &str = "include";

/// Body of a `meta/any` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaAnyResponse {
    #[serde(rename = "Id")]
    pub id: EntityRef,
    #[serde(rename = "Meta", skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Router {
    /// Serves `path` (the part after `meta`) for one resolved entity.
    pub(crate) async fn serve_meta(
        &self,
        id: &EntityRef,
        path: &str,
        request: &Request,
    ) -> RouterResult<Value> {
        let (key, rest) = handler_key(path);
        if key == ANY {
            let flags = request.params.without(&[ID_PARAM, INCLUDE_PARAM]);
            let includes = request.params.get_all(INCLUDE_PARAM);
            let meta = self
                .meta_any(id, includes.iter().map(String::as_str), &flags)
                .await?;
            let response = MetaAnyResponse {
                id: id.clone(),
                meta,
            };
            return serde_json::to_value(response).map_err(|e| RouterError::handler(e.to_string()));
        }

        let handler = self.meta.get(&key).ok_or(RouterError::NotFound)?;
        let flags = request.params.without(&[ID_PARAM]);
        let mut values = query_facets(id, &[FacetCall { handler, path: rest }], &flags).await?;
        Ok(values.pop().unwrap_or_default())
    }

    /// Serves `/meta/<path>?id=...`, keyed by the literal id strings.
    ///
    /// A backend failure only replaces its own entity's entry with an
    /// error envelope. Any other failure fails the whole request with the
    /// error of the first failing id in request order.
    pub(crate) async fn serve_bulk_meta(&self, path: &str, request: &Request) -> RouterResult<Value> {
        let ids = request.params.get_all(ID_PARAM);
        if ids.is_empty() {
            return Err(RouterError::no_ids());
        }

        let mut seen = HashSet::new();
        let literals: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|literal| seen.insert(*literal))
            .collect();

        let entries = join_all(
            literals
                .iter()
                .map(|literal| self.bulk_entry(literal, path, request)),
        )
        .await;

        let mut response = Map::new();
        for (literal, entry) in literals.iter().zip(entries) {
            let value = match entry {
                Ok(value) => value,
                Err(err) if err.is_per_entity() => {
                    warn!(id = %literal, error = %err, "bulk metadata entry failed");
                    err.to_envelope()
                }
                Err(err) => return Err(err),
            };
            response.insert(literal.to_string(), value);
        }
        Ok(Value::Object(response))
    }

    async fn bulk_entry(&self, literal: &str, path: &str, request: &Request) -> RouterResult<Value> {
        let id = parse_reference(literal).map_err(RouterError::InvalidReference)?;
        let id = self
            .resolver
            .resolve(id)
            .await
            .map_err(RouterError::Resolve)?;
        self.serve_meta(&id, path, request).await
    }

    /// Computes the named facets for `id`, outside any HTTP request.
    ///
    /// Names follow the same key rules as `include` values. The reference
    /// is used as given; it is not passed through the resolver. Fails with
    /// [`RouterError::UnrecognizedFacet`] before any backend read when a
    /// name has no handler.
    pub async fn get_metadata(
        &self,
        id: &EntityRef,
        names: &[&str],
    ) -> RouterResult<Map<String, Value>> {
        self.meta_any(id, names.iter().copied(), &QueryParams::new())
            .await
    }

    async fn meta_any<'a>(
        &'a self,
        id: &EntityRef,
        names: impl IntoIterator<Item = &'a str>,
        flags: &QueryParams,
    ) -> RouterResult<Map<String, Value>> {
        let named = self.facet_calls(names)?;
        let calls: Vec<FacetCall<'_>> = named.iter().map(|(_, call)| *call).collect();
        let values = query_facets(id, &calls, flags).await?;
        Ok(named
            .into_iter()
            .map(|(name, _)| name.to_string())
            .zip(values)
            .collect())
    }

    /// Looks up each distinct name's handler, keeping first-seen order.
    fn facet_calls<'a>(
        &'a self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> RouterResult<Vec<(&'a str, FacetCall<'a>)>> {
        let mut seen = HashSet::new();
        let mut calls = Vec::new();
        for name in names {
            if !seen.insert(name) {
                continue;
            }
            let (key, path) = handler_key(name);
            let handler = self
                .meta
                .get(&key)
                .ok_or_else(|| RouterError::UnrecognizedFacet {
                    name: name.to_string(),
                })?;
            calls.push((name, FacetCall { handler, path }));
        }
        Ok(calls)
    }
}
