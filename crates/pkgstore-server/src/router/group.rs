//! Field-group batching of backend reads.
//!
//! Facets backed by [`FieldIncludeHandler`]s that share a grouping key are
//! served from one backend read per entity:
//!
//! 1. Partition the requested facets by grouping key
//! 2. Union each group's field selectors and read once with that selector
//! 3. Run every member's transform over the shared, read-only document
//!
//! Self-contained facets are queried independently. Group reads and
//! self-contained facets all run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join, join_all};
use pkgstore_domain::{EntityRef, FieldSelector};
use serde_json::Value;
use tracing::debug;

use super::error::{RouterError, RouterResult};
use super::handlers::{BulkIncludeHandler, FieldIncludeHandler, GroupKey, MetaHandler};
use super::request::QueryParams;

/// One facet to compute for an entity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FacetCall<'a> {
    pub handler: &'a BulkIncludeHandler,
    /// Path suffix after the facet's handler key.
    pub path: &'a str,
}

/// Facets sharing one backend read.
struct QueryGroup<'a> {
    /// First member; its reader serves the whole group.
    leader: &'a FieldIncludeHandler,
    selector: FieldSelector,
    members: Vec<(usize, &'a FieldIncludeHandler)>,
}

/// Computes every facet for `id`, returning values in facet order.
///
/// When several facets fail, the error of the first one in facet order is
/// returned.
pub(crate) async fn query_facets(
    id: &EntityRef,
    facets: &[FacetCall<'_>],
    flags: &QueryParams,
) -> RouterResult<Vec<Value>> {
    let mut groups: Vec<QueryGroup<'_>> = Vec::new();
    let mut key_to_group: HashMap<&GroupKey, usize> = HashMap::new();
    let mut singles: Vec<(usize, &Arc<dyn MetaHandler>)> = Vec::new();

    for (index, facet) in facets.iter().enumerate() {
        match facet.handler {
            BulkIncludeHandler::Single(handler) => singles.push((index, handler)),
            BulkIncludeHandler::FieldSelect(handler) => {
                let group = *key_to_group.entry(handler.key()).or_insert_with(|| {
                    groups.push(QueryGroup {
                        leader: handler,
                        selector: FieldSelector::new(),
                        members: Vec::new(),
                    });
                    groups.len() - 1
                });
                let group = &mut groups[group];
                group.selector.union_with(handler.fields().iter());
                group.members.push((index, handler));
            }
        }
    }

    debug!(
        entity = %id,
        facets = facets.len(),
        reads = groups.len(),
        singles = singles.len(),
        "querying facets"
    );

    let group_reads = groups.iter().map(|group| read_group(id, group, facets, flags));
    let single_calls = singles.iter().map(|&(index, handler)| async move {
        (index, handler.handle(id, facets[index].path, flags).await)
    });
    let (grouped, single) = join(join_all(group_reads), join_all(single_calls)).await;

    let mut results: Vec<(usize, RouterResult<Value>)> =
        grouped.into_iter().flatten().chain(single).collect();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

async fn read_group(
    id: &EntityRef,
    group: &QueryGroup<'_>,
    facets: &[FacetCall<'_>],
    flags: &QueryParams,
) -> Vec<(usize, RouterResult<Value>)> {
    match group.leader.reader().read(id, &group.selector).await {
        Ok(doc) => group
            .members
            .iter()
            .map(|&(index, handler)| {
                (index, handler.transform(&doc, id, facets[index].path, flags))
            })
            .collect(),
        Err(err) => {
            let err = RouterError::Backend(err);
            group
                .members
                .iter()
                .map(|&(index, _)| (index, Err(err.clone())))
                .collect()
        }
    }
}
