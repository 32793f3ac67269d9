//! Reference resolution.
//!
//! The router never fills in series or revision itself; it hands every
//! reference taken from a request to an [`EntityResolver`]. Store-backed
//! resolution lives with the storage adapters in the API crate. The
//! resolvers here are the trivial ones.

mod traits;

use async_trait::async_trait;

use crate::entity::EntityRef;
use crate::error::DomainResult;

pub use traits::{DocumentReader, EntityResolver};

/// Resolver that returns every reference unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

#[async_trait]
impl EntityResolver for IdentityResolver {
    async fn resolve(&self, id: EntityRef) -> DomainResult<EntityRef> {
        Ok(id)
    }
}

/// Resolver that fills a missing series and revision with fixed defaults.
#[derive(Debug, Clone)]
pub struct DefaultingResolver {
    series: String,
    revision: u32,
}

impl DefaultingResolver {
    pub fn new(series: impl Into<String>, revision: u32) -> Self {
        Self {
            series: series.into(),
            revision,
        }
    }
}

#[async_trait]
impl EntityResolver for DefaultingResolver {
    async fn resolve(&self, id: EntityRef) -> DomainResult<EntityRef> {
        let id = match id.series() {
            Some(_) => id,
            None => id.with_series(self.series.clone())?,
        };
        Ok(match id.revision() {
            Some(_) => id,
            None => id.with_revision(self.revision),
        })
    }
}
