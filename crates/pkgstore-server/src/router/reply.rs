//! Handler replies and closure adapters.

use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::error::{RouterError, RouterResult};
use super::handlers::GlobalHandler;
use super::request::Request;

/// Status code of a successful reply.
pub const STATUS_OK: u16 = 200;

/// A successful handler result: status plus optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Option<Value>,
}

impl Reply {
    /// A 200 reply with a JSON body.
    pub fn json(body: Value) -> Self {
        Self {
            status: STATUS_OK,
            body: Some(body),
        }
    }

    /// A reply with the given status and no body.
    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    /// Serializes `value` into a reply with the given status.
    pub fn serialize<T: Serialize>(status: u16, value: &T) -> RouterResult<Self> {
        let body = serde_json::to_value(value).map_err(|e| RouterError::handler(e.to_string()))?;
        Ok(Self {
            status,
            body: Some(body),
        })
    }
}

/// Global handler built from a closure returning a serializable value.
pub struct HandleJson<F>(F);

/// Adapts `f` into a [`GlobalHandler`] whose result becomes a 200 JSON body.
pub fn handle_json<F, Fut, T>(f: F) -> HandleJson<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = RouterResult<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    HandleJson(f)
}

#[async_trait]
impl<F, Fut, T> GlobalHandler for HandleJson<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = RouterResult<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    async fn handle(&self, _path: &str, request: &Request) -> RouterResult<Reply> {
        let value = (self.0)(request.clone()).await?;
        Reply::serialize(STATUS_OK, &value)
    }
}

/// Global handler built from a closure that picks its own reply.
pub struct HandleErrors<F>(F);

/// Adapts `f` into a [`GlobalHandler`]; errors become the usual envelope.
pub fn handle_errors<F, Fut>(f: F) -> HandleErrors<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = RouterResult<Reply>> + Send + 'static,
{
    HandleErrors(f)
}

#[async_trait]
impl<F, Fut> GlobalHandler for HandleErrors<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = RouterResult<Reply>> + Send + 'static,
{
    async fn handle(&self, _path: &str, request: &Request) -> RouterResult<Reply> {
        (self.0)(request.clone()).await
    }
}
