//! HTTP route definitions and handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, warn};

use pkgstore_server::{QueryParams, Reply, Request, RouterError};
use pkgstore_storage::DocumentStore;

use super::state::AppState;
use crate::middleware::{RequestIdLayer, RequestLoggingLayer};

/// Request timeout used by [`create_router`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates the HTTP router with the default request timeout.
pub fn create_router<S: DocumentStore>(state: AppState<S>) -> Router {
    create_router_with_timeout(state, DEFAULT_REQUEST_TIMEOUT)
}

/// Creates the HTTP router.
///
/// Requests running longer than `timeout` are abandoned and answered with
/// 408; the in-flight dispatch is dropped along with any pending reads.
/// Only GET (and HEAD) requests reach the request router.
pub fn create_router_with_timeout<S: DocumentStore>(state: AppState<S>, timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<S>))
        .fallback(get(dispatch::<S>).fallback(method_not_allowed))
        .with_state(Arc::new(state))
        .layer(TimeoutLayer::new(timeout))
        .layer(RequestLoggingLayer::new())
        .layer(RequestIdLayer::new())
}

// ============================================================
// Error Handling
// ============================================================

/// Error body sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&RouterError> for ApiError {
    fn from(err: &RouterError) -> Self {
        Self {
            message: err.to_string(),
            code: err.code().map(str::to_string),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Writes `value` as a JSON response with the given status.
pub fn write_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    (status, Json(value)).into_response()
}

/// Writes the error envelope. Every router error is a 500.
pub fn write_error(err: &RouterError) -> Response {
    match err {
        RouterError::Backend(_) | RouterError::Handler { .. } | RouterError::Cancelled => {
            error!(error = %err, code = err.code(), "request failed");
        }
        _ => warn!(error = %err, "request rejected"),
    }
    ApiError::from(err).into_response()
}

/// Writes a successful handler reply.
pub fn write_reply(reply: Reply) -> Response {
    let status = match StatusCode::from_u16(reply.status) {
        Ok(status) => status,
        Err(_) => {
            return write_error(&RouterError::handler(format!(
                "invalid reply status {}",
                reply.status
            )))
        }
    };
    match reply.body {
        Some(body) => write_json(status, &body),
        None => status.into_response(),
    }
}

// ============================================================
// Handlers
// ============================================================

/// Health check - always answers while the process is up.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness check - 200 when the store answers its health check, else 503.
///
/// Error details are logged but not exposed in the response.
async fn readiness_check<S: DocumentStore>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    match state.storage.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "checks": {
                    "storage": "ok"
                }
            })),
        ),
        Err(e) => {
            error!("Readiness check failed: storage unavailable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "checks": {
                        "storage": "unavailable"
                    }
                })),
            )
        }
    }
}

/// Routes every other request through the request router.
async fn dispatch<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    uri: Uri,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(pairs)) => QueryParams::from_pairs(pairs),
        Err(rejection) => {
            return write_error(&RouterError::BadRequest {
                message: rejection.body_text(),
            })
        }
    };
    let path = match percent_decode_str(uri.path()).decode_utf8() {
        Ok(path) => path.into_owned(),
        Err(err) => {
            return write_error(&RouterError::BadRequest {
                message: format!("invalid path encoding: {}", err),
            })
        }
    };
    let request = Request::new(path).with_params(params);
    debug!(path = %request.path, params = request.params.len(), "dispatching");

    match state.router.dispatch(&request).await {
        Ok(reply) => write_reply(reply),
        Err(err) => write_error(&err),
    }
}

/// Answers any method other than GET with the error envelope.
async fn method_not_allowed(method: Method) -> Response {
    write_error(&RouterError::BadRequest {
        message: format!("method {} not allowed", method),
    })
}
