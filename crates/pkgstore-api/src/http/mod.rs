//! HTTP surface.
//!
//! | Endpoint  | Description |
//! |-----------|-------------|
//! | `/health` | Liveness check |
//! | `/ready`  | Readiness check (storage reachable) |
//! | anything else | Dispatched through the request [`Router`](pkgstore_server::Router) |
//!
//! Every dispatch error is answered with status 500 and a
//! `{"message": ..., "code": ...}` body.

pub mod routes;
pub mod state;

pub use routes::{
    create_router, create_router_with_timeout, write_error, write_json, write_reply, ApiError,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use state::AppState;
