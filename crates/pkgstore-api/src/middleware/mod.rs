//! API middleware.
//!
//! Includes:
//! - Request ID generation and propagation
//! - Request logging

mod logging;
mod request_id;

pub use logging::RequestLoggingLayer;
pub use request_id::{RequestIdLayer, REQUEST_ID_HEADER};
