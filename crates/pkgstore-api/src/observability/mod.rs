//! Observability infrastructure.
//!
//! Structured logging setup for the server binary and for tests that
//! capture log output.

mod logging;

pub use logging::{create_json_layer, init_logging, parse_log_level, LoggingConfig};

#[cfg(test)]
pub(crate) use logging::tests::CaptureWriter;
