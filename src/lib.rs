//! Client-side network inspector.
//!
//! Wraps the HTTP request primitive, decodes calls to the backend's REST
//! surface into `{table, operation, query}` and keeps the most recent calls in
//! two bounded logs for a live inspector panel.

pub mod classifier;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod inspector;
pub mod interceptor;
pub mod introspect;
pub mod log_buffer;
pub mod subscription;
pub mod transport;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, FetchError};
pub use fetch::{Fetch, FetchHandle, FetchRequest, FetchResponse};
pub use inspector::{InstallOutcome, Inspector, InspectorStats};
pub use transport::ReqwestFetch;
pub use types::{ApiLogEntry, LogEntry, LogKind, Operation, RestLogEntry};
