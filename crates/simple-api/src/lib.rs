//! HTTP API for Simple Service

pub mod access;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;

pub use access::{Access, AccessRule, AccessRules, PathPattern};
pub use metrics::MetricsRecorder;
pub use server::{ApiServer, AppState};
