//! Simple Service Core Library
//!
//! Configuration, error taxonomy and the request-scoped value types shared by
//! the authentication gate and the HTTP layer.

pub mod config;
pub mod error;
pub mod types;

pub use config::ServiceConfig;
pub use error::{Error, Result};

/// Simple Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder substituted with the username in user DN patterns
pub const DN_PLACEHOLDER: &str = "{0}";

/// Default realm announced in Basic challenges
pub const DEFAULT_REALM: &str = "Realm";

/// Default directory operation timeout in seconds
pub const DEFAULT_DIRECTORY_TIMEOUT_SECS: u64 = 10;
