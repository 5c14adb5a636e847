//! Error types for Simple Service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Startup Errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Authentication Errors
    #[error("Malformed credentials: {0}")]
    CredentialsMalformed(String),

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Bind rejected: {0}")]
    BindRejected(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "ConfigurationError",
            Error::CredentialsMalformed(_) => "CredentialsMalformed",
            Error::DirectoryUnavailable(_) => "DirectoryUnavailable",
            Error::BindRejected(_) => "BindRejected",
            Error::Io(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            // Every failure on the authentication path is reported the same way
            Error::CredentialsMalformed(_)
            | Error::DirectoryUnavailable(_)
            | Error::BindRejected(_) => 401,

            _ => 500,
        }
    }
}
