//! Unified error types for spfed.
//!
//! Every failure in the auth chain maps onto one of these classes so callers
//! can decide between retrying, re-prompting for credentials, or giving up.

use tokio_rusqlite::rusqlite;

/// Unified error types for the SharePoint session client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid credentials. Never retried.
    #[error("CREDENTIAL_ERROR: {0}")]
    Credential(String),

    /// Transport failure on a remote call.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Empty token or rejected digest after a successful HTTP exchange.
    #[error("AUTH_ERROR: {0}")]
    Auth(String),

    /// Malformed XML.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Target URL could not be parsed.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Cached value could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// The remote post collaborator failed.
    #[error("DELIVERY_FAILED: {0}")]
    Delivery(String),
}

impl Error {
    /// Message without the class prefix, suitable for end users.
    pub fn message(&self) -> String {
        match self {
            Error::Credential(msg)
            | Error::Network(msg)
            | Error::Auth(msg)
            | Error::Parse(msg)
            | Error::InvalidUrl(msg)
            | Error::MigrationFailed(msg)
            | Error::Serialization(msg)
            | Error::Delivery(msg) => msg.clone(),
            Error::Database(e) => e.to_string(),
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
