//! Core types and shared functionality for spfed.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration
//! - Session cookie type and cache backends (memory, SQLite)
//! - Credential stores and the credential resolver

pub mod cache;
pub mod config;
pub mod cookies;
pub mod credentials;
pub mod error;

pub use cache::{CacheBackend, MemoryCache, SqliteCache};
pub use config::AppConfig;
pub use cookies::SessionCookies;
pub use credentials::{CredentialStore, Credentials, resolve_credentials};
pub use error::Error;
