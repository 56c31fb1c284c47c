//! Cache backends for SharePoint session cookies.
//!
//! The session layer keeps a single slot of [`SessionCookies`] under a fixed
//! cache id. Entries carry no TTL: validity is decided reactively by the
//! digest call. Two backends are provided:
//!
//! - [`MemoryCache`]: process-local map behind a tokio `RwLock`
//! - [`SqliteCache`]: persistent store via tokio-rusqlite, so sessions survive
//!   process restarts

pub mod memory;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

pub use crate::Error;
use crate::SessionCookies;

pub use sqlite::SqliteCache;
pub use memory::MemoryCache;

/// Cache id used when none is configured.
pub const DEFAULT_CACHE_ID: &str = "spfed:access_token";

/// Storage for session cookies keyed by cache id.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Cached cookies for `cid`, or `None` on a miss.
    async fn get(&self, cid: &str) -> Result<Option<SessionCookies>, Error>;

    /// Store `cookies` under `cid`, replacing any previous entry.
    async fn set(&self, cid: &str, cookies: &SessionCookies) -> Result<(), Error>;

    /// Remove the entry for `cid`, if any.
    async fn delete(&self, cid: &str) -> Result<(), Error>;
}
