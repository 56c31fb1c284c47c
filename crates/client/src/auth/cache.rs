//! Process-wide session cookie slot.

use std::sync::Arc;

use spfed_core::cache::{CacheBackend, DEFAULT_CACHE_ID};
use spfed_core::{Error, MemoryCache, SessionCookies};
use tokio::sync::{Mutex, MutexGuard};

/// Single cache slot for session cookies, shared by every caller in the process.
///
/// Holds the refresh lock so that concurrent callers hitting an expired or
/// missing session run one token chain between them.
pub struct SessionCache {
    backend: Arc<dyn CacheBackend>,
    cache_id: String,
    refresh: Mutex<()>,
}

impl SessionCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend, cache_id: DEFAULT_CACHE_ID.to_string(), refresh: Mutex::new(()) }
    }

    /// Session cache backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    pub fn with_cache_id(mut self, cache_id: impl Into<String>) -> Self {
        self.cache_id = cache_id.into();
        self
    }

    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub async fn get(&self) -> Result<Option<SessionCookies>, Error> {
        self.backend.get(&self.cache_id).await
    }

    pub async fn set(&self, cookies: &SessionCookies) -> Result<(), Error> {
        self.backend.set(&self.cache_id, cookies).await
    }

    /// Drop the cached session so the next call re-authenticates.
    pub async fn invalidate(&self) -> Result<(), Error> {
        self.backend.delete(&self.cache_id).await
    }

    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }
}
