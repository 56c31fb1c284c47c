//! In-memory cache backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::CacheBackend;
use crate::{Error, SessionCookies};

/// Process-local cache.
///
/// Uses a HashMap with tokio RwLock for concurrent access.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, SessionCookies>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, cid: &str) -> Result<Option<SessionCookies>, Error> {
        Ok(self.entries.read().await.get(cid).cloned())
    }

    async fn set(&self, cid: &str, cookies: &SessionCookies) -> Result<(), Error> {
        self.entries
            .write()
            .await
            .insert(cid.to_string(), cookies.clone());
        Ok(())
    }

    async fn delete(&self, cid: &str) -> Result<(), Error> {
        self.entries.write().await.remove(cid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies(value: &str) -> SessionCookies {
        let mut cookies = SessionCookies::new();
        cookies.insert("FedAuth", format!("FedAuth={value}"));
        cookies
    }

    #[tokio::test]
    async fn test_get_miss() {
        let cache = MemoryCache::new();
        assert!(cache.get("spfed:access_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replaces() {
        let cache = MemoryCache::new();
        cache.set("cid", &cookies("one")).await.unwrap();
        cache.set("cid", &cookies("two")).await.unwrap();

        let cached = cache.get("cid").await.unwrap().unwrap();
        assert_eq!(cached.get("FedAuth"), Some("FedAuth=two"));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("cid", &cookies("one")).await.unwrap();
        cache.delete("cid").await.unwrap();
        assert!(cache.get("cid").await.unwrap().is_none());
    }
}
