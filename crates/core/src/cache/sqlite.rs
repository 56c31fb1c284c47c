//! Persistent cache backend on SQLite.
//!
//! Cookies are stored as JSON text in `cache_entries`; the row for a cache id
//! is replaced on every write.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

use super::{CacheBackend, schema};
use crate::{Error, SessionCookies};

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA busy_timeout=5000;";

/// Session cache that survives process restarts.
///
/// Database work runs on tokio-rusqlite's background thread.
#[derive(Clone, Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open or create the cache file at `path` and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;
        schema::upgrade(&conn).await?;

        Ok(Self { conn })
    }

    /// Number of stored entries.
    pub async fn len(&self) -> Result<i64, Error> {
        self.conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0)))
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl CacheBackend for SqliteCache {
    async fn get(&self, cid: &str) -> Result<Option<SessionCookies>, Error> {
        let cid = cid.to_string();
        let data: Option<String> = self
            .conn
            .call(move |conn| {
                conn.query_row("SELECT data FROM cache_entries WHERE cid = ?1", params![cid], |row| row.get(0))
                    .optional()
            })
            .await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, cid: &str, cookies: &SessionCookies) -> Result<(), Error> {
        let cid = cid.to_string();
        let data = serde_json::to_string(cookies)?;
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cache_entries (cid, data, created_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(cid) DO UPDATE SET data = excluded.data, created_at = excluded.created_at",
                    params![cid, data, created_at],
                )
            })
            .await?;

        tracing::debug!("session stored in SQLite cache");
        Ok(())
    }

    async fn delete(&self, cid: &str) -> Result<(), Error> {
        let cid = cid.to_string();
        self.conn
            .call(move |conn| conn.execute("DELETE FROM cache_entries WHERE cid = ?1", params![cid]))
            .await?;
        Ok(())
    }
}
