//! Schema versioning for the SQLite session cache.
//!
//! The applied version lives in `PRAGMA user_version`; each step below is
//! applied once, in order, inside its own transaction.

use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::{self, Transaction};

use super::Error;

/// Ordered schema steps. Step `n` moves the database to version `n + 1`.
const STEPS: &[&str] = &[include_str!("../../migrations/001_cache_entries.sql")];

/// Latest schema version.
pub const SCHEMA_VERSION: i64 = STEPS.len() as i64;

fn user_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn apply(tx: &Transaction<'_>, version: i64, sql: &str) -> rusqlite::Result<()> {
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", version)
}

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns `Error::MigrationFailed` if a step fails, the stored version is
/// negative, or the file was written by a newer schema.
pub async fn upgrade(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current = user_version(conn)?;
        if current < 0 {
            return Err(Error::MigrationFailed(format!("invalid cache schema version {current}")));
        }
        if current > SCHEMA_VERSION {
            return Err(Error::MigrationFailed(format!(
                "cache schema version {current} is newer than supported version {SCHEMA_VERSION}"
            )));
        }

        for (index, sql) in STEPS.iter().enumerate().skip(current as usize) {
            let version = index as i64 + 1;
            tracing::debug!(version, "upgrading cache schema");

            let tx = conn.transaction()?;
            apply(&tx, version, sql).map_err(|e| Error::MigrationFailed(format!("step {version}: {e}")))?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn version(conn: &Connection) -> i64 {
        conn.call(|conn| user_version(conn)).await.unwrap()
    }

    #[tokio::test]
    async fn test_upgrade_is_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        upgrade(&conn).await.unwrap();
        upgrade(&conn).await.unwrap();

        assert_eq!(version(&conn).await, SCHEMA_VERSION);

        let has_entries: bool = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='cache_entries')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert!(has_entries);
    }

    #[tokio::test]
    async fn test_newer_schema_rejected() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1))
            .await
            .unwrap();

        assert!(matches!(upgrade(&conn).await, Err(Error::MigrationFailed(_))));
    }

    #[tokio::test]
    async fn test_negative_schema_version_rejected() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| conn.pragma_update(None, "user_version", -1)).await.unwrap();

        assert!(matches!(upgrade(&conn).await, Err(Error::MigrationFailed(_))));
    }
}
