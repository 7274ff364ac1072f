//! # cap-db
//!
//! libSQL storage for captable: projects, cap tables, investors,
//! subscriptions, token allocations, redemptions, investor groups and the
//! append-only activity log.
//!
//! Every mutation goes through [`service::CapService`] and requires a
//! [`cap_core::identity::Capability`]. Deletes of projects, investors and
//! subscriptions run through the [`cascade`] planner inside one transaction.

pub mod cascade;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Database handle: a libSQL database and its single connection.
pub struct CapDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl CapDb {
    /// Open a local database at `path` (`":memory:"` for tests).
    ///
    /// Enables foreign keys and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db).await
    }

    /// Open a remote libSQL database (e.g. Turso) over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or migrations fail.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        Self::init(db).await
    }

    async fn init(db: libsql::Database) -> Result<Self, DatabaseError> {
        let conn = db.connect()?;

        // Per-connection in SQLite; the cascade relies on it as a backstop.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let cap_db = Self { db, conn };
        cap_db.run_migrations().await?;
        Ok(cap_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL, e.g. `"prj-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
