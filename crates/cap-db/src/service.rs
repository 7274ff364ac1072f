//! Service layer: the single entry point for reads and capability-checked
//! mutations. Repository modules add methods through `impl CapService`.

use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::{Capability, EntityRef};
use libsql::{Transaction, TransactionBehavior};
use tracing::warn;

use crate::CapDb;
use crate::error::DatabaseError;

/// Owns the database handle. Every mutation follows the same protocol:
/// 1. Check the capability
/// 2. Begin a transaction
/// 3. Execute SQL and append the activity entry
/// 4. Commit, or roll back on the first error
pub struct CapService {
    db: CapDb,
}

impl CapService {
    /// Open a local database and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: CapDb::open_local(db_path).await?,
        })
    }

    /// Open a remote libSQL database and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: CapDb::open_remote(url, auth_token).await?,
        })
    }

    #[must_use]
    pub const fn from_db(db: CapDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &CapDb {
        &self.db
    }

    pub(crate) async fn begin(&self) -> Result<Transaction, DatabaseError> {
        Ok(self.db.conn().transaction().await?)
    }

    /// `BEGIN IMMEDIATE`: takes the write lock up front so concurrent
    /// cascades serialize instead of deadlocking on lock upgrade.
    pub(crate) async fn begin_immediate(&self) -> Result<Transaction, DatabaseError> {
        Ok(self
            .db
            .conn()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?)
    }
}

/// Commit on `Ok`, roll back on `Err`. A failed rollback is logged and the
/// original error is returned.
pub(crate) async fn finish<T>(
    tx: Transaction,
    result: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(%rollback_error, "rollback failed");
            }
            Err(error)
        }
    }
}

pub(crate) fn authorize(
    cap: &Capability,
    permission: Permission,
    target: &EntityRef,
) -> Result<(), DatabaseError> {
    cap.authorize(permission, target)
        .map_err(DatabaseError::Forbidden)
}

pub(crate) fn authorize_create(cap: &Capability, kind: EntityKind) -> Result<(), DatabaseError> {
    cap.authorize_kind(Permission::Create, kind)
        .map_err(DatabaseError::Forbidden)
}
