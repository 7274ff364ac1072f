//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` so re-running is a no-op.

use crate::CapDb;
use crate::error::DatabaseError;

/// Initial schema: 11 tables, 13 indexes, 2 append-only triggers.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

/// Multi-signature wallets: 3 tables, 1 index.
const MIGRATION_002: &str = include_str!("../migrations/002_wallets.sql");

impl CapDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        self.conn
            .execute_batch(MIGRATION_002)
            .await
            .map_err(|e| DatabaseError::Migration(format!("002_wallets: {e}")))?;
        Ok(())
    }
}
