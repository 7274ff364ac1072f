//! Database error types for cap-db.

use cap_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A project with this name already exists. Raised before any write.
    #[error("A project named '{name}' already exists")]
    DuplicateName { name: String },

    /// A single-row lookup returned nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The capability does not cover the requested mutation.
    #[error(transparent)]
    Forbidden(CoreError),

    /// A store-level failure reported as text. Raised by `CascadeStore`
    /// implementations that are not backed by libSQL; libSQL errors arrive
    /// as `Backend`.
    #[error("Query failed: {0}")]
    Query(String),

    /// A row does not match the model (bad enum, datetime or JSON).
    #[error("Row mapping failed: {0}")]
    Mapping(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The requested change is not valid for the row's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    Backend(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}
