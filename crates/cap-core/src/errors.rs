//! Cross-cutting error types for captable.
//!
//! Storage errors (`DatabaseError`) and configuration errors (`ConfigError`)
//! live in their own crates. The CLI converges all of them into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any captable crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// The acting user lacks the permission for the requested operation.
    #[error("Forbidden: {actor} may not {permission} {target}")]
    Forbidden {
        actor: String,
        permission: String,
        target: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
