//! Error types for the calculation and aggregation core.
//!
//! Every error carries a machine-readable kind plus a human-readable
//! message. Validation failures are raised before any persistence
//! attempt; storage failures abort the enclosing transaction and are
//! re-raised to the caller — the core never retries on its own.

use thiserror::Error;

/// Errors surfaced by the core to its collaborators.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad or missing input: malformed payload field, negative
    /// quantity, unknown scope/status string, invalid period format.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced organization/facility/factor/record does not exist
    /// (or is soft-deleted and the caller asked for active rows only).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness violation, e.g. a second factor for the same
    /// (scope, category, subcategory, region, valid_year).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence failure. Always surfaced, never swallowed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Schema migration failure on open. Reported as a storage-kind
    /// error at the boundary.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Storage(_) | CoreError::Migration(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

/// Serializable error representation for the transport collaborator.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CoreError> for ApiError {
    fn from(err: &CoreError) -> Self {
        ApiError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
