//! Database-specific error types and conversions.

use mercata_core::error::MercataError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Failed to decode record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for MercataError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => MercataError::NotFound { entity, id },
            other => MercataError::Database(other.to_string()),
        }
    }
}
