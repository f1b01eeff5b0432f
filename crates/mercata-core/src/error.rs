//! Error types for the Mercata system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MercataError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Not authenticated: no tenant identity")]
    Unauthenticated,

    #[error("Feature not available on current plan: {feature}")]
    FeatureDenied { feature: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MercataResult<T> = Result<T, MercataError>;
