//! Mercata Core — shared domain models, error taxonomy, and repository
//! traits for the tenant entitlement and lifecycle platform.

pub mod error;
pub mod models;
pub mod repository;
