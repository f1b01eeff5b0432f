//! SurrealDB repository implementations.

mod plan;
mod tenant;

pub use plan::SurrealPlanRepository;
pub use tenant::SurrealTenantRepository;
