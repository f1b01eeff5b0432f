//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Services depend on these traits
//! rather than on a concrete database crate.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MercataResult;
use crate::models::plan::{CreatePlan, Plan, UpdatePlan};
use crate::models::tenant::{
    CreateTenant, PlanAssignment, Tenant, TenantStatus, UpdateTenant,
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// The plan catalog: stores and serves [`Plan`] records.
///
/// Pure data access — the only business rules here are name validation on
/// create and name uniqueness (soft-enforced via a unique index).
pub trait PlanRepository: Send + Sync {
    /// Fails with `Validation` if the name is empty and `AlreadyExists`
    /// if another plan carries the same name.
    fn create(&self, input: CreatePlan) -> impl Future<Output = MercataResult<Plan>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MercataResult<Plan>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = MercataResult<Plan>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePlan,
    ) -> impl Future<Output = MercataResult<Plan>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MercataResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MercataResult<PaginatedResult<Plan>>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = MercataResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MercataResult<Tenant>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = MercataResult<Tenant>> + Send;
    /// Profile update. Plan and status fields are untouchable here.
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = MercataResult<Tenant>> + Send;
    /// Write all plan-assignment fields and activate the tenant in one
    /// atomic update (no read-modify-write; last writer wins on races).
    fn set_plan(
        &self,
        id: Uuid,
        assignment: PlanAssignment,
    ) -> impl Future<Output = MercataResult<Tenant>> + Send;
    /// Explicit status write (suspension / reinstatement by admin tooling).
    fn set_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> impl Future<Output = MercataResult<Tenant>> + Send;
    /// Active tenants whose plan expiry is strictly before `now` —
    /// the expiration sweep's candidate set.
    fn list_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = MercataResult<Vec<Tenant>>> + Send;
    /// Deactivate one tenant if its plan expiry is before `now` and it is
    /// still active, as a single conditional update. Returns whether a
    /// transition happened, making repeated sweeps idempotent.
    fn deactivate_if_expired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        reason: &str,
    ) -> impl Future<Output = MercataResult<bool>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MercataResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MercataResult<PaginatedResult<Tenant>>> + Send;
}
