//! Tenant domain model.
//!
//! A tenant is one onboarded business. Its feature-area records elsewhere
//! in the platform live in collections keyed by tenant id; that
//! partitioning is storage plumbing and not modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription status of a tenant.
///
/// The lifecycle manager is the sole writer that transitions
/// `Active` to `Inactive` for expiry reasons. `Suspended` is an explicit
/// administrative state and is never overwritten by the expiration sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Inactive,
    Suspended,
}

/// Kind of business the tenant runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantType {
    Retail,
    Manufacturer,
    Distributor,
}

/// One onboarded business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Display name of the business.
    pub name: String,
    /// Login email, unique across tenants.
    pub email: String,
    /// Opaque credential hash; hashing happens in the onboarding layer.
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: TenantStatus,
    /// Reference to the assigned [`Plan`](crate::models::plan::Plan), if any.
    pub plan: Option<Uuid>,
    /// Snapshot of the plan name taken at assignment time.
    ///
    /// Deliberately NOT a live join: renaming a plan later does not
    /// rewrite this field. Downstream consumers rely on seeing the name
    /// as-of-assignment.
    pub plan_name: Option<String>,
    pub plan_expiry_date: Option<DateTime<Utc>>,
    pub plan_assigned_at: Option<DateTime<Utc>>,
    /// When the expiration sweep (or admin tooling) deactivated this
    /// tenant, if it did.
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivation_reason: Option<String>,
    /// Reference to a business-type record managed by admin tooling.
    pub business_type: Option<Uuid>,
    pub tenant_type: TenantType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to onboard a new tenant.
///
/// New tenants start `Inactive` with no plan; entitlement stays
/// fail-closed until a plan is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<Uuid>,
    pub tenant_type: TenantType,
}

/// Profile fields that can be updated on an existing tenant.
///
/// Plan and status fields are owned by the lifecycle operations and are
/// not updatable here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<Uuid>,
}

/// Plan fields written to a tenant in a single atomic update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAssignment {
    pub plan_id: Uuid,
    /// Name snapshot taken from the plan at assignment time.
    pub plan_name: String,
    pub assigned_at: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}
