//! SurrealDB implementation of [`TenantRepository`].
//!
//! Plan-assignment and deactivation writes are single UPDATE statements so
//! that racing callers cannot interleave a read-modify-write; the last
//! writer wins, which matches the platform's assignment semantics.

use chrono::{DateTime, Utc};
use mercata_core::error::MercataResult;
use mercata_core::models::tenant::{
    CreateTenant, PlanAssignment, Tenant, TenantStatus, TenantType, UpdateTenant,
};
use mercata_core::repository::{PaginatedResult, Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    address: Option<String>,
    status: String,
    plan: Option<String>,
    plan_name: Option<String>,
    plan_expiry_date: Option<DateTime<Utc>>,
    plan_assigned_at: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
    deactivation_reason: Option<String>,
    business_type: Option<String>,
    tenant_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    address: Option<String>,
    status: String,
    plan: Option<String>,
    plan_name: Option<String>,
    plan_expiry_date: Option<DateTime<Utc>>,
    plan_assigned_at: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
    deactivation_reason: Option<String>,
    business_type: Option<String>,
    tenant_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<TenantStatus, DbError> {
    match s {
        "active" => Ok(TenantStatus::Active),
        "inactive" => Ok(TenantStatus::Inactive),
        "suspended" => Ok(TenantStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown tenant status: {other}"))),
    }
}

fn status_to_str(s: TenantStatus) -> &'static str {
    match s {
        TenantStatus::Active => "active",
        TenantStatus::Inactive => "inactive",
        TenantStatus::Suspended => "suspended",
    }
}

fn parse_tenant_type(s: &str) -> Result<TenantType, DbError> {
    match s {
        "retail" => Ok(TenantType::Retail),
        "manufacturer" => Ok(TenantType::Manufacturer),
        "distributor" => Ok(TenantType::Distributor),
        other => Err(DbError::Decode(format!("unknown tenant type: {other}"))),
    }
}

fn tenant_type_to_str(t: TenantType) -> &'static str {
    match t {
        TenantType::Retail => "retail",
        TenantType::Manufacturer => "manufacturer",
        TenantType::Distributor => "distributor",
    }
}

fn parse_opt_uuid(field: &str, raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| {
        Uuid::parse_str(&s).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
    })
    .transpose()
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            phone: self.phone,
            address: self.address,
            status: parse_status(&self.status)?,
            plan: parse_opt_uuid("plan", self.plan)?,
            plan_name: self.plan_name,
            plan_expiry_date: self.plan_expiry_date,
            plan_assigned_at: self.plan_assigned_at,
            deactivated_at: self.deactivated_at,
            deactivation_reason: self.deactivation_reason,
            business_type: parse_opt_uuid("business_type", self.business_type)?,
            tenant_type: parse_tenant_type(&self.tenant_type)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Tenant {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            phone: self.phone,
            address: self.address,
            status: parse_status(&self.status)?,
            plan: parse_opt_uuid("plan", self.plan)?,
            plan_name: self.plan_name,
            plan_expiry_date: self.plan_expiry_date,
            plan_assigned_at: self.plan_assigned_at,
            deactivated_at: self.deactivated_at,
            deactivation_reason: self.deactivation_reason,
            business_type: parse_opt_uuid("business_type", self.business_type)?,
            tenant_type: parse_tenant_type(&self.tenant_type)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> MercataResult<Tenant> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // New tenants start inactive with no plan; entitlement stays
        // fail-closed until a plan is assigned.
        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, \
                 email = $email, \
                 password_hash = $password_hash, \
                 phone = $phone, \
                 address = $address, \
                 status = 'inactive', \
                 business_type = $business_type, \
                 tenant_type = $tenant_type",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("phone", input.phone))
            .bind(("address", input.address))
            .bind((
                "business_type",
                input.business_type.map(|b| b.to_string()),
            ))
            .bind(("tenant_type", tenant_type_to_str(input.tenant_type)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> MercataResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_email(&self, email: &str) -> MercataResult<Tenant> {
        let email_owned = email.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM tenant \
                 WHERE email = $email",
            )
            .bind(("email", email_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> MercataResult<Tenant> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.business_type.is_some() {
            sets.push("business_type = $business_type");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('tenant', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(business_type) = input.business_type {
            builder = builder.bind(("business_type", business_type.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn set_plan(&self, id: Uuid, assignment: PlanAssignment) -> MercataResult<Tenant> {
        let id_str = id.to_string();

        // All assignment fields land in one statement; activation also
        // clears any previous deactivation bookkeeping.
        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 plan = $plan_id, \
                 plan_name = $plan_name, \
                 plan_assigned_at = $assigned_at, \
                 plan_expiry_date = $expiry_date, \
                 status = 'active', \
                 deactivated_at = NONE, \
                 deactivation_reason = NONE, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("plan_id", assignment.plan_id.to_string()))
            .bind(("plan_name", assignment.plan_name))
            .bind(("assigned_at", assignment.assigned_at))
            .bind(("expiry_date", assignment.expiry_date))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn set_status(&self, id: Uuid, status: TenantStatus) -> MercataResult<Tenant> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 status = $status, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status_to_str(status)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> MercataResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM tenant \
                 WHERE plan_expiry_date != NONE \
                 AND plan_expiry_date < $now \
                 AND status = 'active'",
            )
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn deactivate_if_expired(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        reason: &str,
    ) -> MercataResult<bool> {
        let id_str = id.to_string();
        let reason_owned = reason.to_string();

        // Conditional single-statement update: the WHERE guard makes the
        // transition idempotent and keeps explicit suspensions and
        // already-inactive tenants untouched.
        let result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) SET \
                 status = 'inactive', \
                 deactivated_at = $now, \
                 deactivation_reason = $reason, \
                 updated_at = time::now() \
                 WHERE plan_expiry_date != NONE \
                 AND plan_expiry_date < $now \
                 AND status = 'active'",
            )
            .bind(("id", id_str))
            .bind(("now", now))
            .bind(("reason", reason_owned))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn delete(&self, id: Uuid) -> MercataResult<()> {
        self.db
            .query("DELETE type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> MercataResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM tenant \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
