//! SurrealDB implementation of [`PlanRepository`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mercata_core::error::{MercataError, MercataResult};
use mercata_core::models::feature::FeatureKey;
use mercata_core::models::plan::{CreatePlan, Plan, UpdatePlan};
use mercata_core::repository::{PaginatedResult, Pagination, PlanRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PlanRow {
    name: String,
    duration_days: Option<i64>,
    allowed_features: Vec<String>,
    price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PlanRowWithId {
    record_id: String,
    name: String,
    duration_days: Option<i64>,
    allowed_features: Vec<String>,
    price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Feature keys are stored as lowercase strings; an unknown key means a
/// corrupted record, not a soft miss.
fn parse_features(raw: Vec<String>) -> Result<HashSet<FeatureKey>, DbError> {
    raw.iter()
        .map(|s| {
            s.parse::<FeatureKey>()
                .map_err(|e| DbError::Decode(e.to_string()))
        })
        .collect()
}

fn features_to_strings(features: &HashSet<FeatureKey>) -> Vec<String> {
    features.iter().map(|f| f.as_str().to_string()).collect()
}

impl PlanRow {
    fn into_plan(self, id: Uuid) -> Result<Plan, DbError> {
        Ok(Plan {
            id,
            name: self.name,
            duration_days: self.duration_days,
            allowed_features: parse_features(self.allowed_features)?,
            price: self.price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PlanRowWithId {
    fn try_into_plan(self) -> Result<Plan, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Plan {
            id,
            name: self.name,
            duration_days: self.duration_days,
            allowed_features: parse_features(self.allowed_features)?,
            price: self.price,
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

/// SurrealDB implementation of the plan catalog.
#[derive(Clone)]
pub struct SurrealPlanRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPlanRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PlanRepository for SurrealPlanRepository<C> {
    async fn create(&self, input: CreatePlan) -> MercataResult<Plan> {
        if input.name.trim().is_empty() {
            return Err(MercataError::Validation {
                message: "plan name must not be empty".into(),
            });
        }

        // Name uniqueness is a convention; check before creating so the
        // caller gets a structured error instead of an index violation.
        let mut existing = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM plan WHERE name = $name")
            .bind(("name", input.name.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<PlanRowWithId> = existing.take(0).map_err(DbError::from)?;
        if !rows.is_empty() {
            return Err(MercataError::AlreadyExists {
                entity: format!("plan '{}'", input.name),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('plan', $id) SET \
                 name = $name, \
                 duration_days = $duration_days, \
                 allowed_features = $allowed_features, \
                 price = $price",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("duration_days", input.duration_days))
            .bind(("allowed_features", features_to_strings(&input.allowed_features)))
            .bind(("price", input.price))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> MercataResult<Plan> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('plan', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn get_by_name(&self, name: &str) -> MercataResult<Plan> {
        let name_owned = name.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM plan WHERE name = $name")
            .bind(("name", name_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_plan()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePlan) -> MercataResult<Plan> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.duration_days.is_some() {
            sets.push("duration_days = $duration_days");
        }
        if input.allowed_features.is_some() {
            sets.push("allowed_features = $allowed_features");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('plan', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(duration_days) = input.duration_days {
            builder = builder.bind(("duration_days", duration_days));
        }
        if let Some(features) = input.allowed_features {
            builder = builder.bind(("allowed_features", features_to_strings(&features)));
        }
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "plan".into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn delete(&self, id: Uuid) -> MercataResult<()> {
        self.db
            .query("DELETE type::record('plan', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> MercataResult<PaginatedResult<Plan>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM plan GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM plan \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_plan())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
