//! Plan domain model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::feature::FeatureKey;

/// Subscription length applied when a plan does not specify one.
pub const DEFAULT_DURATION_DAYS: i64 = 365;

/// A named entitlement bundle.
///
/// Plans are created and edited by super-admin tooling and referenced by
/// tenants via id — many tenants share one plan, and a plan's lifetime is
/// independent of any tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    /// Human-facing name, unique across plans.
    pub name: String,
    /// Subscription length in days. `None` falls back to
    /// [`DEFAULT_DURATION_DAYS`] at assignment time.
    pub duration_days: Option<i64>,
    /// Feature keys this plan unlocks. Membership test only; duplicates
    /// are meaningless.
    pub allowed_features: HashSet<FeatureKey>,
    /// Informational price; billing happens elsewhere.
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Subscription length with the default applied.
    ///
    /// Non-positive stored values are passed through unchanged; rejecting
    /// them is the plan-assignment operation's responsibility.
    pub fn effective_duration_days(&self) -> i64 {
        self.duration_days.unwrap_or(DEFAULT_DURATION_DAYS)
    }
}

/// Fields required to create a new plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    pub name: String,
    pub duration_days: Option<i64>,
    pub allowed_features: HashSet<FeatureKey>,
    pub price: f64,
}

/// Fields that can be updated on an existing plan.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub duration_days: Option<i64>,
    pub allowed_features: Option<HashSet<FeatureKey>>,
    pub price: Option<f64>,
}
