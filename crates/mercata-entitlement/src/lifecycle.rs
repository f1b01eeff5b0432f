//! Subscription lifecycle — plan assignment, time-driven deactivation,
//! and plan status reporting.

use chrono::{DateTime, Duration, Utc};
use mercata_core::error::MercataResult;
use mercata_core::models::tenant::{PlanAssignment, TenantStatus};
use mercata_core::repository::{PlanRepository, TenantRepository};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EntitlementError;

/// Reason string recorded on tenants deactivated by the expiration sweep.
const EXPIRY_REASON: &str = "plan expired";

/// Days before expiry at which renewal notifications start showing.
const EXPIRY_NOTICE_DAYS: i64 = 30;

/// Result of one expiration sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub deactivated_count: usize,
}

/// Point-in-time view of a tenant's subscription, shaped for renewal
/// messaging in the UI.
///
/// For tenants with no plan expiry date, only `show_notification` is
/// populated (`false`) — an un-expiring tenant never sees a notice.
#[derive(Debug, Clone, Serialize)]
pub struct PlanStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Whole days until expiry, floored at 0 for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_expiring_soon: Option<bool>,
    pub show_notification: bool,
}

/// Whole days from `now` until `expiry`, rounded up.
///
/// Exactly-at-expiry and anything later come out non-positive.
fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (expiry - now).num_seconds();
    if secs > 0 {
        (secs + 86_399) / 86_400
    } else {
        // Truncating division rounds toward zero, which IS the ceiling
        // for negative values.
        secs / 86_400
    }
}

/// Owns the active/inactive transition driven purely by time.
///
/// Generic over repository implementations so that this layer has no
/// dependency on the database crate. The sweep and `assign_plan` are the
/// only writers of expiry-driven status; explicit suspensions go through
/// [`suspend`](LifecycleManager::suspend) and are never overwritten by
/// the sweep.
pub struct LifecycleManager<T: TenantRepository, P: PlanRepository> {
    tenant_repo: T,
    plan_repo: P,
}

impl<T: TenantRepository, P: PlanRepository> LifecycleManager<T, P> {
    pub fn new(tenant_repo: T, plan_repo: P) -> Self {
        Self {
            tenant_repo,
            plan_repo,
        }
    }

    /// Attach a plan to a tenant and activate it.
    ///
    /// Computes `expiry = assigned_at + duration_days` (365 when the plan
    /// does not specify a duration) and writes all assignment fields in a
    /// single atomic update. Idempotent for identical arguments. Fails
    /// with `NotFound` if the tenant or plan does not resolve and with
    /// `Validation` if the plan's stored duration is non-positive.
    pub async fn assign_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
        assigned_at: DateTime<Utc>,
    ) -> MercataResult<PlanAssignment> {
        // 1. Resolve the plan for its duration and name snapshot.
        let plan = self.plan_repo.get_by_id(plan_id).await?;
        let duration_days = plan.effective_duration_days();
        if duration_days <= 0 {
            return Err(EntitlementError::NonPositiveDuration {
                days: duration_days,
            }
            .into());
        }

        // 2. Compute expiry and write everything in one update.
        let assignment = PlanAssignment {
            plan_id,
            plan_name: plan.name,
            assigned_at,
            expiry_date: assigned_at + Duration::days(duration_days),
        };
        self.tenant_repo
            .set_plan(tenant_id, assignment.clone())
            .await?;

        info!(
            %tenant_id,
            %plan_id,
            expiry = %assignment.expiry_date,
            "plan assigned, tenant activated"
        );

        Ok(assignment)
    }

    /// Deactivate every active tenant whose plan expiry has passed.
    ///
    /// Each tenant is transitioned by an independent conditional update,
    /// so the sweep is idempotent and safe to re-run after a partial
    /// failure. One tenant's failure is logged and skipped — the run is
    /// simply retried on the next scheduled invocation.
    pub async fn sweep_expirations(&self, now: DateTime<Utc>) -> MercataResult<SweepOutcome> {
        let candidates = self.tenant_repo.list_expired(now).await?;
        let candidate_count = candidates.len();

        let mut deactivated = 0usize;
        for tenant in candidates {
            match self
                .tenant_repo
                .deactivate_if_expired(tenant.id, now, EXPIRY_REASON)
                .await
            {
                Ok(true) => {
                    deactivated += 1;
                    info!(tenant_id = %tenant.id, "tenant deactivated: plan expired");
                }
                // Lost the race to a concurrent sweep or a fresh
                // assignment — nothing to do.
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        tenant_id = %tenant.id,
                        error = %e,
                        "sweep: tenant update failed, skipping"
                    );
                }
            }
        }

        info!(
            candidates = candidate_count,
            deactivated, "expiration sweep complete"
        );

        Ok(SweepOutcome {
            deactivated_count: deactivated,
        })
    }

    /// Point-in-time subscription status for renewal messaging.
    pub async fn plan_status(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> MercataResult<PlanStatus> {
        let tenant = self.tenant_repo.get_by_id(tenant_id).await?;

        let Some(expiry_date) = tenant.plan_expiry_date else {
            return Ok(PlanStatus {
                plan_name: None,
                expiry_date: None,
                days_left: None,
                is_expired: None,
                is_expiring_soon: None,
                show_notification: false,
            });
        };

        let raw_days = days_until(expiry_date, now);
        let is_expired = raw_days <= 0;

        Ok(PlanStatus {
            plan_name: tenant.plan_name,
            expiry_date: Some(expiry_date),
            days_left: Some(raw_days.max(0)),
            is_expired: Some(is_expired),
            is_expiring_soon: Some(!is_expired && raw_days <= EXPIRY_NOTICE_DAYS),
            show_notification: raw_days <= EXPIRY_NOTICE_DAYS,
        })
    }

    /// Administratively suspend a tenant.
    ///
    /// Suspension is an explicit state the expiration sweep never
    /// overwrites.
    pub async fn suspend(&self, tenant_id: Uuid) -> MercataResult<()> {
        self.tenant_repo
            .set_status(tenant_id, TenantStatus::Suspended)
            .await?;
        info!(%tenant_id, "tenant suspended");
        Ok(())
    }

    /// Lift a suspension, returning the tenant to active.
    pub async fn reinstate(&self, tenant_id: Uuid) -> MercataResult<()> {
        self.tenant_repo
            .set_status(tenant_id, TenantStatus::Active)
            .await?;
        info!(%tenant_id, "tenant reinstated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn full_days_remaining() {
        let expiry = at(2024, 1, 31, 0);
        assert_eq!(days_until(expiry, at(2024, 1, 29, 0)), 2);
        assert_eq!(days_until(expiry, at(2024, 1, 1, 0)), 30);
    }

    #[test]
    fn partial_day_rounds_up() {
        let expiry = at(2024, 1, 31, 0);
        assert_eq!(days_until(expiry, at(2024, 1, 30, 18)), 1);
        assert_eq!(days_until(expiry, at(2024, 1, 29, 1)), 2);
    }

    #[test]
    fn at_expiry_is_zero() {
        let expiry = at(2024, 1, 31, 0);
        assert_eq!(days_until(expiry, expiry), 0);
    }

    #[test]
    fn past_expiry_is_non_positive() {
        let expiry = at(2024, 1, 31, 0);
        assert_eq!(days_until(expiry, at(2024, 1, 31, 12)), 0);
        assert_eq!(days_until(expiry, at(2024, 2, 2, 0)), -2);
    }
}
