//! Entitlement resolution — which features may a tenant use right now?

use std::collections::HashSet;

use mercata_core::error::{MercataError, MercataResult};
use mercata_core::models::feature::FeatureKey;
use mercata_core::repository::{PlanRepository, TenantRepository};
use tracing::debug;
use uuid::Uuid;

/// Resolves a tenant's feature set from its assigned plan.
///
/// Generic over repository implementations so that this layer has no
/// dependency on the database crate.
///
/// Resolution is fail-closed: an unresolvable tenant, a tenant with no
/// plan, or a dangling plan reference all yield the empty set rather than
/// an error. Callers must treat "no features" as a normal outcome. Only
/// infrastructure failures propagate as errors.
pub struct EntitlementResolver<T: TenantRepository, P: PlanRepository> {
    tenant_repo: T,
    plan_repo: P,
}

impl<T: TenantRepository, P: PlanRepository> EntitlementResolver<T, P> {
    pub fn new(tenant_repo: T, plan_repo: P) -> Self {
        Self {
            tenant_repo,
            plan_repo,
        }
    }

    /// The exact feature set the tenant's plan unlocks.
    pub async fn tenant_features(&self, tenant_id: Uuid) -> MercataResult<HashSet<FeatureKey>> {
        // 1. Load the tenant. An unresolvable id grants nothing.
        let tenant = match self.tenant_repo.get_by_id(tenant_id).await {
            Ok(t) => t,
            Err(MercataError::NotFound { .. }) => {
                debug!(%tenant_id, "tenant not resolvable, denying all features");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e),
        };

        // 2. No plan assigned — nothing is unlocked.
        let Some(plan_id) = tenant.plan else {
            return Ok(HashSet::new());
        };

        // 3. Resolve the plan reference. A dangling reference (plan
        //    deleted after assignment) also grants nothing.
        match self.plan_repo.get_by_id(plan_id).await {
            Ok(plan) => Ok(plan.allowed_features),
            Err(MercataError::NotFound { .. }) => {
                debug!(%tenant_id, %plan_id, "plan reference dangling, denying all features");
                Ok(HashSet::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the tenant's plan includes `feature`.
    ///
    /// Deliberately does NOT consult the tenant's status — billing state
    /// is the admission gate's separate, composable check.
    pub async fn has_feature_access(
        &self,
        tenant_id: Uuid,
        feature: FeatureKey,
    ) -> MercataResult<bool> {
        let features = self.tenant_features(tenant_id).await?;
        Ok(features.contains(&feature))
    }
}
