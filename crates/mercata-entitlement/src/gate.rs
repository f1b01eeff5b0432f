//! Request admission gate — rejects feature-gated operations before they
//! run.

use mercata_core::error::{MercataError, MercataResult};
use mercata_core::models::feature::FeatureKey;
use mercata_core::models::tenant::TenantStatus;
use mercata_core::repository::{PlanRepository, TenantRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::EntitlementError;
use crate::resolver::EntitlementResolver;

/// Caller identity supplied by the external session layer.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub tenant_id: Uuid,
    /// Free-form role string; role literal checks stay at the transport
    /// layer.
    pub role: String,
}

/// Verdict produced before a feature-gated operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// No valid tenant identity on the request.
    Unauthenticated,
    /// Identity present, but the named feature is not admissible —
    /// either absent from the plan or the tenant is not currently
    /// active. Carries the feature so callers can surface upgrade/renewal
    /// messaging.
    Forbidden(FeatureKey),
}

/// Composes session identity, tenant status, and entitlement into a
/// single admission check in front of feature endpoints.
pub struct AdmissionGate<T: TenantRepository, P: PlanRepository> {
    tenant_repo: T,
    resolver: EntitlementResolver<T, P>,
}

impl<T: TenantRepository, P: PlanRepository> AdmissionGate<T, P> {
    pub fn new(tenant_repo: T, resolver: EntitlementResolver<T, P>) -> Self {
        Self {
            tenant_repo,
            resolver,
        }
    }

    /// Decide whether the caller may run an operation gated on `feature`.
    pub async fn admit(
        &self,
        identity: Option<&CallerIdentity>,
        feature: FeatureKey,
    ) -> MercataResult<Admission> {
        // 1. No identity, no admission.
        let Some(identity) = identity else {
            return Ok(Admission::Unauthenticated);
        };

        // 2. The tenant must exist and be active. A malformed or stale id
        //    is denied, never granted (fail-closed).
        match self.tenant_repo.get_by_id(identity.tenant_id).await {
            Ok(tenant) if tenant.status == TenantStatus::Active => {}
            Ok(tenant) => {
                debug!(
                    tenant_id = %identity.tenant_id,
                    status = ?tenant.status,
                    %feature,
                    "admission denied: tenant not active"
                );
                return Ok(Admission::Forbidden(feature));
            }
            Err(MercataError::NotFound { .. }) => {
                debug!(
                    tenant_id = %identity.tenant_id,
                    %feature,
                    "admission denied: tenant not resolvable"
                );
                return Ok(Admission::Forbidden(feature));
            }
            Err(e) => return Err(e),
        }

        // 3. The plan must include the feature.
        if self
            .resolver
            .has_feature_access(identity.tenant_id, feature)
            .await?
        {
            Ok(Admission::Allowed)
        } else {
            Ok(Admission::Forbidden(feature))
        }
    }

    /// Decorator over a feature-gated operation.
    ///
    /// Runs `op` only on the allowed path and returns its result
    /// untouched; every other verdict short-circuits into a structured
    /// error without invoking `op`.
    pub async fn guard<F, Fut, R>(
        &self,
        identity: Option<&CallerIdentity>,
        feature: FeatureKey,
        op: F,
    ) -> MercataResult<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MercataResult<R>>,
    {
        match self.admit(identity, feature).await? {
            Admission::Allowed => op().await,
            Admission::Unauthenticated => Err(MercataError::Unauthenticated),
            Admission::Forbidden(feature) => {
                Err(EntitlementError::FeatureUnavailable { feature }.into())
            }
        }
    }
}
