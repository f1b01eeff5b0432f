//! Integration tests for the entitlement resolver and admission gate.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{TimeZone, Utc};
use mercata_core::error::MercataError;
use mercata_core::models::feature::FeatureKey;
use mercata_core::models::plan::{CreatePlan, Plan};
use mercata_core::models::tenant::{CreateTenant, Tenant, TenantStatus, TenantType};
use mercata_core::repository::{PlanRepository, TenantRepository};
use mercata_db::repository::{SurrealPlanRepository, SurrealTenantRepository};
use mercata_entitlement::{
    Admission, AdmissionGate, CallerIdentity, EntitlementResolver, LifecycleManager,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Spin up in-memory DB, run migrations, return repositories.
async fn setup() -> (SurrealTenantRepository<Db>, SurrealPlanRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    mercata_db::run_migrations(&db).await.unwrap();
    (
        SurrealTenantRepository::new(db.clone()),
        SurrealPlanRepository::new(db),
    )
}

async fn onboard(tenants: &SurrealTenantRepository<Db>, email: &str) -> Tenant {
    tenants
        .create(CreateTenant {
            name: "Corner Shop".into(),
            email: email.into(),
            password_hash: "argon2-opaque".into(),
            phone: None,
            address: None,
            business_type: None,
            tenant_type: TenantType::Retail,
        })
        .await
        .unwrap()
}

async fn create_plan(
    plans: &SurrealPlanRepository<Db>,
    name: &str,
    features: &[FeatureKey],
) -> Plan {
    plans
        .create(CreatePlan {
            name: name.into(),
            duration_days: Some(30),
            allowed_features: features.iter().copied().collect(),
            price: 29.0,
        })
        .await
        .unwrap()
}

fn resolver(
    tenants: &SurrealTenantRepository<Db>,
    plans: &SurrealPlanRepository<Db>,
) -> EntitlementResolver<SurrealTenantRepository<Db>, SurrealPlanRepository<Db>> {
    EntitlementResolver::new(tenants.clone(), plans.clone())
}

fn gate(
    tenants: &SurrealTenantRepository<Db>,
    plans: &SurrealPlanRepository<Db>,
) -> AdmissionGate<SurrealTenantRepository<Db>, SurrealPlanRepository<Db>> {
    AdmissionGate::new(tenants.clone(), resolver(tenants, plans))
}

fn identity(tenant_id: Uuid) -> CallerIdentity {
    CallerIdentity {
        tenant_id,
        role: "tenant".into(),
    }
}

async fn assign(
    tenants: &SurrealTenantRepository<Db>,
    plans: &SurrealPlanRepository<Db>,
    tenant_id: Uuid,
    plan_id: Uuid,
) {
    LifecycleManager::new(tenants.clone(), plans.clone())
        .assign_plan(
            tenant_id,
            plan_id,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();
}

// -----------------------------------------------------------------------
// Resolver tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_without_plan_has_no_features() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;

    let features = resolver(&tenants, &plans)
        .tenant_features(tenant.id)
        .await
        .unwrap();
    assert!(features.is_empty());
}

#[tokio::test]
async fn features_match_the_plan_exactly() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(
        &plans,
        "Basic",
        &[FeatureKey::Inventory, FeatureKey::Pos],
    )
    .await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    let features = resolver(&tenants, &plans)
        .tenant_features(tenant.id)
        .await
        .unwrap();
    assert_eq!(
        features,
        HashSet::from([FeatureKey::Inventory, FeatureKey::Pos])
    );
}

#[tokio::test]
async fn unresolvable_tenant_grants_nothing() {
    let (tenants, plans) = setup().await;
    let resolver = resolver(&tenants, &plans);

    // Deny by default: a malformed or stale id must never grant access.
    let features = resolver.tenant_features(Uuid::new_v4()).await.unwrap();
    assert!(features.is_empty());

    let access = resolver
        .has_feature_access(Uuid::new_v4(), FeatureKey::Inventory)
        .await
        .unwrap();
    assert!(!access);
}

#[tokio::test]
async fn dangling_plan_reference_grants_nothing() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Inventory]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    // Plan deleted out from under the tenant.
    plans.delete(plan.id).await.unwrap();

    let features = resolver(&tenants, &plans)
        .tenant_features(tenant.id)
        .await
        .unwrap();
    assert!(features.is_empty());
}

#[tokio::test]
async fn access_flips_after_moving_to_a_richer_plan() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let basic = create_plan(
        &plans,
        "Basic",
        &[FeatureKey::Inventory, FeatureKey::Pos],
    )
    .await;
    let premium = create_plan(
        &plans,
        "Premium",
        &[FeatureKey::Inventory, FeatureKey::Pos, FeatureKey::Reports],
    )
    .await;
    let resolver = resolver(&tenants, &plans);

    assign(&tenants, &plans, tenant.id, basic.id).await;
    assert!(
        !resolver
            .has_feature_access(tenant.id, FeatureKey::Reports)
            .await
            .unwrap()
    );

    assign(&tenants, &plans, tenant.id, premium.id).await;
    assert!(
        resolver
            .has_feature_access(tenant.id, FeatureKey::Reports)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn resolver_ignores_tenant_status() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Inventory]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    tenants
        .set_status(tenant.id, TenantStatus::Suspended)
        .await
        .unwrap();

    // Entitlement and billing state are separate, composable checks:
    // the plan still includes the feature even while suspended.
    assert!(
        resolver(&tenants, &plans)
            .has_feature_access(tenant.id, FeatureKey::Inventory)
            .await
            .unwrap()
    );
}

// -----------------------------------------------------------------------
// Admission gate tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn gate_requires_identity() {
    let (tenants, plans) = setup().await;

    let verdict = gate(&tenants, &plans)
        .admit(None, FeatureKey::Inventory)
        .await
        .unwrap();
    assert_eq!(verdict, Admission::Unauthenticated);
}

#[tokio::test]
async fn gate_allows_entitled_active_tenant() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Inventory]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    let verdict = gate(&tenants, &plans)
        .admit(Some(&identity(tenant.id)), FeatureKey::Inventory)
        .await
        .unwrap();
    assert_eq!(verdict, Admission::Allowed);
}

#[tokio::test]
async fn gate_names_the_denied_feature() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Inventory]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    let verdict = gate(&tenants, &plans)
        .admit(Some(&identity(tenant.id)), FeatureKey::Reports)
        .await
        .unwrap();
    assert_eq!(verdict, Admission::Forbidden(FeatureKey::Reports));
}

#[tokio::test]
async fn gate_rejects_inactive_tenant_despite_entitlement() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Inventory]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    tenants
        .set_status(tenant.id, TenantStatus::Inactive)
        .await
        .unwrap();

    let verdict = gate(&tenants, &plans)
        .admit(Some(&identity(tenant.id)), FeatureKey::Inventory)
        .await
        .unwrap();
    assert_eq!(verdict, Admission::Forbidden(FeatureKey::Inventory));
}

#[tokio::test]
async fn gate_rejects_unresolvable_identity() {
    let (tenants, plans) = setup().await;

    let verdict = gate(&tenants, &plans)
        .admit(Some(&identity(Uuid::new_v4())), FeatureKey::Inventory)
        .await
        .unwrap();
    assert_eq!(verdict, Admission::Forbidden(FeatureKey::Inventory));
}

#[tokio::test]
async fn guard_runs_the_operation_untouched_when_allowed() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Pos]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;

    let result = gate(&tenants, &plans)
        .guard(Some(&identity(tenant.id)), FeatureKey::Pos, || async {
            Ok("sale recorded")
        })
        .await
        .unwrap();
    assert_eq!(result, "sale recorded");
}

#[tokio::test]
async fn guard_short_circuits_without_invoking_the_operation() {
    let (tenants, plans) = setup().await;
    let tenant = onboard(&tenants, "owner@example.com").await;
    let plan = create_plan(&plans, "Basic", &[FeatureKey::Pos]).await;
    assign(&tenants, &plans, tenant.id, plan.id).await;
    let gate = gate(&tenants, &plans);

    let ran = AtomicBool::new(false);

    let denied = gate
        .guard(Some(&identity(tenant.id)), FeatureKey::Hr, || async {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;
    assert!(matches!(
        denied,
        Err(MercataError::FeatureDenied { ref feature }) if feature.as_str() == "hr"
    ));
    assert!(!ran.load(Ordering::SeqCst));

    let unauthenticated = gate
        .guard(None, FeatureKey::Hr, || async {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;
    assert!(matches!(unauthenticated, Err(MercataError::Unauthenticated)));
    assert!(!ran.load(Ordering::SeqCst));
}
