//! Mercata Server — application entry point.
//!
//! Connects to SurrealDB, applies migrations, and hosts the periodic
//! expiration sweep. The HTTP surface lives in the surrounding
//! application; this binary owns the time-triggered side of the core.

use std::sync::Arc;
use std::time::Duration;

use mercata_db::repository::{SurrealPlanRepository, SurrealTenantRepository};
use mercata_db::{DbConfig, DbManager};
use mercata_entitlement::{LifecycleManager, SweepScheduler};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mercata=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Mercata server...");

    let config = DbConfig {
        url: env_or("MERCATA_DB_URL", "127.0.0.1:8000"),
        namespace: env_or("MERCATA_DB_NAMESPACE", "mercata"),
        database: env_or("MERCATA_DB_DATABASE", "main"),
        username: env_or("MERCATA_DB_USER", "root"),
        password: env_or("MERCATA_DB_PASS", "root"),
    };

    let manager = match DbManager::connect(&config).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = mercata_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "failed to apply migrations");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let tenant_repo = SurrealTenantRepository::new(db.clone());
    let plan_repo = SurrealPlanRepository::new(db);
    let lifecycle = Arc::new(LifecycleManager::new(tenant_repo, plan_repo));

    let sweep_hours: u64 = env_or("MERCATA_SWEEP_INTERVAL_HOURS", "24")
        .parse()
        .unwrap_or(24);
    let scheduler = SweepScheduler::new(
        Arc::clone(&lifecycle),
        Duration::from_secs(sweep_hours * 3600),
    );
    tokio::spawn(scheduler.run());

    tracing::info!(sweep_interval_hours = sweep_hours, "Mercata server running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }

    tracing::info!("Mercata server stopped.");
}
