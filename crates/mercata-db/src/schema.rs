//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Plans (global scope, managed by super-admin tooling)
-- =======================================================================
DEFINE TABLE plan SCHEMAFULL;
DEFINE FIELD name ON TABLE plan TYPE string;
DEFINE FIELD duration_days ON TABLE plan TYPE option<int>;
DEFINE FIELD allowed_features ON TABLE plan TYPE array<string>;
DEFINE FIELD price ON TABLE plan TYPE float DEFAULT 0.0;
DEFINE FIELD created_at ON TABLE plan TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE plan TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_plan_name ON TABLE plan COLUMNS name UNIQUE;

-- =======================================================================
-- Tenants (global scope)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD email ON TABLE tenant TYPE string;
DEFINE FIELD password_hash ON TABLE tenant TYPE string;
DEFINE FIELD phone ON TABLE tenant TYPE option<string>;
DEFINE FIELD address ON TABLE tenant TYPE option<string>;
DEFINE FIELD status ON TABLE tenant TYPE string \
    ASSERT $value IN ['active', 'inactive', 'suspended'];
DEFINE FIELD plan ON TABLE tenant TYPE option<string>;
DEFINE FIELD plan_name ON TABLE tenant TYPE option<string>;
DEFINE FIELD plan_expiry_date ON TABLE tenant TYPE option<datetime>;
DEFINE FIELD plan_assigned_at ON TABLE tenant TYPE option<datetime>;
DEFINE FIELD deactivated_at ON TABLE tenant TYPE option<datetime>;
DEFINE FIELD deactivation_reason ON TABLE tenant TYPE option<string>;
DEFINE FIELD business_type ON TABLE tenant TYPE option<string>;
DEFINE FIELD tenant_type ON TABLE tenant TYPE string \
    ASSERT $value IN ['retail', 'manufacturer', 'distributor'];
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_email ON TABLE tenant COLUMNS email UNIQUE;
DEFINE INDEX idx_tenant_status ON TABLE tenant COLUMNS status;
";

/// Apply all pending migrations.
///
/// Safe to run on every startup: already-applied versions are skipped,
/// recorded in the `_migration` table.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
