//! Sequential migration application with durable per-step tracking.
//!
//! Migrations are applied strictly one at a time — a later migration may
//! depend on schema changes made by an earlier one, so there is deliberately
//! no concurrency here. After each successful script execution a tracking
//! entry is created in the target environment; that entry is the checkpoint
//! of record, so there is no transactional wrapper around the batch. A
//! failure aborts the run immediately and leaves earlier checkpoints in
//! place, which is what makes re-running safe.

use std::future::Future;
use std::path::PathBuf;

use tracing::info;

use crate::error::MigrateError;
use crate::migrate::MigrateConfig;
use crate::store::{ContentStore, EntryFields, Environment};
use crate::tracking::{pending_migrations, FIELD_NAME, FIELD_RESULT, RESULT_SUCCESS};
use crate::types::{EnvironmentId, MigrationId, SpaceId};

/// Everything the migration-execution collaborator needs to run one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub space: SpaceId,
    pub environment: EnvironmentId,
    pub token: String,
    pub script_path: PathBuf,
}

/// The external engine that executes one migration script against the store.
///
/// Success/failure is binary; there is no partial-success reporting and no
/// retry — a failed script fails the run.
pub trait MigrationRunner: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn run(
        &self,
        request: MigrationRequest,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Applies every pending migration to `environment`, in ascending order.
///
/// Zero pending migrations is a no-op, not an error. On the first failure the
/// run aborts with [`MigrateError::MigrationExecution`]; migrations applied
/// before the failure stay recorded, and later ones are never attempted.
pub async fn apply<S, R>(
    store: &S,
    runner: &R,
    environment: &Environment,
    config: &MigrateConfig,
) -> Result<(), MigrateError>
where
    S: ContentStore,
    R: MigrationRunner,
{
    let pending = pending_migrations(store, &environment.id, config).await?;

    if pending.is_empty() {
        info!(environment = %environment.id, "no migrations to apply");
        return Ok(());
    }

    info!(
        environment = %environment.id,
        count = pending.len(),
        migrations = ?pending,
        "applying migrations"
    );

    for migration in &pending {
        apply_migration(store, runner, environment, migration, config).await?;
    }

    info!(environment = %environment.id, count = pending.len(), "applied migrations");
    Ok(())
}

async fn apply_migration<S, R>(
    store: &S,
    runner: &R,
    environment: &Environment,
    migration: &MigrationId,
    config: &MigrateConfig,
) -> Result<(), MigrateError>
where
    S: ContentStore,
    R: MigrationRunner,
{
    info!(migration = %migration, "applying migration");

    let script_path = config
        .migration_path
        .join(format!("{}.{}", migration, config.migration_extension));

    runner
        .run(MigrationRequest {
            space: config.space_id.clone(),
            environment: environment.id.clone(),
            token: config.token.clone(),
            script_path,
        })
        .await
        .map_err(|source| MigrateError::MigrationExecution {
            migration: migration.clone(),
            source: Box::new(source),
        })?;

    let fields = EntryFields::new()
        .with(FIELD_NAME, config.locale.as_str(), migration.as_str())
        .with(FIELD_RESULT, config.locale.as_str(), RESULT_SUCCESS);

    store
        .create_entry(
            &environment.id,
            &config.migration_tracker_entry_type,
            fields,
        )
        .await?;

    Ok(())
}
