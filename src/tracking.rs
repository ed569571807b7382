//! Migration tracking: which migrations exist, which are already applied.
//!
//! Available migrations are script files on disk; applied migrations are
//! tracking entries persisted in the target environment itself. The pending
//! set is the difference, in ascending numeric-prefix order. Tracking entries
//! are only ever created (one per successful application) — never deleted or
//! mutated — so the applied set grows monotonically and re-running a
//! partially failed run resumes at the first unapplied migration.

use std::path::Path;

use crate::error::MigrateError;
use crate::migrate::MigrateConfig;
use crate::store::ContentStore;
use crate::types::{EnvironmentId, MigrationId};

/// Entry field holding the migration identifier.
pub(crate) const FIELD_NAME: &str = "name";

/// Entry field holding the application result marker.
pub(crate) const FIELD_RESULT: &str = "migrationResult";

/// Value recorded in [`FIELD_RESULT`] for a successful application.
pub(crate) const RESULT_SUCCESS: &str = "Success";

/// Lists the migration scripts under `path`, sorted ascending by numeric
/// prefix.
///
/// Only files with the given extension count; the extension is stripped from
/// the returned identifiers.
pub async fn available_migrations(
    path: &Path,
    extension: &str,
) -> Result<Vec<MigrationId>, MigrateError> {
    let suffix = format!(".{extension}");

    let mut dir = tokio::fs::read_dir(path).await.map_err(|source| {
        MigrateError::MigrationDir {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut migrations = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(|source| {
        MigrateError::MigrationDir {
            path: path.to_path_buf(),
            source,
        }
    })? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(&suffix) {
            migrations.push(MigrationId::new(stem));
        }
    }

    migrations.sort();
    Ok(migrations)
}

/// Reads the names of already-applied migrations from the environment's
/// tracking entries.
pub async fn applied_migration_names<S: ContentStore>(
    store: &S,
    environment: &EnvironmentId,
    config: &MigrateConfig,
) -> Result<Vec<String>, MigrateError> {
    let entries = store
        .entries_of_type(environment, &config.migration_tracker_entry_type)
        .await?;

    Ok(entries
        .iter()
        .filter_map(|entry| entry.fields.get(FIELD_NAME, &config.locale))
        .map(str::to_string)
        .collect())
}

/// Computes the migrations available on disk but not yet recorded as applied
/// in `environment`, preserving ascending order.
pub async fn pending_migrations<S: ContentStore>(
    store: &S,
    environment: &EnvironmentId,
    config: &MigrateConfig,
) -> Result<Vec<MigrationId>, MigrateError> {
    let available =
        available_migrations(&config.migration_path, &config.migration_extension).await?;
    let applied = applied_migration_names(store, environment, config).await?;

    Ok(available
        .into_iter()
        .filter(|migration| !applied.iter().any(|name| name == migration.as_str()))
        .collect())
}
