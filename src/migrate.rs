//! The migration run entry point.
//!
//! [`migrate`] is the single operation external callers invoke: resolve
//! options once, run the configured strategy to obtain a target environment,
//! apply every pending migration to it, and — only after all of them
//! succeed — run the strategy's completion hook (e.g., alias repointing).
//!
//! The store client and the migration-execution engine are collaborators the
//! caller constructs; this crate only defines their contracts
//! ([`ContentStore`], [`MigrationRunner`]).

use std::path::PathBuf;

use crate::apply::{apply, MigrationRunner};
use crate::error::MigrateError;
use crate::provision::ProvisionConfig;
use crate::store::ContentStore;
use crate::strategy::StrategyAction;
use crate::types::SpaceId;

/// Environment variable consulted for the access token when none is passed.
pub const TOKEN_VAR: &str = "CONTENT_STORE_ACCESS_TOKEN";

/// Environment variable consulted for the space id when none is passed.
pub const SPACE_ID_VAR: &str = "CONTENT_STORE_SPACE_ID";

const DEFAULT_LOCALE: &str = "en-US";
const DEFAULT_TRACKER_ENTRY_TYPE: &str = "appliedMigration";
const DEFAULT_MIGRATION_EXTENSION: &str = "js";

/// Caller-facing options for a migration run.
///
/// Optional fields fall back to environment variables or documented defaults;
/// [`resolve`](Self::resolve) applies all of them in one place.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Access token for the content store's management API.
    /// Falls back to [`TOKEN_VAR`].
    pub token: Option<String>,

    /// Space to apply migrations to. Falls back to [`SPACE_ID_VAR`].
    pub space_id: Option<SpaceId>,

    /// Locale used when reading and writing tracking entries.
    /// Default: `en-US`.
    pub locale: Option<String>,

    /// Entry type used for tracking applied migrations.
    /// Default: `appliedMigration`.
    pub migration_tracker_entry_type: Option<String>,

    /// File extension of migration scripts. Default: `js`.
    pub migration_extension: Option<String>,

    /// Directory containing the migration scripts. Required.
    pub migration_path: PathBuf,

    /// How to pick (or provision) the target environment. Required; usually
    /// built with [`default_strategy`](crate::strategy::default_strategy).
    pub strategy: StrategyAction,

    /// Readiness-poll settings for any environment the strategy provisions.
    pub provision: ProvisionConfig,
}

impl MigrateOptions {
    pub fn new(migration_path: impl Into<PathBuf>, strategy: StrategyAction) -> Self {
        Self {
            token: None,
            space_id: None,
            locale: None,
            migration_tracker_entry_type: None,
            migration_extension: None,
            migration_path: migration_path.into(),
            strategy,
            provision: ProvisionConfig::default(),
        }
    }

    /// Applies env-var fallbacks and defaults, yielding the resolved
    /// configuration every component works from.
    pub fn resolve(self) -> Result<MigrateConfig, MigrateError> {
        let token = self
            .token
            .or_else(|| std::env::var(TOKEN_VAR).ok())
            .ok_or_else(|| {
                MigrateError::Configuration(format!(
                    "a content store access token is required (pass one or set {TOKEN_VAR})"
                ))
            })?;

        let space_id = self
            .space_id
            .or_else(|| std::env::var(SPACE_ID_VAR).ok().map(SpaceId::new))
            .ok_or_else(|| {
                MigrateError::Configuration(format!(
                    "a content store space id is required (pass one or set {SPACE_ID_VAR})"
                ))
            })?;

        Ok(MigrateConfig {
            token,
            space_id,
            locale: self.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            migration_tracker_entry_type: self
                .migration_tracker_entry_type
                .unwrap_or_else(|| DEFAULT_TRACKER_ENTRY_TYPE.to_string()),
            migration_extension: self
                .migration_extension
                .unwrap_or_else(|| DEFAULT_MIGRATION_EXTENSION.to_string()),
            migration_path: self.migration_path,
            strategy: self.strategy,
            provision: self.provision,
        })
    }
}

/// Fully resolved run configuration: every default applied, every required
/// value present.
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub token: String,
    pub space_id: SpaceId,
    pub locale: String,
    pub migration_tracker_entry_type: String,
    pub migration_extension: String,
    pub migration_path: PathBuf,
    pub strategy: StrategyAction,
    pub provision: ProvisionConfig,
}

/// Runs a complete migration: resolve the target environment via the
/// configured strategy, apply all pending migrations, then run the
/// completion hook if the strategy produced one.
///
/// All errors are fatal to the run and propagate to the caller. Migrations
/// applied before a failure stay recorded, so re-invoking with the same
/// options resumes where the failed run stopped.
pub async fn migrate<S, R>(
    store: &S,
    runner: &R,
    options: MigrateOptions,
) -> Result<(), MigrateError>
where
    S: ContentStore,
    R: MigrationRunner,
{
    let config = options.resolve()?;

    let outcome = config.strategy.run(store, &config.provision).await?;

    apply(store, runner, &outcome.environment, &config).await?;

    if let Some(hook) = &outcome.completion {
        hook.run(store).await?;
    }

    Ok(())
}
