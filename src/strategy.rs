//! Environment strategy resolution.
//!
//! A strategy decides which environment a migration run targets, based on the
//! branch that triggered the run. Resolution is split in two:
//!
//! 1. [`default_strategy`] classifies the branch (production → development →
//!    feature, in that fixed priority) and picks a [`StrategyAction`].
//! 2. The action is a deferred, re-invocable unit of work: [`StrategyAction::run`]
//!    performs the lookups/provisioning against the store and yields a
//!    [`StrategyOutcome`] — the target environment plus an optional
//!    [`CompletionHook`] to run only after every migration has succeeded.
//!
//! Actions are plain data (a tagged enum), so a resolved strategy can be
//! inspected, logged, and re-run.

use chrono::Utc;
use tracing::info;

use crate::error::MigrateError;
use crate::provision::{provision_environment, ProvisionConfig};
use crate::refs::{parse_ref, BranchMatcher};
use crate::store::{ContentStore, Environment};
use crate::types::{AliasId, EnvironmentId};

/// The fixed environment id the production branch targets.
pub const PRODUCTION_ENVIRONMENT: &str = "master";

/// Environment variable consulted for the branch ref when none is configured.
/// This is the ref CI systems following the GitHub convention export.
pub const BRANCH_REF_VAR: &str = "GITHUB_REF";

/// A deferred environment-resolution action.
///
/// Each variant describes one way of obtaining the target environment;
/// [`run`](Self::run) executes it against the store.
#[derive(Debug, Clone)]
pub enum StrategyAction {
    /// Look up a fixed environment; fail if it doesn't exist.
    GetEnvironment { environment: EnvironmentId },

    /// Look up an environment that may be alias-backed (e.g. `master`).
    ///
    /// If the lookup resolves through an alias and `create_new` is set, a
    /// timestamped clone is provisioned instead of migrating the alias target
    /// in place, and — when `update_alias_on_success` is also set — the
    /// outcome carries a hook that repoints the alias to the clone.
    GetOrCreateAliased {
        environment: EnvironmentId,
        create_new: bool,
        update_alias_on_success: bool,
    },

    /// Provision a fresh feature environment for `branch`, cloned from
    /// `source`. The environment id is the branch name with `/` replaced by
    /// `_`.
    CreateFeatureEnvironment {
        branch: String,
        recreate: bool,
        source: EnvironmentId,
    },
}

/// What a strategy action resolved to.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// The environment migrations will be applied to.
    pub environment: Environment,

    /// Deferred work to run only after all migrations succeed.
    pub completion: Option<CompletionHook>,
}

/// A zero-argument deferred action invoked after a fully successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionHook {
    /// Repoint `alias` to `target`, cutting traffic over to the freshly
    /// migrated clone.
    RepointAlias {
        alias: AliasId,
        target: EnvironmentId,
    },
}

impl CompletionHook {
    pub async fn run<S: ContentStore>(&self, store: &S) -> Result<(), MigrateError> {
        match self {
            CompletionHook::RepointAlias { alias, target } => {
                let mut resolved = store.get_environment_alias(alias).await?;
                info!(
                    alias = %alias,
                    from = %resolved.environment,
                    to = %target,
                    "updating alias to point at migrated environment"
                );
                resolved.environment = target.clone();
                store.update_environment_alias(&resolved).await?;
                Ok(())
            }
        }
    }
}

impl StrategyAction {
    /// Executes this action against the store.
    pub async fn run<S: ContentStore>(
        &self,
        store: &S,
        provision: &ProvisionConfig,
    ) -> Result<StrategyOutcome, MigrateError> {
        match self {
            StrategyAction::GetEnvironment { environment } => {
                let env = lookup(store, environment).await?;
                Ok(StrategyOutcome {
                    environment: env,
                    completion: None,
                })
            }

            StrategyAction::GetOrCreateAliased {
                environment,
                create_new,
                update_alias_on_success,
            } => {
                let env = lookup(store, environment).await?;

                if env.is_alias_backed() && *create_new {
                    let clone_id = EnvironmentId::new(format!(
                        "{}-migrated-{}",
                        environment,
                        Utc::now().timestamp_millis()
                    ));
                    let cloned =
                        provision_environment(store, &clone_id, environment, provision).await?;
                    let completion = update_alias_on_success.then(|| CompletionHook::RepointAlias {
                        alias: AliasId::new(environment.as_str()),
                        target: clone_id,
                    });
                    return Ok(StrategyOutcome {
                        environment: cloned,
                        completion,
                    });
                }

                Ok(StrategyOutcome {
                    environment: env,
                    completion: None,
                })
            }

            StrategyAction::CreateFeatureEnvironment {
                branch,
                recreate,
                source,
            } => {
                let environment = EnvironmentId::new(branch.replace('/', "_"));

                match store.get_environment(&environment).await? {
                    Some(_) if !recreate => {
                        return Err(MigrateError::AlreadyApplied(environment));
                    }
                    Some(_) => {
                        info!(environment = %environment, "deleting existing feature environment");
                        store.delete_environment(&environment).await?;
                    }
                    None => {}
                }

                let env = provision_environment(store, &environment, source, provision).await?;
                Ok(StrategyOutcome {
                    environment: env,
                    completion: None,
                })
            }
        }
    }
}

async fn lookup<S: ContentStore>(
    store: &S,
    id: &EnvironmentId,
) -> Result<Environment, MigrateError> {
    store
        .get_environment(id)
        .await?
        .ok_or_else(|| MigrateError::EnvironmentLookup(id.clone()))
}

/// Options for [`default_strategy`], with every default applied at
/// construction time.
#[derive(Debug, Clone)]
pub struct DefaultStrategyOptions {
    /// Raw ref to classify. Falls back to the `GITHUB_REF` environment
    /// variable; required — resolution fails with
    /// [`MigrateError::MissingBranchRef`] if neither is present.
    pub branch_ref: Option<String>,

    /// Destroy and recreate an existing feature environment instead of
    /// failing. Speeds up re-testing a migration.
    ///
    /// Default: `false`.
    pub recreate_feature_environments: bool,

    /// When the production/development environment is alias-backed, provision
    /// a timestamped clone instead of migrating the alias target in place.
    ///
    /// Default: `false`.
    pub create_new_aliased_environments: bool,

    /// After a fully successful run, repoint the alias at the new clone.
    /// Only meaningful together with `create_new_aliased_environments`.
    ///
    /// Default: `false`.
    pub update_alias_on_success: bool,

    /// The environment the development branch targets, and the clone source
    /// for feature environments.
    ///
    /// Default: `test`.
    pub test_environment: EnvironmentId,

    /// Matcher for the production branch. Takes priority over development and
    /// feature matches.
    ///
    /// Default: `master` or `main`.
    pub production_branch: BranchMatcher,

    /// Matcher for the development branch. Evaluated after production, before
    /// feature.
    ///
    /// Default: `dev`, `develop`, `development` or `test`.
    pub development_branch: BranchMatcher,

    /// Matcher for feature branches. Evaluated last; matches everything by
    /// default.
    pub feature_branch: BranchMatcher,
}

impl Default for DefaultStrategyOptions {
    fn default() -> Self {
        Self {
            branch_ref: None,
            recreate_feature_environments: false,
            create_new_aliased_environments: false,
            update_alias_on_success: false,
            test_environment: EnvironmentId::new("test"),
            production_branch: BranchMatcher::any_of(["master", "main"]),
            development_branch: BranchMatcher::any_of(["dev", "develop", "development", "test"]),
            feature_branch: BranchMatcher::predicate(|_| true),
        }
    }
}

/// Classifies the configured branch ref and picks the action to take.
///
/// Matchers are evaluated in fixed priority order: production, then
/// development, then feature. The first match wins.
///
/// # Errors
///
/// - [`MigrateError::MissingBranchRef`] if no branch ref is configured and
///   `GITHUB_REF` is unset.
/// - [`MigrateError::UnsupportedRef`] for non-branch refs.
/// - [`MigrateError::UnresolvedBranch`] if no matcher matches.
pub fn default_strategy(options: DefaultStrategyOptions) -> Result<StrategyAction, MigrateError> {
    let branch_ref = options
        .branch_ref
        .or_else(|| std::env::var(BRANCH_REF_VAR).ok())
        .ok_or(MigrateError::MissingBranchRef)?;
    let branch = parse_ref(&branch_ref)?.to_string();

    if options.production_branch.matches(&branch) {
        return Ok(StrategyAction::GetOrCreateAliased {
            environment: EnvironmentId::new(PRODUCTION_ENVIRONMENT),
            create_new: options.create_new_aliased_environments,
            update_alias_on_success: options.update_alias_on_success,
        });
    }

    if options.development_branch.matches(&branch) {
        return Ok(StrategyAction::GetOrCreateAliased {
            environment: options.test_environment,
            create_new: options.create_new_aliased_environments,
            update_alias_on_success: options.update_alias_on_success,
        });
    }

    if options.feature_branch.matches(&branch) {
        return Ok(StrategyAction::CreateFeatureEnvironment {
            branch,
            recreate: options.recreate_feature_environments,
            source: options.test_environment,
        });
    }

    Err(MigrateError::UnresolvedBranch(branch))
}
