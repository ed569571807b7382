//! Error taxonomy for a migration run.
//!
//! Every error here is fatal to the current run: there is no local recovery
//! and no retry of migration execution (the bounded environment-readiness
//! poll in `provision` is the only built-in retry). Errors propagate to the
//! top-level caller, which owns process-level reporting. Partial progress —
//! migrations applied before a failure — is intentionally left recorded, so
//! re-invoking the run resumes from the first unapplied migration.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;
use crate::types::{EnvironmentId, MigrationId};

/// Errors produced by environment resolution and migration application.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A required option is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No branch ref was provided; one is required to pick a strategy action.
    #[error("no branch ref provided; one is required to determine which action to take")]
    MissingBranchRef,

    /// The ref names something other than a branch (e.g., a pull-request or
    /// tag ref).
    #[error("ref {0:?} does not refer to a branch; this may be running on a PR, which is unsupported")]
    UnsupportedRef(String),

    /// No configured branch matcher matched.
    #[error("unable to determine which action to use for branch {0:?}")]
    UnresolvedBranch(String),

    /// A feature environment with the derived id already exists and
    /// recreation was not requested. This usually means the migration has
    /// already been applied for that branch.
    #[error("feature environment {0} already exists; the migration may already be applied")]
    AlreadyApplied(EnvironmentId),

    /// The store reported `failed` status while provisioning an environment.
    #[error("environment {0} failed to provision")]
    EnvironmentProvisioning(EnvironmentId),

    /// A looked-up environment does not exist.
    #[error("environment {0} could not be retrieved")]
    EnvironmentLookup(EnvironmentId),

    /// A migration script failed to execute. Earlier migrations in the run
    /// stay recorded; later ones were never attempted.
    #[error("migration {migration} failed to execute")]
    MigrationExecution {
        migration: MigrationId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One or more API-key updates failed while granting access to a freshly
    /// provisioned environment. The updates are independent; there is no
    /// rollback of the ones that succeeded.
    #[error("{failed} of {attempted} API key updates failed while granting access to environment {environment}")]
    KeyPropagation {
        environment: EnvironmentId,
        attempted: usize,
        failed: usize,
        failures: Vec<StoreError>,
    },

    /// The content store rejected or failed an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The migration script directory could not be listed.
    #[error("failed to list migration scripts in {}", path.display())]
    MigrationDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
