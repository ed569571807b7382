//! Branch-aware schema-migration orchestration for a multi-environment
//! content store.
//!
//! Given the branch that triggered a run, this crate resolves (or provisions)
//! the content-store environment the run should target, computes which
//! migration scripts are not yet recorded as applied there, and applies them
//! strictly in order, recording each application in the store itself.
//!
//! The store client and the script-execution engine are abstract
//! collaborators ([`store::ContentStore`], [`apply::MigrationRunner`]);
//! callers bring their own implementations and invoke [`migrate`].

pub mod apply;
pub mod error;
pub mod migrate;
pub mod provision;
pub mod refs;
pub mod store;
pub mod strategy;
pub mod tracking;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use apply::{MigrationRequest, MigrationRunner};
pub use error::MigrateError;
pub use migrate::{migrate, MigrateConfig, MigrateOptions};
pub use provision::ProvisionConfig;
pub use refs::{parse_ref, BranchMatcher};
pub use strategy::{
    default_strategy, CompletionHook, DefaultStrategyOptions, StrategyAction, StrategyOutcome,
};
pub use types::{AliasId, ApiKeyId, EnvironmentId, MigrationId, SpaceId};
