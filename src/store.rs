//! The content-store collaborator contract.
//!
//! This crate never talks to a concrete content-store API. Everything it needs
//! from the store is expressed by the [`ContentStore`] trait, scoped to a
//! single space: callers construct a client for their store, authenticate it,
//! resolve the space, and hand the space-scoped handle in. The trait-based
//! seam also gives tests an in-memory store (see `test_utils`).
//!
//! Environment absence is modelled as `Ok(None)` from [`get_environment`],
//! not as an error: "not there yet / not there at all" is an expected answer
//! during feature-environment resolution and readiness polling.
//!
//! [`get_environment`]: ContentStore::get_environment

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{AliasId, ApiKeyId, EnvironmentId};

/// Lifecycle status of an environment, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentStatus {
    /// The environment is ready for use.
    Ready,

    /// The store reports the environment failed to provision.
    Failed,

    /// The environment is still being prepared (e.g., a clone in progress).
    Pending,

    /// Any other intermediate status the store may report.
    Other(String),
}

/// A named environment in the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    pub status: EnvironmentStatus,

    /// When the lookup went through an alias, the id of the concrete
    /// environment the alias currently points to.
    pub aliased_environment: Option<EnvironmentId>,
}

impl Environment {
    /// Returns true if this environment was resolved through an alias.
    pub fn is_alias_backed(&self) -> bool {
        self.aliased_environment.is_some()
    }
}

/// A stable named pointer to a concrete environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentAlias {
    pub id: AliasId,

    /// The environment the alias currently points to.
    pub environment: EnvironmentId,
}

/// A content-delivery API key and the environments it can access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub name: String,
    pub environments: Vec<EnvironmentId>,
}

/// Entry field values, keyed by field name and then by locale.
///
/// This mirrors the store's wire shape for entry fields: every field carries a
/// map of locale to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryFields(BTreeMap<String, BTreeMap<String, String>>);

impl EntryFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for a single localized field value.
    pub fn with(
        mut self,
        field: impl Into<String>,
        locale: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.0
            .entry(field.into())
            .or_default()
            .insert(locale.into(), value.into());
        self
    }

    /// Returns the value of `field` in `locale`, if present.
    pub fn get(&self, field: &str, locale: &str) -> Option<&str> {
        self.0.get(field)?.get(locale).map(String::as_str)
    }
}

/// A persisted entry used for migration tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub fields: EntryFields,
}

/// Errors at the content-store boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested resource does not exist.
    NotFound(String),

    /// The store's API rejected or failed the request.
    Api {
        status: Option<u16>,
        message: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "not found in content store: {}", what),
            StoreError::Api {
                status: Some(code),
                message,
            } => write!(f, "content store API error (HTTP {}): {}", code, message),
            StoreError::Api {
                status: None,
                message,
            } => write!(f, "content store API error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Async operations this crate needs from a content store, scoped to a space.
///
/// All methods suspend on network I/O; none of them are invoked concurrently
/// for the same environment except API-key updates during provisioning, which
/// touch distinct keys.
pub trait ContentStore: Send + Sync {
    /// Fetches an environment by id. `Ok(None)` means the environment does
    /// not exist (or does not exist yet).
    fn get_environment(
        &self,
        id: &EnvironmentId,
    ) -> impl Future<Output = Result<Option<Environment>, StoreError>> + Send;

    /// Creates an environment with the given id and name, cloned from
    /// `source`. The returned environment is usually still `Pending`.
    fn create_environment(
        &self,
        id: &EnvironmentId,
        name: &str,
        source: &EnvironmentId,
    ) -> impl Future<Output = Result<Environment, StoreError>> + Send;

    /// Deletes an environment by id.
    fn delete_environment(
        &self,
        id: &EnvironmentId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Lists every API key in the space.
    fn list_api_keys(&self) -> impl Future<Output = Result<Vec<ApiKey>, StoreError>> + Send;

    /// Persists an updated API key (notably its environment-access list).
    fn update_api_key(
        &self,
        key: &ApiKey,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetches an environment alias by id.
    fn get_environment_alias(
        &self,
        id: &AliasId,
    ) -> impl Future<Output = Result<EnvironmentAlias, StoreError>> + Send;

    /// Persists an updated alias (repointing it to a new environment).
    fn update_environment_alias(
        &self,
        alias: &EnvironmentAlias,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Creates an entry of `entry_type` with the given fields in an
    /// environment.
    fn create_entry(
        &self,
        environment: &EnvironmentId,
        entry_type: &str,
        fields: EntryFields,
    ) -> impl Future<Output = Result<TrackingEntry, StoreError>> + Send;

    /// Queries all entries of `entry_type` in an environment.
    fn entries_of_type(
        &self,
        environment: &EnvironmentId,
        entry_type: &str,
    ) -> impl Future<Output = Result<Vec<TrackingEntry>, StoreError>> + Send;
}
