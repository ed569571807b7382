//! Shared test doubles: an in-memory content store, a scripted migration
//! runner, and proptest generators.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use proptest::prelude::*;
use thiserror::Error;

use crate::apply::{MigrationRequest, MigrationRunner};
use crate::migrate::MigrateConfig;
use crate::provision::ProvisionConfig;
use crate::store::{
    ApiKey, ContentStore, EntryFields, Environment, EnvironmentAlias, EnvironmentStatus,
    StoreError, TrackingEntry,
};
use crate::strategy::StrategyAction;
use crate::tracking::FIELD_NAME;
use crate::types::{AliasId, ApiKeyId, EnvironmentId, MigrationId, SpaceId};

/// A resolved config pointing at `migration_path`, with test credentials.
pub fn test_config(migration_path: &Path) -> MigrateConfig {
    MigrateConfig {
        token: "test-token".to_string(),
        space_id: SpaceId::new("test-space"),
        locale: "en-US".to_string(),
        migration_tracker_entry_type: "appliedMigration".to_string(),
        migration_extension: "js".to_string(),
        migration_path: migration_path.to_path_buf(),
        strategy: StrategyAction::GetEnvironment {
            environment: EnvironmentId::new("test"),
        },
        provision: ProvisionConfig::new(Duration::from_millis(1), 10),
    }
}

#[derive(Default)]
struct MockState {
    environments: HashMap<EnvironmentId, Environment>,
    aliases: HashMap<AliasId, EnvironmentAlias>,
    api_keys: Vec<ApiKey>,
    entries: HashMap<EnvironmentId, Vec<(String, TrackingEntry)>>,
    // Statuses reported by successive get_environment calls, per environment.
    scripted_statuses: HashMap<EnvironmentId, VecDeque<EnvironmentStatus>>,
    failing_key_updates: HashSet<ApiKeyId>,
    created: Vec<EnvironmentId>,
    deleted: Vec<EnvironmentId>,
}

/// In-memory [`ContentStore`] with builder-style seeding and scripted
/// readiness statuses.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a ready, non-aliased environment.
    pub fn with_ready_environment(self, id: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.environments.insert(
                EnvironmentId::new(id),
                Environment {
                    id: EnvironmentId::new(id),
                    name: id.to_string(),
                    status: EnvironmentStatus::Ready,
                    aliased_environment: None,
                },
            );
        }
        self
    }

    /// Seeds an environment whose lookup resolves through an alias pointing
    /// at `target`.
    pub fn with_aliased_environment(self, id: &str, target: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.environments.insert(
                EnvironmentId::new(id),
                Environment {
                    id: EnvironmentId::new(id),
                    name: id.to_string(),
                    status: EnvironmentStatus::Ready,
                    aliased_environment: Some(EnvironmentId::new(target)),
                },
            );
        }
        self
    }

    /// Seeds an alias record.
    pub fn with_alias(self, id: &str, environment: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.aliases.insert(
                AliasId::new(id),
                EnvironmentAlias {
                    id: AliasId::new(id),
                    environment: EnvironmentId::new(environment),
                },
            );
        }
        self
    }

    /// Scripts the statuses successive `get_environment` calls report for
    /// `id`, in order. Once exhausted, the stored status applies.
    pub fn with_statuses(
        self,
        id: &str,
        statuses: impl IntoIterator<Item = EnvironmentStatus>,
    ) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .scripted_statuses
                .insert(EnvironmentId::new(id), statuses.into_iter().collect());
        }
        self
    }

    /// Seeds an API key with no environment access.
    pub fn with_api_key(self, id: &str, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.api_keys.push(ApiKey {
                id: ApiKeyId::new(id),
                name: name.to_string(),
                environments: Vec::new(),
            });
        }
        self
    }

    /// Makes `update_api_key` fail for the given key.
    pub fn failing_key_update(self, id: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.failing_key_updates.insert(ApiKeyId::new(id));
        }
        self
    }

    /// Seeds a tracking entry recording `migration` as applied in `env`.
    pub fn with_applied_migration(self, env: &str, migration: &str, config: &MigrateConfig) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let fields = EntryFields::new().with(FIELD_NAME, config.locale.as_str(), migration);
            state
                .entries
                .entry(EnvironmentId::new(env))
                .or_default()
                .push((
                    config.migration_tracker_entry_type.clone(),
                    TrackingEntry { fields },
                ));
        }
        self
    }

    // ─── Assertions ───

    pub fn environment(&self, id: &EnvironmentId) -> Option<Environment> {
        self.state.lock().unwrap().environments.get(id).cloned()
    }

    pub fn alias(&self, id: &AliasId) -> Option<EnvironmentAlias> {
        self.state.lock().unwrap().aliases.get(id).cloned()
    }

    pub fn api_key(&self, id: &ApiKeyId) -> Option<ApiKey> {
        self.state
            .lock()
            .unwrap()
            .api_keys
            .iter()
            .find(|key| &key.id == id)
            .cloned()
    }

    /// Environment ids created, in creation order.
    pub fn created(&self) -> Vec<EnvironmentId> {
        self.state.lock().unwrap().created.clone()
    }

    /// Environment ids deleted, in deletion order.
    pub fn deleted(&self) -> Vec<EnvironmentId> {
        self.state.lock().unwrap().deleted.clone()
    }
}

impl ContentStore for MockStore {
    async fn get_environment(
        &self,
        id: &EnvironmentId,
    ) -> Result<Option<Environment>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state
            .scripted_statuses
            .get_mut(id)
            .and_then(VecDeque::pop_front)
        {
            if let Some(env) = state.environments.get_mut(id) {
                env.status = status;
            }
        }
        Ok(state.environments.get(id).cloned())
    }

    async fn create_environment(
        &self,
        id: &EnvironmentId,
        name: &str,
        _source: &EnvironmentId,
    ) -> Result<Environment, StoreError> {
        let mut state = self.state.lock().unwrap();
        let environment = Environment {
            id: id.clone(),
            name: name.to_string(),
            status: EnvironmentStatus::Ready,
            aliased_environment: None,
        };
        state.environments.insert(id.clone(), environment.clone());
        state.created.push(id.clone());
        Ok(environment)
    }

    async fn delete_environment(&self, id: &EnvironmentId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .environments
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("environment {id}")))?;
        state.deleted.push(id.clone());
        Ok(())
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        Ok(self.state.lock().unwrap().api_keys.clone())
    }

    async fn update_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_key_updates.contains(&key.id) {
            return Err(StoreError::Api {
                status: Some(500),
                message: format!("scripted failure updating key {}", key.id),
            });
        }
        let existing = state
            .api_keys
            .iter_mut()
            .find(|candidate| candidate.id == key.id)
            .ok_or_else(|| StoreError::NotFound(format!("api key {}", key.id)))?;
        *existing = key.clone();
        Ok(())
    }

    async fn get_environment_alias(&self, id: &AliasId) -> Result<EnvironmentAlias, StoreError> {
        self.state
            .lock()
            .unwrap()
            .aliases
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("alias {id}")))
    }

    async fn update_environment_alias(&self, alias: &EnvironmentAlias) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .aliases
            .insert(alias.id.clone(), alias.clone());
        Ok(())
    }

    async fn create_entry(
        &self,
        environment: &EnvironmentId,
        entry_type: &str,
        fields: EntryFields,
    ) -> Result<TrackingEntry, StoreError> {
        let entry = TrackingEntry { fields };
        self.state
            .lock()
            .unwrap()
            .entries
            .entry(environment.clone())
            .or_default()
            .push((entry_type.to_string(), entry.clone()));
        Ok(entry)
    }

    async fn entries_of_type(
        &self,
        environment: &EnvironmentId,
        entry_type: &str,
    ) -> Result<Vec<TrackingEntry>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .entries
            .get(environment)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(kind, _)| kind == entry_type)
                    .map(|(_, entry)| entry.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Scripted-failure error for [`MockRunner`].
#[derive(Debug, Error)]
#[error("scripted failure for migration {0}")]
pub struct ScriptedFailure(pub String);

/// [`MigrationRunner`] double that records every request and optionally fails
/// on one migration.
#[derive(Default)]
pub struct MockRunner {
    requests: Mutex<Vec<MigrationRequest>>,
    fail_on: Option<String>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the request whose script file stem equals `migration`.
    pub fn failing_on(mut self, migration: &str) -> Self {
        self.fail_on = Some(migration.to_string());
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<MigrationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl MigrationRunner for MockRunner {
    type Error = ScriptedFailure;

    async fn run(&self, request: MigrationRequest) -> Result<(), Self::Error> {
        let stem = request
            .script_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.requests.lock().unwrap().push(request);

        match &self.fail_on {
            Some(target) if *target == stem => Err(ScriptedFailure(stem)),
            _ => Ok(()),
        }
    }
}

// ─── Generators ───

pub fn arb_branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/-]{0,30}".prop_map(String::from)
}

pub fn arb_migration_id() -> impl Strategy<Value = MigrationId> {
    ("[0-9]{1,4}", "[a-z][a-z-]{0,20}").prop_map(|(n, name)| MigrationId::new(format!("{n}-{name}")))
}
