//! Environment provisioning: create, poll until ready, propagate key access.
//!
//! Cloning an environment is asynchronous on the store side, so after issuing
//! the create-with-id request we poll the environment's status at a fixed
//! interval with a bounded attempt count. This is an attempt counter, not a
//! wall-clock timeout: the effective wait bound is `poll_delay * max_attempts`.
//!
//! Known quirk, preserved on purpose: if the attempt budget runs out while the
//! status is still pending, the environment is returned *without error*. The
//! caller may therefore receive a not-yet-ready environment after a slow
//! clone. See `ProvisionConfig` to widen the budget.

use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::MigrateError;
use crate::store::{ApiKey, ContentStore, Environment, EnvironmentStatus, StoreError};
use crate::types::EnvironmentId;

/// Content-delivery keys whose name carries this prefix are granted access to
/// every environment this crate provisions.
pub const DEV_KEY_PREFIX: &str = "Dev:";

const DEFAULT_POLL_DELAY_MS: u64 = 3000;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Configuration for the environment-readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Delay between readiness checks.
    ///
    /// Default: 3 seconds.
    pub poll_delay: Duration,

    /// Maximum number of readiness checks before giving up the wait.
    ///
    /// Default: 10, for an effective wait bound of 30 seconds.
    pub max_attempts: u32,
}

impl ProvisionConfig {
    pub const DEFAULT: Self = Self {
        poll_delay: Duration::from_millis(DEFAULT_POLL_DELAY_MS),
        max_attempts: DEFAULT_MAX_ATTEMPTS,
    };

    pub fn new(poll_delay: Duration, max_attempts: u32) -> Self {
        Self {
            poll_delay,
            max_attempts,
        }
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Creates environment `id` cloned from `source`, waits for it to become
/// ready, then grants `Dev:`-prefixed API keys access to it.
///
/// # Errors
///
/// - [`MigrateError::EnvironmentProvisioning`] if the store reports `failed`.
/// - [`MigrateError::KeyPropagation`] if any key update fails (the successful
///   updates are not rolled back).
///
/// Exhausting the poll budget while the status is still pending is *not* an
/// error; the possibly-unready environment is returned and a warning logged.
pub async fn provision_environment<S: ContentStore>(
    store: &S,
    id: &EnvironmentId,
    source: &EnvironmentId,
    config: &ProvisionConfig,
) -> Result<Environment, MigrateError> {
    info!(environment = %id, source = %source, "creating new environment");

    let mut environment = store.create_environment(id, id.as_str(), source).await?;

    let mut ready = false;
    let mut attempts = 0;
    while attempts < config.max_attempts {
        if let Some(env) = store.get_environment(id).await? {
            match env.status {
                EnvironmentStatus::Ready => {
                    info!(environment = %id, "environment is ready");
                    environment = env;
                    ready = true;
                    break;
                }
                EnvironmentStatus::Failed => {
                    return Err(MigrateError::EnvironmentProvisioning(id.clone()));
                }
                ref status => {
                    debug!(environment = %id, ?status, "environment not yet ready");
                }
            }
            environment = env;
        }

        tokio::time::sleep(config.poll_delay).await;
        attempts += 1;
    }

    if !ready {
        warn!(
            environment = %id,
            attempts = config.max_attempts,
            "readiness poll exhausted; continuing with a possibly-unready environment"
        );
    }

    propagate_key_access(store, id).await?;

    Ok(environment)
}

/// Grants every `Dev:`-prefixed API key access to `environment`.
///
/// The key updates touch distinct keys and are order-insensitive, so they are
/// issued concurrently and awaited jointly. Failures are collected into a
/// single [`MigrateError::KeyPropagation`]; successful updates stay applied.
async fn propagate_key_access<S: ContentStore>(
    store: &S,
    environment: &EnvironmentId,
) -> Result<(), MigrateError> {
    info!(environment = %environment, "updating API keys to allow access to new environment");

    let keys = store.list_api_keys().await?;
    let mut dev_keys: Vec<ApiKey> = keys
        .into_iter()
        .filter(|key| key.name.starts_with(DEV_KEY_PREFIX))
        .collect();

    for key in &mut dev_keys {
        debug!(key = %key.id, name = %key.name, environment = %environment, "granting key access");
        key.environments.push(environment.clone());
    }

    let results = join_all(dev_keys.iter().map(|key| store.update_api_key(key))).await;

    let attempted = results.len();
    let failures: Vec<StoreError> = results.into_iter().filter_map(Result::err).collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(MigrateError::KeyPropagation {
            environment: environment.clone(),
            attempted,
            failed: failures.len(),
            failures,
        })
    }
}
