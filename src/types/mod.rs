//! Core domain types.

pub mod ids;
pub mod migration;

pub use ids::{AliasId, ApiKeyId, EnvironmentId, SpaceId};
pub use migration::MigrationId;
