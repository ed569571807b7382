//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., using an
//! AliasId where an EnvironmentId is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a space in the content store.
///
/// A space is the top-level container that holds environments, API keys and
/// aliases. All operations in a run target a single space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub String);

impl SpaceId {
    pub fn new(s: impl Into<String>) -> Self {
        SpaceId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SpaceId {
    fn from(s: String) -> Self {
        SpaceId(s)
    }
}

impl From<&str> for SpaceId {
    fn from(s: &str) -> Self {
        SpaceId(s.to_string())
    }
}

/// Identifier of an environment within a space.
///
/// Environment ids double as environment names for environments this crate
/// creates (feature environments and timestamped clones).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(pub String);

impl EnvironmentId {
    pub fn new(s: impl Into<String>) -> Self {
        EnvironmentId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EnvironmentId {
    fn from(s: String) -> Self {
        EnvironmentId(s)
    }
}

impl From<&str> for EnvironmentId {
    fn from(s: &str) -> Self {
        EnvironmentId(s.to_string())
    }
}

/// Identifier of an environment alias within a space.
///
/// An alias is a stable name (e.g., `master`) that redirects to a concrete
/// environment, allowing zero-downtime cutover after a migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasId(pub String);

impl AliasId {
    pub fn new(s: impl Into<String>) -> Self {
        AliasId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AliasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AliasId {
    fn from(s: String) -> Self {
        AliasId(s)
    }
}

impl From<&str> for AliasId {
    fn from(s: &str) -> Self {
        AliasId(s.to_string())
    }
}

/// Identifier of an API key within a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(pub String);

impl ApiKeyId {
    pub fn new(s: impl Into<String>) -> Self {
        ApiKeyId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ApiKeyId {
    fn from(s: String) -> Self {
        ApiKeyId(s)
    }
}

impl From<&str> for ApiKeyId {
    fn from(s: &str) -> Self {
        ApiKeyId(s.to_string())
    }
}
