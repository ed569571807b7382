//! Migration identifiers and their ordering.
//!
//! A migration identifier has the form `<numeric-prefix>-<name>` (e.g.
//! `12-add-author-field`). The numeric prefix determines application order,
//! which is why these sort numerically rather than lexicographically:
//! `2-c` comes before `10-b`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// An ordered migration identifier.
///
/// Ordering is by numeric prefix first, then by the full identifier as a
/// deterministic tiebreak. Prefix collisions are not validated; identifiers
/// without a parseable numeric prefix sort after all numbered ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(pub String);

impl MigrationId {
    pub fn new(s: impl Into<String>) -> Self {
        MigrationId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric prefix, if the identifier has one.
    pub fn number(&self) -> Option<u64> {
        self.0.split('-').next()?.parse().ok()
    }

    fn sort_key(&self) -> (u64, &str) {
        (self.number().unwrap_or(u64::MAX), self.0.as_str())
    }
}

impl Ord for MigrationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for MigrationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MigrationId {
    fn from(s: String) -> Self {
        MigrationId(s)
    }
}

impl From<&str> for MigrationId {
    fn from(s: &str) -> Self {
        MigrationId(s.to_string())
    }
}
