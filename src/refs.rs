//! Branch matching and ref parsing.
//!
//! A run is triggered by a version-control ref (e.g., `refs/heads/feature/x`
//! from CI, or a bare branch name when invoked by hand). `parse_ref`
//! normalizes that to a branch name, and `BranchMatcher` classifies the
//! branch to pick a strategy action.

use std::fmt;
use std::sync::Arc;

use crate::error::MigrateError;

const REF_PREFIX: &str = "refs/";
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Classifies a branch name.
///
/// The three shapes mirror how callers configure branch classification:
/// a single branch name, a set of names, or an arbitrary predicate. Being a
/// tagged enum, there is no "invalid matcher shape" at runtime — the type
/// admits exactly these three.
#[derive(Clone)]
pub enum BranchMatcher {
    /// Matches exactly one branch name.
    Exact(String),

    /// Matches any of the listed branch names.
    AnyOf(Vec<String>),

    /// Matches when the predicate returns true.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl BranchMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        BranchMatcher::Exact(name.into())
    }

    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BranchMatcher::AnyOf(names.into_iter().map(Into::into).collect())
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        BranchMatcher::Predicate(Arc::new(f))
    }

    /// Returns true iff `name` satisfies this matcher. Pure, no side effects.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            BranchMatcher::Exact(expected) => name == expected,
            BranchMatcher::AnyOf(names) => names.iter().any(|n| n == name),
            BranchMatcher::Predicate(predicate) => predicate(name),
        }
    }
}

impl fmt::Debug for BranchMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchMatcher::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            BranchMatcher::AnyOf(names) => f.debug_tuple("AnyOf").field(names).finish(),
            BranchMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Normalizes a version-control ref into a bare branch name.
///
/// Strings that don't start with `refs/` are already bare names and are
/// returned unchanged. `refs/heads/<branch>` yields `<branch>`. Any other
/// ref namespace (tags, pull requests) is rejected with
/// [`MigrateError::UnsupportedRef`].
pub fn parse_ref(branch_ref: &str) -> Result<&str, MigrateError> {
    if !branch_ref.starts_with(REF_PREFIX) {
        return Ok(branch_ref);
    }
    branch_ref
        .strip_prefix(BRANCH_REF_PREFIX)
        .ok_or_else(|| MigrateError::UnsupportedRef(branch_ref.to_string()))
}
