//! Scope authorization policy.
//!
//! A user's effective scopes are the names in their stored scope string. A
//! request needing scope `s` is allowed when those contain [`SCOPE_ALL`] or `s`.

use crate::models::ScopeSet;

/// Grants every scope.
pub const SCOPE_ALL: &str = "all";
/// User and scope administration.
pub const SCOPE_ADMIN: &str = "admin";
/// Read access to checkpoints and crossing records.
pub const SCOPE_READ: &str = "read";

pub fn authorize(granted: &ScopeSet, required: &str) -> bool {
    granted.contains(SCOPE_ALL) || granted.contains(required)
}

/// Narrow a requested scope set to the globally registered names.
///
/// Unknown names are dropped without error; an empty result means no permissions.
pub fn assign_scopes(requested: &ScopeSet, known: &ScopeSet) -> ScopeSet {
    requested.intersection(known)
}
