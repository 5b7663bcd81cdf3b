//! Scope model - named permission tokens and the set type users carry.

use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;

/// Scope row as provisioned by administrators.
#[derive(Debug, Clone, FromRow)]
pub struct Scope {
    pub id: i32,
    pub name: String,
}

impl Scope {
    pub fn view(&self) -> ScopeView {
        ScopeView {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScopeView {
    pub id: i32,
    #[schema(example = "admin")]
    pub name: String,
}

/// A set of scope names.
///
/// Stored and transported as a comma-joined string; entries keep their exact
/// spelling, duplicates collapse and empty segments are dropped. Iteration and
/// the serialized form are in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        raw.split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn intersection(&self, other: &ScopeSet) -> ScopeSet {
        self.0.intersection(&other.0).cloned().collect()
    }
}

impl FromIterator<String> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|name| !name.is_empty()).collect())
    }
}

impl<'a> FromIterator<&'a str> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.0.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        f.write_str(&joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collapses_duplicates_and_blank_segments() {
        let scopes = ScopeSet::parse("read,,admin,read,");
        assert_eq!(scopes.len(), 2);
        assert!(scopes.contains("read"));
        assert!(scopes.contains("admin"));
    }

    #[test]
    fn parse_keeps_exact_spelling() {
        let scopes = ScopeSet::parse("read, admin");
        assert!(scopes.contains(" admin"));
        assert!(!scopes.contains("admin"));
    }

    #[test]
    fn empty_string_is_empty_set() {
        assert!(ScopeSet::parse("").is_empty());
        assert_eq!(ScopeSet::new().to_string(), "");
    }

    #[test]
    fn display_is_sorted_and_comma_joined() {
        assert_eq!(ScopeSet::parse("write,admin,read").to_string(), "admin,read,write");
    }

    #[test]
    fn display_then_parse_is_stable() {
        let scopes = ScopeSet::parse("b,a,c,a");
        assert_eq!(ScopeSet::parse(&scopes.to_string()), scopes);
    }
}
