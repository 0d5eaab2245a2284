//! Schema tree
//!
//! A parsed member-selection expression. Equality is structural: member
//! order in the source expression does not matter.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// The members selected at one level of the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSet {
    /// `*`: every member of this level
    #[serde(default)]
    pub wildcard: bool,
    #[serde(default)]
    pub members: BTreeMap<String, SchemaMember>,
    /// `!name`: removed after the wildcard is expanded
    #[serde(default)]
    pub excludes: BTreeSet<String>,
}

impl MemberSet {
    /// `{*}`
    pub fn all() -> Self {
        Self {
            wildcard: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.members.is_empty() && self.excludes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SchemaMember> {
        self.members.get(name)
    }

    /// Whether `name` is selected at this level
    pub fn includes(&self, name: &str) -> bool {
        if self.excludes.contains(name) {
            return false;
        }
        self.wildcard || self.members.contains_key(name)
    }

    /// Add a member; selecting the same name twice merges the children
    pub fn insert(&mut self, member: SchemaMember) {
        match self.members.get_mut(&member.name) {
            Some(existing) => existing.merge(member),
            None => {
                self.members.insert(member.name.clone(), member);
            }
        }
    }

    pub fn exclude(&mut self, name: impl Into<String>) {
        self.excludes.insert(name.into());
    }
}

impl fmt::Display for MemberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.wildcard {
            parts.push("*".to_string());
        }
        for exclude in &self.excludes {
            parts.push(format!("!{}", exclude));
        }
        for member in self.members.values() {
            parts.push(member.to_string());
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// One selected member, optionally with a nested selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMember {
    pub name: String,
    #[serde(default)]
    pub children: Option<MemberSet>,
}

impl SchemaMember {
    /// A member without nested selection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: None,
        }
    }

    /// A member with every nested member selected; same as `name{*}`
    pub fn all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Some(MemberSet::all()),
        }
    }

    pub fn with_children(name: impl Into<String>, children: MemberSet) -> Self {
        Self {
            name: name.into(),
            children: Some(children),
        }
    }

    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    fn merge(&mut self, other: SchemaMember) {
        let Some(incoming) = other.children else {
            return;
        };
        match &mut self.children {
            None => self.children = Some(incoming),
            Some(current) => {
                current.wildcard |= incoming.wildcard;
                current.excludes.extend(incoming.excludes);
                for member in incoming.members.into_values() {
                    current.insert(member);
                }
            }
        }
    }
}

impl fmt::Display for SchemaMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.children {
            Some(children) => write!(f, "{}{{{}}}", self.name, children),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A parsed schema for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Entity the expression was parsed against
    pub name: String,
    /// Runtime payload type, when the caller supplied one
    #[serde(default)]
    pub target: Option<String>,
    pub members: MemberSet,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            members: MemberSet::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_member(mut self, member: SchemaMember) -> Self {
        self.members.insert(member);
        self
    }

    pub fn member(&self, name: &str) -> Option<&SchemaMember> {
        self.members.get(name)
    }

    /// Canonical expression, parseable back into an equal schema
    pub fn expression(&self) -> String {
        self.members.to_string()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_equals_explicit_wildcard() {
        let mut children = MemberSet::default();
        children.wildcard = true;
        assert_eq!(
            SchemaMember::all("Role"),
            SchemaMember::with_children("Role", children)
        );
    }

    #[test]
    fn test_insert_merges_children() {
        let mut set = MemberSet::default();
        set.insert(SchemaMember::new("Creator"));
        let mut nested = MemberSet::default();
        nested.insert(SchemaMember::new("Name"));
        set.insert(SchemaMember::with_children("Creator", nested));
        set.insert(SchemaMember::all("Creator"));

        let creator = set.get("Creator").unwrap();
        let children = creator.children.as_ref().unwrap();
        assert!(children.wildcard);
        assert!(children.members.contains_key("Name"));
    }

    #[test]
    fn test_display_is_canonical() {
        let mut set = MemberSet::all();
        set.exclude("Password");
        set.insert(SchemaMember::all("Roles"));
        set.insert(SchemaMember::new("Creator"));

        assert_eq!(set.to_string(), "*, !Password, Creator, Roles{*}");
    }

    #[test]
    fn test_includes() {
        let mut set = MemberSet::all();
        set.exclude("Secret");
        assert!(set.includes("Name"));
        assert!(!set.includes("Secret"));

        let mut explicit = MemberSet::default();
        explicit.insert(SchemaMember::new("Name"));
        assert!(explicit.includes("Name"));
        assert!(!explicit.includes("Age"));
    }
}
