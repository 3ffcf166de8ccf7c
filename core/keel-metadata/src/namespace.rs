use std::collections::HashMap;

use crate::ConfigurationError;

/// A declared root namespace and the entity classes it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    members: Vec<String>,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// Root namespace → ordered member classes, with a member → namespace index.
///
/// Invariant: every member belongs to exactly one namespace, and appears once.
/// Namespaces and members keep their encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    namespaces: Vec<Namespace>,
    by_name: HashMap<String, usize>,
    owners: HashMap<String, usize>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a namespace (idempotent) and returns its position.
    pub fn declare(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        let idx = self.namespaces.len();
        self.namespaces.push(Namespace {
            name: name.to_string(),
            members: Vec::new(),
        });
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    /// Adds `member` to the namespace at `idx`.
    ///
    /// Fails if the member is already owned by any namespace, this one
    /// included.
    ///
    /// # Panics
    /// If `idx` was not returned by [`declare`](Self::declare) on this map.
    pub fn insert_member(&mut self, idx: usize, member: &str) -> Result<(), ConfigurationError> {
        if let Some(&owner) = self.owners.get(member) {
            return Err(ConfigurationError::DuplicateMember {
                member: member.to_string(),
                namespace: self.namespaces[owner].name.clone(),
            });
        }
        self.namespaces[idx].members.push(member.to_string());
        self.owners.insert(member.to_string(), idx);
        Ok(())
    }

    /// First declared namespace whose name is a strict dot prefix of
    /// `member`, as the position to pass to [`insert_member`](Self::insert_member).
    pub fn owning_namespace_for(&self, member: &str) -> Option<usize> {
        self.namespaces.iter().position(|ns| {
            member.len() > ns.name.len() + 1
                && member.starts_with(ns.name.as_str())
                && member.as_bytes()[ns.name.len()] == b'.'
        })
    }

    /// Namespace that currently owns `member`.
    pub fn namespace_of(&self, member: &str) -> Option<&str> {
        self.owners
            .get(member)
            .map(|&idx| self.namespaces[idx].name.as_str())
    }

    pub fn contains_member(&self, member: &str) -> bool {
        self.owners.contains_key(member)
    }

    pub fn get(&self, namespace: &str) -> Option<&Namespace> {
        self.by_name.get(namespace).map(|&idx| &self.namespaces[idx])
    }

    pub fn members(&self, namespace: &str) -> Option<&[String]> {
        self.get(namespace).map(Namespace::members)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// All members across namespaces, in namespace order.
    pub fn all_members(&self) -> impl Iterator<Item = &str> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.members.iter().map(String::as_str))
    }

    /// Number of namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.owners.len()
    }
}
