//! Entity metadata
//!
//! Describes the members of each entity so the expression parser can
//! reject unknown members and nesting under scalars.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{DataAccessError, DataResult};

/// Kind of an entity member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MemberKind {
    /// Plain value
    Scalar,
    /// Navigation to another entity
    Relation {
        /// Name of the related entity
        target: String,
    },
}

impl MemberKind {
    pub fn is_scalar(&self) -> bool {
        matches!(self, MemberKind::Scalar)
    }
}

/// Members of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    pub members: BTreeMap<String, MemberKind>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn scalar(mut self, member: impl Into<String>) -> Self {
        self.members.insert(member.into(), MemberKind::Scalar);
        self
    }

    pub fn relation(mut self, member: impl Into<String>, target: impl Into<String>) -> Self {
        self.members.insert(
            member.into(),
            MemberKind::Relation {
                target: target.into(),
            },
        );
        self
    }

    pub fn member(&self, name: &str) -> Option<&MemberKind> {
        self.members.get(name)
    }
}

/// Registry of entity metadata
#[derive(Debug, Clone, Default)]
pub struct MetadataContainer {
    entities: HashMap<String, EntityMetadata>,
}

impl MetadataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, replacing any previous definition
    pub fn register(&mut self, entity: EntityMetadata) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn with(mut self, entity: EntityMetadata) -> Self {
        self.register(entity);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntityMetadata> {
        self.entities.get(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Parse a JSON array of entity definitions
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        let entities: Vec<EntityMetadata> = serde_json::from_str(json).map_err(|e| {
            DataAccessError::configuration(format!("Invalid metadata JSON: {}", e))
        })?;

        let mut container = Self::new();
        for entity in entities {
            if entity.name.trim().is_empty() {
                return Err(DataAccessError::configuration(
                    "metadata entity with empty name",
                ));
            }
            container.register(entity);
        }
        Ok(container)
    }

    /// Load entity definitions from a JSON file
    pub fn load(path: &Path) -> DataResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DataAccessError::configuration(format!(
                "Failed to read metadata file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }
}
