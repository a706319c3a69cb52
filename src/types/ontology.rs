//! Relation type ontology.
//!
//! Every tradition carries its own mapping from relation type name to bind
//! level and default scope. Clustering under a type `T` merges every relation
//! whose type binds at least as tightly as `T`, i.e. whose bind level is
//! `<= bind_level(T)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::edge::RelationScope;

/// A declared relation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationType {
    /// Type name.
    pub name: String,
    /// Tightness; lower binds tighter.
    pub bind_level: i32,
    /// Default scope for new relations of this type.
    pub scope: RelationScope,
}

impl RelationType {
    /// Create a new relation type.
    pub fn new(name: impl Into<String>, bind_level: i32, scope: RelationScope) -> Self {
        Self {
            name: name.into(),
            bind_level,
            scope,
        }
    }
}

/// Mapping from type name to relation type for one tradition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTypeOntology {
    types: BTreeMap<String, RelationType>,
}

impl RelationTypeOntology {
    /// Create an empty ontology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ontology pre-populated with the standard collocated relation types.
    pub fn with_defaults() -> Self {
        let mut ontology = Self::new();
        for (name, level) in [
            ("orthographic", 0),
            ("uncertain", 0),
            ("spelling", 1),
            ("punctuation", 2),
            ("grammatical", 2),
            ("lexical", 2),
            ("other", 3),
            ("collated", 50),
        ] {
            ontology.insert(RelationType::new(name, level, RelationScope::Local));
        }
        ontology
    }

    /// Declare or replace a relation type.
    pub fn insert(&mut self, relation_type: RelationType) {
        self.types.insert(relation_type.name.clone(), relation_type);
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&RelationType> {
        self.types.get(name)
    }

    /// Whether a type is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Bind level of a type.
    pub fn bind_level(&self, name: &str) -> Option<i32> {
        self.types.get(name).map(|t| t.bind_level)
    }

    /// Names of all types binding at least as tightly as `name`.
    pub fn types_within(&self, name: &str) -> Option<Vec<&str>> {
        let level = self.bind_level(name)?;
        Some(
            self.types
                .values()
                .filter(|t| t.bind_level <= level)
                .map(|t| t.name.as_str())
                .collect(),
        )
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
