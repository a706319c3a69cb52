//! Relation clustering.
//!
//! Partitions the readings of one or more sections into clusters of readings
//! joined by relations that bind at least as tightly as a chosen relation
//! type, and picks one representative reading per cluster.
//!
//! Clustering is read-only: it never writes to the transaction.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::error::CollationError;
use crate::store::GraphTransaction;
use crate::traverse::{require_reading, require_section};
use crate::types::{Reading, ReadingId, RelationScope, SectionId};

/// A set of mutually related readings with its representative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// Member readings.
    pub members: BTreeSet<ReadingId>,
    /// The member standing in for the whole cluster.
    pub representative: ReadingId,
}

impl Cluster {
    /// True for clusters of one reading.
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Mapping from every reading in a clustering scope to its representative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepresentativeMap {
    map: BTreeMap<ReadingId, ReadingId>,
}

impl RepresentativeMap {
    /// Build the map from a clustering result.
    pub fn from_clusters(clusters: &[Cluster]) -> Self {
        let map = clusters
            .iter()
            .flat_map(|c| c.members.iter().map(move |&m| (m, c.representative)))
            .collect();
        Self { map }
    }

    /// Representative of a reading, if the reading is in scope.
    pub fn get(&self, id: ReadingId) -> Option<ReadingId> {
        self.map.get(&id).copied()
    }

    /// Representative of a reading, or the reading itself when out of scope.
    pub fn resolve(&self, id: ReadingId) -> ReadingId {
        self.get(id).unwrap_or(id)
    }

    /// Whether a reading is in scope.
    pub fn contains(&self, id: ReadingId) -> bool {
        self.map.contains_key(&id)
    }

    /// Distinct representatives.
    pub fn representatives(&self) -> BTreeSet<ReadingId> {
        self.map.values().copied().collect()
    }

    /// Iterate `(reading, representative)` in reading order.
    pub fn iter(&self) -> impl Iterator<Item = (ReadingId, ReadingId)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }

    /// Number of readings in scope.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the scope is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Cluster the section of `scope` under `relation_type`.
pub fn clusters<T: GraphTransaction>(
    tx: &T,
    scope: ReadingId,
    relation_type: &str,
) -> Result<Vec<Cluster>, CollationError> {
    let section = require_reading(tx, scope)?.section;
    clusters_in(tx, &[section], relation_type)
}

/// Cluster the readings of `sections` under `relation_type`.
///
/// A relation qualifies when its type binds at least as tightly as
/// `relation_type`, both endpoints are in scope, and a section-local relation
/// stays within one section. Every reading in scope ends up in exactly one
/// cluster; untouched readings form singletons. Clusters are returned ordered
/// by their lowest member.
pub fn clusters_in<T: GraphTransaction>(
    tx: &T,
    sections: &[SectionId],
    relation_type: &str,
) -> Result<Vec<Cluster>, CollationError> {
    let ontology = tx.ontology().map_err(CollationError::from_store)?;
    let level = ontology
        .bind_level(relation_type)
        .ok_or_else(|| CollationError::UnknownRelationType(relation_type.to_string()))?;

    let mut readings: BTreeMap<ReadingId, Reading> = BTreeMap::new();
    for &section in sections {
        require_section(tx, section, "requested")?;
        for id in tx.section_readings(section).map_err(CollationError::from_store)? {
            readings.insert(id, require_reading(tx, id)?);
        }
    }
    let index: BTreeMap<ReadingId, usize> = readings.keys().enumerate().map(|(i, &id)| (id, i)).collect();
    let mut components = UnionFind::<usize>::new(index.len());

    let mut merged = 0usize;
    for (&id, reading) in &readings {
        for relation in tx.relations(id).map_err(CollationError::from_store)? {
            let edge_level = ontology.bind_level(&relation.relation_type).ok_or_else(|| {
                CollationError::Consistency(format!(
                    "relation {}-{} has undeclared type {}",
                    relation.source, relation.target, relation.relation_type
                ))
            })?;
            if edge_level > level {
                continue;
            }
            let other = relation.other(id);
            let Some(other_reading) = readings.get(&other) else {
                continue;
            };
            if relation.scope == RelationScope::Local && other_reading.section != reading.section {
                continue;
            }
            if components.union(index[&id], index[&other]) {
                merged += 1;
            }
        }
    }

    let mut groups: BTreeMap<usize, BTreeSet<ReadingId>> = BTreeMap::new();
    for (&id, &i) in &index {
        groups.entry(components.find(i)).or_default().insert(id);
    }

    let mut result: Vec<Cluster> = groups
        .into_values()
        .filter_map(|members| {
            let representative = choose_representative(&members, &readings)?;
            Some(Cluster { members, representative })
        })
        .collect();
    result.sort_by_key(|c| c.members.first().copied());

    tracing::debug!(
        relation_type = relation_type,
        bind_level = level,
        readings = readings.len(),
        unions = merged,
        clusters = result.len(),
        "Clustering complete"
    );
    Ok(result)
}

/// Pick the representative of a cluster.
///
/// Priority: lowest-id lemma, then lowest-id reading whose normal form
/// differs from its text, then lowest id.
fn choose_representative(
    members: &BTreeSet<ReadingId>,
    readings: &BTreeMap<ReadingId, Reading>,
) -> Option<ReadingId> {
    let in_cluster = || members.iter().filter_map(|id| readings.get(id));
    in_cluster()
        .find(|r| r.is_lemma)
        .or_else(|| in_cluster().find(|r| r.has_distinct_normal_form()))
        .map(|r| r.id)
        .or_else(|| members.first().copied())
}
