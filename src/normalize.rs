//! Normalization shadow graph.
//!
//! A normalization episode collapses every cluster of a section into its
//! representative and folds the section's sequence edges into an overlay of
//! shadow edges between representatives. The base graph is never touched.
//! Teardown removes the overlay and verifies that nothing was left behind.

use std::collections::{BTreeSet, VecDeque};

use crate::cluster::{clusters_in, RepresentativeMap};
use crate::error::CollationError;
use crate::store::GraphTransaction;
use crate::traverse::{require_section, sequence_bfs};
use crate::types::SectionId;

/// Build the normalization overlay of a section under `relation_type`.
///
/// Sequence edges are visited breadth-first from the section start. Each
/// edge `u -> v` is folded into the shadow edge `rep(u) -> rep(v)`, whose
/// witness layers become the per-layer union of every edge folded into it.
///
/// Fails with `NormalizationActive` if the section already has an episode.
pub fn build_normalization<T: GraphTransaction>(
    tx: &mut T,
    section: SectionId,
    relation_type: &str,
) -> Result<RepresentativeMap, CollationError> {
    let section = require_section(&*tx, section, "requested")?;
    if let Some(active) = tx.shadow_episode(section.id).map_err(CollationError::from_store)? {
        return Err(CollationError::NormalizationActive {
            section: section.id,
            relation_type: active,
        });
    }

    let map = RepresentativeMap::from_clusters(&clusters_in(&*tx, &[section.id], relation_type)?);
    let edges = sequence_bfs(&*tx, section.start)?;

    tx.open_shadow_episode(section.id, relation_type)
        .map_err(CollationError::from_store)?;
    let mut created = 0usize;
    for edge in &edges {
        let source = map.resolve(edge.source);
        let target = map.resolve(edge.target);
        if tx
            .merge_shadow_edge(section.id, source, target, &edge.layers)
            .map_err(CollationError::from_store)?
        {
            created += 1;
        }
    }

    tracing::info!(
        section = %section.id,
        relation_type = relation_type,
        sequence_edges = edges.len(),
        shadow_edges = created,
        representatives = map.representatives().len(),
        "Normalization built"
    );
    Ok(map)
}

/// Remove the normalization overlay of a section.
///
/// Deletes every shadow edge reachable from the section start over shadow
/// edges, then rescans the section for shadow edges by endpoint. Any edge
/// found by the rescan is a leak and fails the teardown with `Consistency`.
/// Returns the number of edges deleted.
pub fn teardown_normalization<T: GraphTransaction>(tx: &mut T, section: SectionId) -> Result<usize, CollationError> {
    let section = require_section(&*tx, section, "requested")?;
    let relation_type = tx
        .shadow_episode(section.id)
        .map_err(CollationError::from_store)?
        .ok_or(CollationError::NoActiveNormalization(section.id))?;

    let mut removed = 0usize;
    let mut visited = BTreeSet::from([section.start]);
    let mut queue = VecDeque::from([section.start]);
    while let Some(current) = queue.pop_front() {
        for edge in tx
            .outgoing_shadows(section.id, current)
            .map_err(CollationError::from_store)?
        {
            if tx
                .remove_shadow_edge(section.id, edge.source, edge.target)
                .map_err(CollationError::from_store)?
            {
                removed += 1;
            }
            if visited.insert(edge.target) {
                queue.push_back(edge.target);
            }
        }
    }

    let leaked = tx
        .shadow_edges_in_section(section.id)
        .map_err(CollationError::from_store)?;
    if !leaked.is_empty() {
        tracing::error!(
            section = %section.id,
            relation_type = %relation_type,
            leaked = leaked.len(),
            "Shadow edges left after normalization teardown"
        );
        return Err(CollationError::Consistency(format!(
            "{} shadow edge(s) remain on normalisation of section {}",
            leaked.len(),
            section.id
        )));
    }

    tx.close_shadow_episode(section.id)
        .map_err(CollationError::from_store)?;
    tracing::info!(
        section = %section.id,
        relation_type = %relation_type,
        removed = removed,
        "Normalization removed"
    );
    Ok(removed)
}
