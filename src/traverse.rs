//! Graph navigation helpers shared by the algorithms.

use std::collections::{BTreeSet, VecDeque};

use crate::error::CollationError;
use crate::store::GraphTransaction;
use crate::types::{Reading, ReadingId, RelationScope, Section, SectionId, SectionRange, SequenceEdge};

/// Fetch a reading or fail with `ReadingNotFound`.
pub fn require_reading<T: GraphTransaction>(tx: &T, id: ReadingId) -> Result<Reading, CollationError> {
    tx.reading(id)
        .map_err(CollationError::from_store)?
        .ok_or(CollationError::ReadingNotFound(id))
}

/// Fetch a section or fail with `SectionNotFound`.
pub fn require_section<T: GraphTransaction>(
    tx: &T,
    id: SectionId,
    role: &'static str,
) -> Result<Section, CollationError> {
    tx.section(id)
        .map_err(CollationError::from_store)?
        .ok_or(CollationError::SectionNotFound { role, section: id })
}

/// Every sequence edge reachable from `start`, in breadth-first order.
///
/// Each reading is expanded once, so each edge is yielded exactly once even
/// when several paths lead to it. Neighbors are expanded in identifier order.
pub fn sequence_bfs<T: GraphTransaction>(tx: &T, start: ReadingId) -> Result<Vec<SequenceEdge>, CollationError> {
    let mut edges = Vec::new();
    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for edge in tx.outgoing_sequences(current).map_err(CollationError::from_store)? {
            if visited.insert(edge.target) {
                queue.push_back(edge.target);
            }
            edges.push(edge);
        }
    }
    Ok(edges)
}

/// Readings reachable from `start` over sequence edges, `start` included.
pub fn reachable<T: GraphTransaction>(tx: &T, start: ReadingId) -> Result<BTreeSet<ReadingId>, CollationError> {
    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for edge in tx.outgoing_sequences(current).map_err(CollationError::from_store)? {
            if visited.insert(edge.target) {
                queue.push_back(edge.target);
            }
        }
    }
    Ok(visited)
}

/// Check every relation touching `readings` for scope violations.
///
/// A section-local relation must join two readings of the same section.
pub fn check_relation_scopes<T: GraphTransaction>(
    tx: &T,
    readings: &BTreeSet<ReadingId>,
) -> Result<(), CollationError> {
    for &id in readings {
        let reading = require_reading(tx, id)?;
        for relation in tx.relations(id).map_err(CollationError::from_store)? {
            if relation.scope == RelationScope::Global {
                continue;
            }
            let other = require_reading(tx, relation.other(id))?;
            if other.section != reading.section {
                let (source, target) = if relation.source == id {
                    (&reading, &other)
                } else {
                    (&other, &reading)
                };
                return Err(CollationError::InvalidRelationScope {
                    relation_type: relation.relation_type,
                    source_id: source.id,
                    target_id: target.id,
                    source_section: source.section,
                    target_section: target.section,
                });
            }
        }
    }
    Ok(())
}

/// Resolve a section range to the sections it covers, in chain order.
///
/// Missing bounds default to the first and last section of the tradition.
pub fn resolve_range<T: GraphTransaction>(tx: &T, range: &SectionRange) -> Result<Vec<Section>, CollationError> {
    let sections = tx.sections().map_err(CollationError::from_store)?;

    let position = |id: SectionId, role: &'static str| {
        sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(CollationError::SectionNotFound { role, section: id })
    };

    let first = match range.start {
        Some(id) => position(id, "start")?,
        None => 0,
    };
    let last = match range.end {
        Some(id) => position(id, "end")?,
        None if sections.is_empty() => return Ok(Vec::new()),
        None => sections.len() - 1,
    };

    if last < first {
        return Err(CollationError::RangeOrder {
            start: sections[first].id,
            end: sections[last].id,
        });
    }
    Ok(sections[first..=last].to_vec())
}
