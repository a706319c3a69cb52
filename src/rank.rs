//! Rank propagation.
//!
//! Assigns every reading reachable from a start node the minimal rank such
//! that sequence edges strictly increase rank and related readings share one
//! rank.
//!
//! ## Algorithm
//!
//! 1. Raise the start node above its direct predecessors, if it has any
//! 2. Push the start node onto a min-heap keyed by `(rank, id)`
//! 3. While the heap is not empty:
//!    - Pop the lowest candidate; skip it if its rank is stale
//!    - Raise the node to the highest rank among its related readings,
//!      then raise lower related readings to match and push them
//!    - Push every sequence successor whose rank is `<=` the node's rank,
//!      after setting it to `rank + 1`
//!
//! Ranks only increase, so the loop terminates whenever the sequence edges
//! form a DAG. Cycles are a precondition violation and are not detected.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};

use serde::Serialize;

use crate::error::CollationError;
use crate::store::GraphTransaction;
use crate::traverse::{check_relation_scopes, reachable, require_reading, require_section};
use crate::types::{ReadingId, SectionId};

/// A rank change applied by one propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankChange {
    /// Rank before the run.
    pub from: u64,
    /// Rank after the run.
    pub to: u64,
}

/// Outcome of a propagation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankReport {
    /// Number of worklist pops that were not stale.
    pub processed: usize,
    /// Readings whose rank differs from before the run.
    pub changes: BTreeMap<ReadingId, RankChange>,
}

impl RankReport {
    /// Whether any rank changed.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of readings whose rank changed.
    pub fn num_changed(&self) -> usize {
        self.changes.len()
    }
}

/// Worklist entry, ordered so that the max-heap pops the lowest `(rank, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RankCandidate {
    rank: u64,
    id: ReadingId,
}

impl PartialOrd for RankCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Primary: lower rank first
        // Secondary: lower ReadingId first
        (self.rank, self.id).cmp(&(other.rank, other.id)).reverse()
    }
}

/// Working rank state: reads through to the transaction, records changes.
struct RankState<'a, T: GraphTransaction> {
    tx: &'a mut T,
    ranks: BTreeMap<ReadingId, u64>,
    before: BTreeMap<ReadingId, u64>,
}

impl<'a, T: GraphTransaction> RankState<'a, T> {
    fn new(tx: &'a mut T) -> Self {
        Self {
            tx,
            ranks: BTreeMap::new(),
            before: BTreeMap::new(),
        }
    }

    fn get(&mut self, id: ReadingId) -> Result<u64, CollationError> {
        if let Some(&rank) = self.ranks.get(&id) {
            return Ok(rank);
        }
        let rank = require_reading(&*self.tx, id)?.rank;
        self.ranks.insert(id, rank);
        Ok(rank)
    }

    fn set(&mut self, id: ReadingId, rank: u64) -> Result<(), CollationError> {
        let old = self.get(id)?;
        self.before.entry(id).or_insert(old);
        self.ranks.insert(id, rank);
        self.tx.set_rank(id, rank).map_err(CollationError::from_store)
    }

    fn into_changes(self) -> BTreeMap<ReadingId, RankChange> {
        self.before
            .into_iter()
            .filter_map(|(id, from)| {
                let to = self.ranks.get(&id).copied().unwrap_or(from);
                (from != to).then_some((id, RankChange { from, to }))
            })
            .collect()
    }
}

/// Propagate ranks from `start`.
///
/// The start keeps its current rank unless a direct predecessor forces it
/// higher. Every reading reachable over sequence and relation edges is
/// checked for scope violations before any rank is written.
pub fn assign_ranks<T: GraphTransaction>(tx: &mut T, start: ReadingId) -> Result<RankReport, CollationError> {
    assign_ranks_covering(tx, start, &[])
}

/// Like [`assign_ranks`], but first require every reading in `required` to be
/// reachable from `start`.
pub fn assign_ranks_covering<T: GraphTransaction>(
    tx: &mut T,
    start: ReadingId,
    required: &[ReadingId],
) -> Result<RankReport, CollationError> {
    require_reading(&*tx, start)?;
    let seen = reachable(&*tx, start)?;
    if let Some(&missing) = required.iter().find(|id| !seen.contains(id)) {
        return Err(CollationError::Unreachable { reading: missing, start });
    }
    check_relation_scopes(&*tx, &closure(&*tx, start)?)?;

    propagate(RankState::new(tx), start)
}

/// Recompute every rank of a section from scratch.
///
/// Resets all non-start readings to rank 0 and propagates from the section's
/// start sentinel. Fails without writing anything if a reading of the section
/// cannot be reached from the start. The end sentinel of a section without
/// any sequence edge into it is exempt and stays at rank 0.
pub fn rank_section<T: GraphTransaction>(tx: &mut T, section: SectionId) -> Result<RankReport, CollationError> {
    let section = require_section(&*tx, section, "requested")?;
    let members = tx.section_readings(section.id).map_err(CollationError::from_store)?;
    let seen = reachable(&*tx, section.start)?;
    for &id in &members {
        if seen.contains(&id) {
            continue;
        }
        // A section no witness reads through has no path to its end.
        if id == section.end && tx.incoming_sequences(id).map_err(CollationError::from_store)?.is_empty() {
            continue;
        }
        return Err(CollationError::Unreachable {
            reading: id,
            start: section.start,
        });
    }
    check_relation_scopes(&*tx, &closure(&*tx, section.start)?)?;

    tracing::debug!(section = %section.id, readings = members.len(), "Resetting section ranks");
    let mut state = RankState::new(tx);
    for id in members {
        if id != section.start && state.get(id)? != 0 {
            state.set(id, 0)?;
        }
    }
    propagate(state, section.start)
}

/// Readings reachable from `start` over sequence and relation edges.
fn closure<T: GraphTransaction>(tx: &T, start: ReadingId) -> Result<BTreeSet<ReadingId>, CollationError> {
    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let successors = tx.outgoing_sequences(current).map_err(CollationError::from_store)?;
        let related = tx.relations(current).map_err(CollationError::from_store)?;
        let neighbors = successors
            .into_iter()
            .map(|e| e.target)
            .chain(related.iter().map(|r| r.other(current)));
        for next in neighbors {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    Ok(visited)
}

fn propagate<T: GraphTransaction>(mut state: RankState<'_, T>, start: ReadingId) -> Result<RankReport, CollationError> {
    let mut floor = None;
    for edge in state.tx.incoming_sequences(start).map_err(CollationError::from_store)? {
        let pred = state.get(edge.source)? + 1;
        floor = Some(floor.map_or(pred, |f: u64| f.max(pred)));
    }
    if let Some(floor) = floor {
        if state.get(start)? < floor {
            state.set(start, floor)?;
        }
    }

    let mut processed = 0;
    let mut frontier = BinaryHeap::new();
    frontier.push(RankCandidate {
        rank: state.get(start)?,
        id: start,
    });

    while let Some(candidate) = frontier.pop() {
        let current = candidate.id;
        let mut rank = state.get(current)?;
        if rank != candidate.rank {
            // Superseded by a later push at a higher rank
            continue;
        }
        processed += 1;

        let related: Vec<ReadingId> = state
            .tx
            .relations(current)
            .map_err(CollationError::from_store)?
            .iter()
            .map(|r| r.other(current))
            .collect();
        if !related.is_empty() {
            let mut highest = rank;
            for &other in &related {
                highest = highest.max(state.get(other)?);
            }
            if highest > rank {
                state.set(current, highest)?;
                rank = highest;
            }
            for &other in &related {
                if state.get(other)? < rank {
                    state.set(other, rank)?;
                    frontier.push(RankCandidate { rank, id: other });
                }
            }
        }

        for edge in state.tx.outgoing_sequences(current).map_err(CollationError::from_store)? {
            if state.get(edge.target)? <= rank {
                state.set(edge.target, rank + 1)?;
                frontier.push(RankCandidate {
                    rank: rank + 1,
                    id: edge.target,
                });
            }
        }
    }

    let changes = state.into_changes();

    tracing::debug!(
        start = %start,
        processed = processed,
        changed = changes.len(),
        "Rank propagation complete"
    );

    Ok(RankReport { processed, changes })
}
