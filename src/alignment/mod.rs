//! Alignment table builder.
//!
//! Reconstructs each witness (and each of its layers) as a row of tokens
//! indexed by rank across a range of sections.
//!
//! ## Algorithm
//!
//! 1. Resolve the section range; the table length is the sum over sections of
//!    `rank(end) - 1`, and each section's columns start after the previous one
//! 2. Optionally cluster the whole range under the conflation type
//! 3. Collect each witness's layers from the sequence edges in range
//! 4. For every witness and layer, walk one path per section from the start
//!    sentinel and place each reading at `offset + rank - 1`
//! 5. Drop empty rows and sort the rest by label

pub mod path;

use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::{clusters_in, RepresentativeMap};
use crate::config::KernelConfig;
use crate::error::CollationError;
use crate::store::GraphTransaction;
use crate::traverse::{require_reading, resolve_range, sequence_bfs};
use crate::types::{AlignmentTable, Reading, ReadingId, Section, SectionRange, Token, WitnessRow};

pub use path::{classify, select_edges, PathChoice};

/// A section placed in the table.
struct PlacedSection {
    section: Section,
    offset: u64,
    width: u64,
}

/// Build the alignment table for `range`.
///
/// With `conflate` set, every reading is replaced by its representative under
/// that relation type, computed over the whole range.
pub fn build_alignment<T: GraphTransaction>(
    tx: &T,
    range: &SectionRange,
    conflate: Option<&str>,
    config: &KernelConfig,
) -> Result<AlignmentTable, CollationError> {
    let sections = resolve_range(tx, range)?;
    let section_ids: Vec<_> = sections.iter().map(|s| s.id).collect();

    let representatives = match conflate {
        Some(relation_type) => Some(RepresentativeMap::from_clusters(&clusters_in(
            tx,
            &section_ids,
            relation_type,
        )?)),
        None => None,
    };

    let mut placed = Vec::with_capacity(sections.len());
    let mut length = 0u64;
    for section in sections {
        let width = require_reading(tx, section.end)?.rank.saturating_sub(1);
        placed.push(PlacedSection {
            section,
            offset: length,
            width,
        });
        length += width;
    }

    let mut layers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for sigil in tx.witnesses().map_err(CollationError::from_store)? {
        layers.entry(sigil).or_default();
    }
    for p in &placed {
        for edge in sequence_bfs(tx, p.section.start)? {
            for (layer, sigils) in edge.layers.iter() {
                if config.is_base_layer(layer) {
                    continue;
                }
                for sigil in sigils {
                    layers.entry(sigil.clone()).or_default().insert(layer.to_string());
                }
            }
        }
    }

    tracing::debug!(
        sections = placed.len(),
        length = length,
        witnesses = layers.len(),
        conflate = conflate.unwrap_or("-"),
        "Building alignment"
    );

    let mut rows = Vec::new();
    for (sigil, extra) in &layers {
        let row_layers = std::iter::once(None).chain(extra.iter().map(|l| Some(l.as_str())));
        for layer in row_layers {
            let tokens = witness_tokens(tx, &placed, length, sigil, layer, representatives.as_ref(), config)?;
            if tokens.iter().all(Token::is_absent) {
                continue;
            }
            let row = match layer {
                None => WitnessRow {
                    witness: sigil.clone(),
                    base: None,
                    tokens,
                },
                Some(layer) => WitnessRow {
                    witness: format!("{} ({})", sigil, layer),
                    base: Some(sigil.clone()),
                    tokens,
                },
            };
            rows.push(row);
        }
    }
    rows.sort_by(|a, b| a.witness.cmp(&b.witness));

    tracing::debug!(rows = rows.len(), length = length, "Alignment built");
    Ok(AlignmentTable { length, alignment: rows })
}

/// Token row of one witness layer across all placed sections.
fn witness_tokens<T: GraphTransaction>(
    tx: &T,
    placed: &[PlacedSection],
    length: u64,
    sigil: &str,
    layer: Option<&str>,
    representatives: Option<&RepresentativeMap>,
    config: &KernelConfig,
) -> Result<Vec<Token>, CollationError> {
    let mut tokens: Vec<Token> = Vec::with_capacity(length as usize);

    for p in placed {
        for reading in witness_path(tx, &p.section, sigil, layer, config)? {
            let column = p.offset + reading.rank.saturating_sub(1);
            if reading.rank == 0 || reading.rank > p.width || column < tokens.len() as u64 {
                return Err(CollationError::Consistency(format!(
                    "reading {} of witness {} has rank {} out of order in section {}",
                    reading.id, sigil, reading.rank, p.section.id
                )));
            }

            let filler = match tokens.last() {
                Some(Token::Lacuna(lacuna)) if config.fill_lacuna_gaps => Token::Lacuna(lacuna.clone()),
                _ => Token::Absent,
            };
            tokens.resize(column as usize, filler);

            let shown = match representatives.map(|m| m.resolve(reading.id)) {
                Some(rep) if rep != reading.id => require_reading(tx, rep)?,
                _ => reading,
            };
            tokens.push(if shown.is_lacuna {
                Token::Lacuna(shown)
            } else {
                Token::Reading(shown)
            });
        }
    }

    tokens.resize(length as usize, Token::Absent);
    Ok(tokens)
}

/// Readings of one witness layer in a section, sentinels excluded.
///
/// Follows exactly one edge per reading. When the graph offers several, the
/// lowest target wins and a warning is logged.
fn witness_path<T: GraphTransaction>(
    tx: &T,
    section: &Section,
    sigil: &str,
    layer: Option<&str>,
    config: &KernelConfig,
) -> Result<Vec<Reading>, CollationError> {
    let mut readings = Vec::new();
    let mut visited: BTreeSet<ReadingId> = BTreeSet::from([section.start]);
    let mut current = section.start;

    loop {
        let outgoing = tx.outgoing_sequences(current).map_err(CollationError::from_store)?;
        let chosen = select_edges(&outgoing, sigil, layer, &config.base_layer_key);
        let Some(next) = chosen.first().map(|e| e.target) else {
            break;
        };
        if chosen.len() > 1 {
            tracing::warn!(
                witness = sigil,
                layer = layer.unwrap_or(config.base_layer_label.as_str()),
                reading = %current,
                branches = chosen.len(),
                "Witness path branches; following lowest target"
            );
        }
        if next == section.end {
            break;
        }
        if !visited.insert(next) {
            tracing::warn!(witness = sigil, reading = %next, "Witness path revisits a reading");
            break;
        }
        readings.push(require_reading(tx, next)?);
        current = next;
    }
    Ok(readings)
}
