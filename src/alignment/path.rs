//! Witness path selection.
//!
//! Pure functions deciding which outgoing sequence edges a witness follows on
//! a given layer. They take no graph handle so they can be tested on plain
//! edge lists.

use crate::types::{SequenceEdge, WitnessLayers};

/// How an edge relates to a witness on a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChoice {
    /// The edge carries the witness on the requested non-base layer.
    Layer,
    /// The edge carries the witness on the base layer.
    Base,
    /// The witness does not traverse the edge.
    Excluded,
}

/// Classify one edge for `witness` on `layer` (`None` for the base layer).
pub fn classify(layers: &WitnessLayers, witness: &str, layer: Option<&str>, base_key: &str) -> PathChoice {
    match layer {
        Some(layer) if layers.contains(layer, witness) => PathChoice::Layer,
        _ if layers.contains(base_key, witness) => PathChoice::Base,
        _ => PathChoice::Excluded,
    }
}

/// Outgoing edges of one reading that `witness` follows on `layer`.
///
/// Layer annotations win over base annotations: if any edge carries the
/// witness on the requested layer, only those edges are followed. Otherwise
/// the witness falls back to its base-layer edges. The input order is kept.
pub fn select_edges<'e>(
    edges: &'e [SequenceEdge],
    witness: &str,
    layer: Option<&str>,
    base_key: &str,
) -> Vec<&'e SequenceEdge> {
    let choices: Vec<PathChoice> = edges
        .iter()
        .map(|e| classify(&e.layers, witness, layer, base_key))
        .collect();
    let wanted = if choices.contains(&PathChoice::Layer) {
        PathChoice::Layer
    } else {
        PathChoice::Base
    };
    edges
        .iter()
        .zip(choices)
        .filter(|(_, choice)| *choice == wanted)
        .map(|(edge, _)| edge)
        .collect()
}
