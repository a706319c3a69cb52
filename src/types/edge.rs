//! Edge types for the variant graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use super::ids::ReadingId;

/// Per-layer witness annotations carried by a sequence edge.
///
/// Maps a layer key (the base layer conventionally under `"witnesses"`) to the
/// sorted set of witness sigils that traverse the edge on that layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WitnessLayers(BTreeMap<String, BTreeSet<String>>);

impl WitnessLayers {
    /// Create an empty annotation set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotation with a single layer.
    pub fn single<I, S>(layer: &str, sigils: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut layers = Self::new();
        layers.add(layer, sigils);
        layers
    }

    /// Add witnesses to a layer (set union).
    pub fn add<I, S>(&mut self, layer: &str, sigils: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.0.entry(layer.to_string()).or_default();
        entry.extend(sigils.into_iter().map(Into::into));
    }

    /// Merge another annotation set into this one, layer by layer.
    pub fn merge(&mut self, other: &WitnessLayers) {
        for (layer, sigils) in &other.0 {
            self.0
                .entry(layer.clone())
                .or_default()
                .extend(sigils.iter().cloned());
        }
    }

    /// Whether `sigil` traverses this edge on `layer`.
    pub fn contains(&self, layer: &str, sigil: &str) -> bool {
        self.0.get(layer).map_or(false, |s| s.contains(sigil))
    }

    /// Witnesses on a layer, if the layer is present.
    pub fn witnesses(&self, layer: &str) -> Option<&BTreeSet<String>> {
        self.0.get(layer)
    }

    /// Iterate `(layer, witnesses)` in layer order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True if no layer carries any witness.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

/// Directed "A is immediately followed by B" edge between two readings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceEdge {
    /// Preceding reading.
    pub source: ReadingId,
    /// Following reading.
    pub target: ReadingId,
    /// Witnesses per layer.
    pub layers: WitnessLayers,
}

impl SequenceEdge {
    /// Create a new sequence edge.
    pub fn new(source: ReadingId, target: ReadingId, layers: WitnessLayers) -> Self {
        Self { source, target, layers }
    }
}

// Canonical ordering: source, then target
impl PartialOrd for SequenceEdge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SequenceEdge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.source, self.target).cmp(&(other.source, other.target))
    }
}

/// Reach of a relation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationScope {
    /// Valid only inside one section.
    Local,
    /// Valid across the whole tradition.
    Global,
}

impl RelationScope {
    /// Parse a scope from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" | "section" => Some(Self::Local),
            "global" | "document" | "tradition" => Some(Self::Global),
            _ => None,
        }
    }
}

impl Default for RelationScope {
    fn default() -> Self {
        Self::Local
    }
}

impl std::fmt::Display for RelationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// Scholarly near-equivalence judgment between two readings.
///
/// Undirected in meaning; `source`/`target` only record how it was created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationEdge {
    /// First reading.
    pub source: ReadingId,
    /// Second reading.
    pub target: ReadingId,
    /// Relation type name (must exist in the tradition ontology).
    pub relation_type: String,
    /// Scope of the judgment.
    pub scope: RelationScope,
}

impl RelationEdge {
    /// Create a new relation edge.
    pub fn new(
        source: ReadingId,
        target: ReadingId,
        relation_type: impl Into<String>,
        scope: RelationScope,
    ) -> Self {
        Self {
            source,
            target,
            relation_type: relation_type.into(),
            scope,
        }
    }

    /// The endpoint opposite to `id`.
    pub fn other(&self, id: ReadingId) -> ReadingId {
        if self.source == id {
            self.target
        } else {
            self.source
        }
    }
}

/// Edge of a normalization overlay between two representative readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowEdge {
    /// Representative of the original source.
    pub source: ReadingId,
    /// Representative of the original target.
    pub target: ReadingId,
    /// Union of the annotations of every original edge folded into this one.
    pub layers: WitnessLayers,
}
