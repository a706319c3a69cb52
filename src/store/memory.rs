//! In-memory graph store.
//!
//! Each tradition lives in its own [`TraditionGraph`] arena behind a
//! `parking_lot::Mutex`. A transaction holds the tradition's lock for its whole
//! lifetime and works on a private copy of the arena, which replaces the
//! committed state on commit. This gives serializable transactions per
//! tradition and full parallelism across traditions.
//!
//! Beginning a second transaction on the same tradition from the thread that
//! already holds one blocks forever.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};

use crate::canonical::canonical_hash_hex;
use crate::config::DEFAULT_BASE_LAYER_KEY;
use crate::types::{
    NewReading, Reading, ReadingId, RelationEdge, RelationScope, RelationTypeOntology, Section,
    SectionId, SequenceEdge, ShadowEdge, Tradition, TraditionId, WitnessLayers,
};
use super::{GraphStore, GraphTransaction};

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryError {
    /// Reading not found.
    #[error("Reading not found: {0}")]
    ReadingNotFound(ReadingId),
    /// Section not found.
    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),
    /// Relation type not declared in the ontology.
    #[error("Relation type {0} does not exist in this tradition")]
    UnknownRelationType(String),
    /// A normalization overlay is already open on the section.
    #[error("Shadow episode already open on section {0}")]
    EpisodeOpen(SectionId),
    /// No normalization overlay is open on the section.
    #[error("No shadow episode open on section {0}")]
    NoEpisode(SectionId),
}

/// Normalization overlay of one section.
#[derive(Debug, Clone)]
struct ShadowOverlay {
    relation_type: String,
    edges: BTreeMap<(ReadingId, ReadingId), WitnessLayers>,
    outgoing: BTreeMap<ReadingId, BTreeSet<ReadingId>>,
}

/// Arena holding one tradition's readings, sections and edges.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order. Identifiers for
/// sections and readings come from one increasing counter.
#[derive(Debug, Clone)]
pub struct TraditionGraph {
    tradition: Tradition,
    ontology: RelationTypeOntology,
    witnesses: BTreeSet<String>,
    sections: BTreeMap<SectionId, Section>,
    /// Section -> following section.
    next_section: BTreeMap<SectionId, SectionId>,
    section_members: BTreeMap<SectionId, BTreeSet<ReadingId>>,
    readings: BTreeMap<ReadingId, Reading>,
    sequences: BTreeMap<(ReadingId, ReadingId), WitnessLayers>,
    outgoing: BTreeMap<ReadingId, BTreeSet<ReadingId>>,
    incoming: BTreeMap<ReadingId, BTreeSet<ReadingId>>,
    relations: Vec<RelationEdge>,
    /// Reading -> positions in `relations` of its incident edges.
    relation_index: BTreeMap<ReadingId, BTreeSet<usize>>,
    shadows: BTreeMap<SectionId, ShadowOverlay>,
    next_id: u64,
}

impl TraditionGraph {
    /// Create an empty tradition with the default ontology.
    pub fn new(tradition: Tradition) -> Self {
        Self {
            tradition,
            ontology: RelationTypeOntology::with_defaults(),
            witnesses: BTreeSet::new(),
            sections: BTreeMap::new(),
            next_section: BTreeMap::new(),
            section_members: BTreeMap::new(),
            readings: BTreeMap::new(),
            sequences: BTreeMap::new(),
            outgoing: BTreeMap::new(),
            incoming: BTreeMap::new(),
            relations: Vec::new(),
            relation_index: BTreeMap::new(),
            shadows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create an empty tradition with a fresh random ID.
    pub fn named(name: &str) -> Self {
        Self::new(Tradition::new(TraditionId::random(), name))
    }

    /// Mutable access to the ontology.
    pub fn ontology_mut(&mut self) -> &mut RelationTypeOntology {
        &mut self.ontology
    }

    /// Tradition ID.
    pub fn id(&self) -> TraditionId {
        self.tradition.id
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register a witness.
    pub fn add_witness(&mut self, sigil: impl Into<String>) {
        self.witnesses.insert(sigil.into());
    }

    /// Append a section to the end of the chain, creating its sentinels.
    pub fn add_section(&mut self, name: impl Into<String>) -> SectionId {
        let tail = self.section_chain().last().copied();
        let section_id = SectionId(self.allocate());
        let start = ReadingId(self.allocate());
        let end = ReadingId(self.allocate());

        let mut start_reading = NewReading::text("#START#").into_reading(start, section_id);
        start_reading.is_start = true;
        let mut end_reading = NewReading::text("#END#").into_reading(end, section_id);
        end_reading.is_end = true;

        self.readings.insert(start, start_reading);
        self.readings.insert(end, end_reading);
        self.section_members
            .entry(section_id)
            .or_default()
            .extend([start, end]);
        self.sections.insert(
            section_id,
            Section {
                id: section_id,
                name: name.into(),
                start,
                end,
            },
        );
        if let Some(tail) = tail {
            self.next_section.insert(tail, section_id);
        }
        section_id
    }

    /// Add a reading to a section.
    pub fn add_reading(&mut self, section: SectionId, reading: NewReading) -> Result<ReadingId, InMemoryError> {
        if !self.sections.contains_key(&section) {
            return Err(InMemoryError::SectionNotFound(section));
        }
        let id = ReadingId(self.allocate());
        self.readings.insert(id, reading.into_reading(id, section));
        self.section_members.entry(section).or_default().insert(id);
        Ok(id)
    }

    /// Add witnesses on `layer` to the sequence edge `source -> target`,
    /// creating the edge if needed. Sigils are registered as witnesses.
    pub fn add_sequence(
        &mut self,
        source: ReadingId,
        target: ReadingId,
        layer: &str,
        sigils: &[&str],
    ) -> Result<(), InMemoryError> {
        for id in [source, target] {
            if !self.readings.contains_key(&id) {
                return Err(InMemoryError::ReadingNotFound(id));
            }
        }
        self.sequences
            .entry((source, target))
            .or_default()
            .add(layer, sigils.iter().copied());
        self.outgoing.entry(source).or_default().insert(target);
        self.incoming.entry(target).or_default().insert(source);
        self.witnesses.extend(sigils.iter().map(|s| s.to_string()));
        Ok(())
    }

    /// Chain `path` on `layer` for one witness.
    pub fn add_layer_path(&mut self, sigil: &str, layer: &str, path: &[ReadingId]) -> Result<(), InMemoryError> {
        for pair in path.windows(2) {
            self.add_sequence(pair[0], pair[1], layer, &[sigil])?;
        }
        Ok(())
    }

    /// Chain start -> `readings` -> end of a section on the base layer.
    pub fn add_witness_path(
        &mut self,
        section: SectionId,
        sigil: &str,
        readings: &[ReadingId],
    ) -> Result<(), InMemoryError> {
        let bounds = self
            .sections
            .get(&section)
            .map(|s| (s.start, s.end))
            .ok_or(InMemoryError::SectionNotFound(section))?;
        let mut path = Vec::with_capacity(readings.len() + 2);
        path.push(bounds.0);
        path.extend_from_slice(readings);
        path.push(bounds.1);
        self.add_layer_path(sigil, DEFAULT_BASE_LAYER_KEY, &path)
    }

    /// Add a relation edge. The type must be declared in the ontology.
    pub fn add_relation(
        &mut self,
        source: ReadingId,
        target: ReadingId,
        relation_type: &str,
        scope: RelationScope,
    ) -> Result<(), InMemoryError> {
        for id in [source, target] {
            if !self.readings.contains_key(&id) {
                return Err(InMemoryError::ReadingNotFound(id));
            }
        }
        if !self.ontology.contains(relation_type) {
            return Err(InMemoryError::UnknownRelationType(relation_type.to_string()));
        }
        let position = self.relations.len();
        self.relations
            .push(RelationEdge::new(source, target, relation_type, scope));
        self.relation_index.entry(source).or_default().insert(position);
        self.relation_index.entry(target).or_default().insert(position);
        Ok(())
    }

    /// Remove a section with every reading and edge it owns.
    ///
    /// The chain is re-linked around the removed section.
    pub fn remove_section(&mut self, section: SectionId) -> bool {
        if self.sections.remove(&section).is_none() {
            return false;
        }
        let members = self.section_members.remove(&section).unwrap_or_default();
        for id in &members {
            self.readings.remove(id);
            self.outgoing.remove(id);
            self.incoming.remove(id);
        }
        self.sequences
            .retain(|(s, t), _| !members.contains(s) && !members.contains(t));
        for targets in self.outgoing.values_mut() {
            targets.retain(|t| !members.contains(t));
        }
        for sources in self.incoming.values_mut() {
            sources.retain(|s| !members.contains(s));
        }
        self.relations
            .retain(|r| !members.contains(&r.source) && !members.contains(&r.target));
        self.reindex_relations();
        self.shadows.remove(&section);

        let following = self.next_section.remove(&section);
        let previous = self
            .next_section
            .iter()
            .find(|(_, next)| **next == section)
            .map(|(prev, _)| *prev);
        if let Some(previous) = previous {
            match following {
                Some(following) => {
                    self.next_section.insert(previous, following);
                }
                None => {
                    self.next_section.remove(&previous);
                }
            }
        }
        true
    }

    /// Section IDs in chain order.
    ///
    /// Starts at the section without a predecessor and follows `next` links,
    /// visiting each section at most once.
    pub fn section_chain(&self) -> Vec<SectionId> {
        let has_predecessor: BTreeSet<SectionId> = self.next_section.values().copied().collect();
        let head = self
            .sections
            .keys()
            .find(|id| !has_predecessor.contains(id))
            .copied();

        let mut chain = Vec::with_capacity(self.sections.len());
        let mut current = head;
        while let Some(id) = current {
            if chain.contains(&id) || chain.len() >= self.sections.len() {
                break;
            }
            chain.push(id);
            current = self.next_section.get(&id).copied();
        }
        chain
    }

    /// Get a reading.
    pub fn reading(&self, id: ReadingId) -> Option<&Reading> {
        self.readings.get(&id)
    }

    /// Rank of a reading.
    pub fn rank(&self, id: ReadingId) -> Option<u64> {
        self.readings.get(&id).map(|r| r.rank)
    }

    /// Get a section.
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(&id)
    }

    /// All sequence edges, in canonical order.
    pub fn all_sequences(&self) -> Vec<SequenceEdge> {
        self.sequences
            .iter()
            .map(|(&(s, t), layers)| SequenceEdge::new(s, t, layers.clone()))
            .collect()
    }

    /// All relation edges.
    pub fn all_relations(&self) -> &[RelationEdge] {
        &self.relations
    }

    /// Get number of readings, sentinels included.
    pub fn num_readings(&self) -> usize {
        self.readings.len()
    }

    /// Get number of sequence edges.
    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// Total number of shadow edges across every overlay.
    pub fn num_shadow_edges(&self) -> usize {
        self.shadows.values().map(|o| o.edges.len()).sum()
    }

    /// Fingerprint of the base graph: readings, sequence and relation edges.
    ///
    /// Overlays are excluded, so a normalization build leaves it unchanged.
    pub fn base_fingerprint(&self) -> String {
        let readings: Vec<&Reading> = self.readings.values().collect();
        let sequences = self.all_sequences();
        canonical_hash_hex(&(readings, sequences, &self.relations))
    }

    /// Relation edges incident to `id`, in insertion order.
    pub fn relations_of(&self, id: ReadingId) -> impl Iterator<Item = &RelationEdge> {
        self.relation_index
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |&position| self.relations.get(position))
    }

    fn reindex_relations(&mut self) {
        self.relation_index.clear();
        for (position, relation) in self.relations.iter().enumerate() {
            self.relation_index.entry(relation.source).or_default().insert(position);
            self.relation_index.entry(relation.target).or_default().insert(position);
        }
    }

    fn section_of(&self, id: ReadingId) -> Option<SectionId> {
        self.readings.get(&id).map(|r| r.section)
    }

    fn sequence_edge(&self, source: ReadingId, target: ReadingId) -> Option<SequenceEdge> {
        self.sequences
            .get(&(source, target))
            .map(|layers| SequenceEdge::new(source, target, layers.clone()))
    }
}

/// In-memory graph store for tests, benchmarks and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    traditions: RwLock<BTreeMap<TraditionId, Arc<Mutex<TraditionGraph>>>>,
}

impl InMemoryGraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a tradition.
    pub fn add_tradition(&self, graph: TraditionGraph) -> TraditionId {
        let id = graph.id();
        self.traditions
            .write()
            .insert(id, Arc::new(Mutex::new(graph)));
        id
    }

    /// Remove a tradition and everything it owns.
    pub fn remove_tradition(&self, id: &TraditionId) -> bool {
        self.traditions.write().remove(id).is_some()
    }

    /// Copy of the committed state of a tradition.
    ///
    /// Blocks while a transaction on the tradition is open.
    pub fn snapshot(&self, id: &TraditionId) -> Option<TraditionGraph> {
        let handle = self.traditions.read().get(id).cloned()?;
        let graph = handle.lock().clone();
        Some(graph)
    }

    /// Get number of traditions.
    pub fn num_traditions(&self) -> usize {
        self.traditions.read().len()
    }
}

impl GraphStore for InMemoryGraphStore {
    type Error = InMemoryError;
    type Transaction = InMemoryTransaction;

    fn begin(&self, tradition: &TraditionId) -> Result<Option<Self::Transaction>, Self::Error> {
        // Release the registry lock before waiting on the tradition lock.
        let handle = match self.traditions.read().get(tradition) {
            Some(handle) => Arc::clone(handle),
            None => return Ok(None),
        };
        let guard = Mutex::lock_arc(&handle);
        let working = (*guard).clone();
        Ok(Some(InMemoryTransaction { guard, working }))
    }
}

/// Transaction over one tradition of an [`InMemoryGraphStore`].
pub struct InMemoryTransaction {
    guard: ArcMutexGuard<RawMutex, TraditionGraph>,
    working: TraditionGraph,
}

impl InMemoryTransaction {
    /// The working copy, including uncommitted writes.
    pub fn graph(&self) -> &TraditionGraph {
        &self.working
    }

    fn overlay_mut(&mut self, section: SectionId) -> Result<&mut ShadowOverlay, InMemoryError> {
        self.working
            .shadows
            .get_mut(&section)
            .ok_or(InMemoryError::NoEpisode(section))
    }
}

impl GraphTransaction for InMemoryTransaction {
    type Error = InMemoryError;

    fn tradition(&self) -> Result<Tradition, Self::Error> {
        Ok(self.working.tradition.clone())
    }

    fn ontology(&self) -> Result<RelationTypeOntology, Self::Error> {
        Ok(self.working.ontology.clone())
    }

    fn witnesses(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.working.witnesses.iter().cloned().collect())
    }

    fn sections(&self) -> Result<Vec<Section>, Self::Error> {
        Ok(self
            .working
            .section_chain()
            .into_iter()
            .filter_map(|id| self.working.sections.get(&id).cloned())
            .collect())
    }

    fn section(&self, id: SectionId) -> Result<Option<Section>, Self::Error> {
        Ok(self.working.sections.get(&id).cloned())
    }

    fn reading(&self, id: ReadingId) -> Result<Option<Reading>, Self::Error> {
        Ok(self.working.readings.get(&id).cloned())
    }

    fn section_readings(&self, section: SectionId) -> Result<Vec<ReadingId>, Self::Error> {
        Ok(self
            .working
            .section_members
            .get(&section)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn outgoing_sequences(&self, id: ReadingId) -> Result<Vec<SequenceEdge>, Self::Error> {
        Ok(self
            .working
            .outgoing
            .get(&id)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|&t| self.working.sequence_edge(id, t))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn incoming_sequences(&self, id: ReadingId) -> Result<Vec<SequenceEdge>, Self::Error> {
        Ok(self
            .working
            .incoming
            .get(&id)
            .map(|sources| {
                sources
                    .iter()
                    .filter_map(|&s| self.working.sequence_edge(s, id))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn relations(&self, id: ReadingId) -> Result<Vec<RelationEdge>, Self::Error> {
        Ok(self.working.relations_of(id).cloned().collect())
    }

    fn set_rank(&mut self, id: ReadingId, rank: u64) -> Result<(), Self::Error> {
        let reading = self
            .working
            .readings
            .get_mut(&id)
            .ok_or(InMemoryError::ReadingNotFound(id))?;
        reading.rank = rank;
        Ok(())
    }

    fn shadow_episode(&self, section: SectionId) -> Result<Option<String>, Self::Error> {
        Ok(self
            .working
            .shadows
            .get(&section)
            .map(|o| o.relation_type.clone()))
    }

    fn open_shadow_episode(&mut self, section: SectionId, relation_type: &str) -> Result<(), Self::Error> {
        if !self.working.sections.contains_key(&section) {
            return Err(InMemoryError::SectionNotFound(section));
        }
        if self.working.shadows.contains_key(&section) {
            return Err(InMemoryError::EpisodeOpen(section));
        }
        self.working.shadows.insert(
            section,
            ShadowOverlay {
                relation_type: relation_type.to_string(),
                edges: BTreeMap::new(),
                outgoing: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn close_shadow_episode(&mut self, section: SectionId) -> Result<(), Self::Error> {
        self.working
            .shadows
            .remove(&section)
            .map(|_| ())
            .ok_or(InMemoryError::NoEpisode(section))
    }

    fn merge_shadow_edge(
        &mut self,
        section: SectionId,
        source: ReadingId,
        target: ReadingId,
        layers: &WitnessLayers,
    ) -> Result<bool, Self::Error> {
        for id in [source, target] {
            if !self.working.readings.contains_key(&id) {
                return Err(InMemoryError::ReadingNotFound(id));
            }
        }
        let overlay = self.overlay_mut(section)?;
        let created = !overlay.edges.contains_key(&(source, target));
        overlay
            .edges
            .entry((source, target))
            .or_default()
            .merge(layers);
        overlay.outgoing.entry(source).or_default().insert(target);
        Ok(created)
    }

    fn outgoing_shadows(&self, section: SectionId, id: ReadingId) -> Result<Vec<ShadowEdge>, Self::Error> {
        let Some(overlay) = self.working.shadows.get(&section) else {
            return Ok(Vec::new());
        };
        Ok(overlay
            .outgoing
            .get(&id)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|&t| {
                        overlay.edges.get(&(id, t)).map(|layers| ShadowEdge {
                            source: id,
                            target: t,
                            layers: layers.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn remove_shadow_edge(
        &mut self,
        section: SectionId,
        source: ReadingId,
        target: ReadingId,
    ) -> Result<bool, Self::Error> {
        let overlay = self.overlay_mut(section)?;
        let existed = overlay.edges.remove(&(source, target)).is_some();
        if let Some(targets) = overlay.outgoing.get_mut(&source) {
            targets.remove(&target);
            if targets.is_empty() {
                overlay.outgoing.remove(&source);
            }
        }
        Ok(existed)
    }

    fn shadow_edges_in_section(&self, section: SectionId) -> Result<Vec<ShadowEdge>, Self::Error> {
        let in_section = |id: &ReadingId| self.working.section_of(*id) == Some(section);
        Ok(self
            .working
            .shadows
            .values()
            .flat_map(|overlay| overlay.edges.iter())
            .filter(|((s, t), _)| in_section(s) || in_section(t))
            .map(|(&(source, target), layers)| ShadowEdge {
                source,
                target,
                layers: layers.clone(),
            })
            .collect())
    }

    fn commit(self) -> Result<(), Self::Error> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    fn rollback(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationType;

    fn two_witness_graph() -> (TraditionGraph, SectionId, Vec<ReadingId>) {
        let mut graph = TraditionGraph::named("test");
        let section = graph.add_section("s1");
        let the = graph.add_reading(section, NewReading::text("the")).unwrap();
        let cat = graph.add_reading(section, NewReading::text("cat")).unwrap();
        let dog = graph.add_reading(section, NewReading::text("dog")).unwrap();
        graph.add_witness_path(section, "A", &[the, cat]).unwrap();
        graph.add_witness_path(section, "B", &[the, dog]).unwrap();
        (graph, section, vec![the, cat, dog])
    }

    #[test]
    fn test_add_section_creates_sentinels() {
        let mut graph = TraditionGraph::named("test");
        let section = graph.add_section("s1");
        let s = graph.section(section).unwrap().clone();
        assert!(graph.reading(s.start).unwrap().is_start);
        assert!(graph.reading(s.end).unwrap().is_end);
        assert!(s.start < s.end);
    }

    #[test]
    fn test_sequence_annotations_merge() {
        let (graph, section, ids) = two_witness_graph();
        let start = graph.section(section).unwrap().start;
        let edges = graph.all_sequences();
        let first = edges
            .iter()
            .find(|e| e.source == start && e.target == ids[0])
            .unwrap();
        let sigils: Vec<_> = first.layers.witnesses("witnesses").unwrap().iter().cloned().collect();
        assert_eq!(sigils, vec!["A", "B"]);
    }

    #[test]
    fn test_section_chain_order_and_removal() {
        let mut graph = TraditionGraph::named("test");
        let s1 = graph.add_section("one");
        let s2 = graph.add_section("two");
        let s3 = graph.add_section("three");
        assert_eq!(graph.section_chain(), vec![s1, s2, s3]);

        assert!(graph.remove_section(s2));
        assert_eq!(graph.section_chain(), vec![s1, s3]);
        assert!(!graph.remove_section(s2));
    }

    #[test]
    fn test_remove_section_cascades() {
        let (mut graph, section, ids) = two_witness_graph();
        let before = graph.num_readings();
        assert_eq!(before, 5);
        graph.remove_section(section);
        assert_eq!(graph.num_readings(), 0);
        assert!(graph.all_sequences().is_empty());
        assert!(graph.reading(ids[0]).is_none());
    }

    #[test]
    fn test_relation_requires_declared_type() {
        let (mut graph, _, ids) = two_witness_graph();
        let err = graph
            .add_relation(ids[1], ids[2], "telepathic", RelationScope::Local)
            .unwrap_err();
        assert_eq!(err, InMemoryError::UnknownRelationType("telepathic".into()));
        assert!(graph.add_relation(ids[1], ids[2], "lexical", RelationScope::Local).is_ok());
    }

    #[test]
    fn test_relation_index_tracks_section_removal() {
        let mut graph = TraditionGraph::named("test");
        let s1 = graph.add_section("one");
        let s2 = graph.add_section("two");
        let a = graph.add_reading(s1, NewReading::text("a")).unwrap();
        let b = graph.add_reading(s1, NewReading::text("b")).unwrap();
        let c = graph.add_reading(s2, NewReading::text("c")).unwrap();
        let d = graph.add_reading(s2, NewReading::text("d")).unwrap();
        graph.add_relation(a, c, "lexical", RelationScope::Global).unwrap();
        graph.add_relation(c, d, "spelling", RelationScope::Local).unwrap();
        graph.add_relation(a, b, "orthographic", RelationScope::Local).unwrap();

        let types = |g: &TraditionGraph, id| -> Vec<String> {
            g.relations_of(id).map(|r| r.relation_type.clone()).collect()
        };
        assert_eq!(types(&graph, a), vec!["lexical", "orthographic"]);
        assert_eq!(types(&graph, c), vec!["lexical", "spelling"]);

        // Positions shift after removal; lookups must still hit the right edges.
        graph.remove_section(s2);
        assert_eq!(graph.all_relations().len(), 1);
        assert_eq!(types(&graph, a), vec!["orthographic"]);
        assert_eq!(types(&graph, b), vec!["orthographic"]);
        assert!(graph.relations_of(c).next().is_none());
    }

    #[test]
    fn test_custom_relation_type_via_ontology() {
        let (mut graph, _, ids) = two_witness_graph();
        assert!(graph.add_relation(ids[1], ids[2], "transposition", RelationScope::Global).is_err());

        graph
            .ontology_mut()
            .insert(RelationType::new("transposition", 60, RelationScope::Global));
        graph
            .add_relation(ids[1], ids[2], "transposition", RelationScope::Global)
            .unwrap();
        assert_eq!(graph.relations_of(ids[2]).count(), 1);
    }

    #[test]
    fn test_remove_tradition() {
        let store = InMemoryGraphStore::new();
        let (graph, _, _) = two_witness_graph();
        let tid = store.add_tradition(graph);
        assert_eq!(store.num_traditions(), 1);

        assert!(store.remove_tradition(&tid));
        assert!(!store.remove_tradition(&tid));
        assert_eq!(store.num_traditions(), 0);
        assert!(store.begin(&tid).unwrap().is_none());
    }

    #[test]
    fn test_commit_publishes_and_drop_discards() {
        let store = InMemoryGraphStore::new();
        let (graph, _, ids) = two_witness_graph();
        let tid = store.add_tradition(graph);

        let mut tx = store.begin(&tid).unwrap().unwrap();
        tx.set_rank(ids[0], 7).unwrap();
        drop(tx);
        assert_eq!(store.snapshot(&tid).unwrap().rank(ids[0]), Some(0));

        let mut tx = store.begin(&tid).unwrap().unwrap();
        tx.set_rank(ids[0], 7).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.snapshot(&tid).unwrap().rank(ids[0]), Some(7));
    }

    #[test]
    fn test_begin_unknown_tradition() {
        let store = InMemoryGraphStore::new();
        assert!(store.begin(&TraditionId::random()).unwrap().is_none());
    }

    #[test]
    fn test_shadow_overlay_lifecycle() {
        let store = InMemoryGraphStore::new();
        let (graph, section, ids) = two_witness_graph();
        let tid = store.add_tradition(graph);
        let mut tx = store.begin(&tid).unwrap().unwrap();

        let layers = WitnessLayers::single("witnesses", ["A"]);
        assert_eq!(
            tx.merge_shadow_edge(section, ids[0], ids[1], &layers),
            Err(InMemoryError::NoEpisode(section))
        );

        tx.open_shadow_episode(section, "spelling").unwrap();
        assert_eq!(tx.open_shadow_episode(section, "spelling"), Err(InMemoryError::EpisodeOpen(section)));
        assert!(tx.merge_shadow_edge(section, ids[0], ids[1], &layers).unwrap());
        assert!(!tx
            .merge_shadow_edge(section, ids[0], ids[1], &WitnessLayers::single("witnesses", ["B"]))
            .unwrap());

        let out = tx.outgoing_shadows(section, ids[0]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].layers.witnesses("witnesses").unwrap().len(), 2);
        assert_eq!(tx.shadow_edges_in_section(section).unwrap().len(), 1);

        assert!(tx.remove_shadow_edge(section, ids[0], ids[1]).unwrap());
        assert!(tx.shadow_edges_in_section(section).unwrap().is_empty());
        tx.close_shadow_episode(section).unwrap();
        assert_eq!(tx.shadow_episode(section).unwrap(), None);
    }
}
