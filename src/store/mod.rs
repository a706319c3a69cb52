//! Graph storage backends.
//!
//! The algorithms only ever talk to a [`GraphTransaction`]: graph primitives
//! (lookups, neighbor lists, rank and overlay writes) scoped to one tradition
//! and executed atomically. No query language crosses this boundary, which
//! keeps the algorithms store-agnostic.

pub mod memory;

use crate::types::{
    Reading, ReadingId, RelationEdge, RelationTypeOntology, Section, SectionId, SequenceEdge,
    ShadowEdge, Tradition, TraditionId, WitnessLayers,
};

/// Trait for graph storage backends.
///
/// A backend hands out serializable transactions per tradition. Transactions
/// on different traditions may run in parallel; transactions on the same
/// tradition are serialized by the backend.
pub trait GraphStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Transaction handle.
    type Transaction: GraphTransaction<Error = Self::Error>;

    /// Open a transaction on a tradition; `None` if the tradition is unknown.
    fn begin(&self, tradition: &TraditionId) -> Result<Option<Self::Transaction>, Self::Error>;
}

/// Primitive graph operations inside one atomic transaction.
///
/// Implementations must guarantee deterministic ordering of results (by
/// identifier). Writes become visible to other transactions only on
/// [`commit`](GraphTransaction::commit); [`rollback`](GraphTransaction::rollback)
/// or dropping the handle discards them.
pub trait GraphTransaction {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Tradition metadata.
    fn tradition(&self) -> Result<Tradition, Self::Error>;

    /// The tradition's relation type ontology.
    fn ontology(&self) -> Result<RelationTypeOntology, Self::Error>;

    /// All witness sigils of the tradition, sorted.
    fn witnesses(&self) -> Result<Vec<String>, Self::Error>;

    /// Sections in chain order.
    fn sections(&self) -> Result<Vec<Section>, Self::Error>;

    /// Fetch a section by ID.
    fn section(&self, id: SectionId) -> Result<Option<Section>, Self::Error>;

    /// Fetch a reading by ID.
    fn reading(&self, id: ReadingId) -> Result<Option<Reading>, Self::Error>;

    /// IDs of every reading owned by a section, sentinels included.
    fn section_readings(&self, section: SectionId) -> Result<Vec<ReadingId>, Self::Error>;

    /// Outgoing sequence edges (ordered by target).
    fn outgoing_sequences(&self, id: ReadingId) -> Result<Vec<SequenceEdge>, Self::Error>;

    /// Incoming sequence edges (ordered by source).
    fn incoming_sequences(&self, id: ReadingId) -> Result<Vec<SequenceEdge>, Self::Error>;

    /// Relation edges touching a reading, in either direction.
    fn relations(&self, id: ReadingId) -> Result<Vec<RelationEdge>, Self::Error>;

    /// Overwrite the rank of a reading.
    fn set_rank(&mut self, id: ReadingId, rank: u64) -> Result<(), Self::Error>;

    /// Relation type of the open normalization episode on a section.
    fn shadow_episode(&self, section: SectionId) -> Result<Option<String>, Self::Error>;

    /// Open an (empty) normalization overlay on a section.
    fn open_shadow_episode(&mut self, section: SectionId, relation_type: &str) -> Result<(), Self::Error>;

    /// Close the normalization overlay on a section, discarding any edges left in it.
    fn close_shadow_episode(&mut self, section: SectionId) -> Result<(), Self::Error>;

    /// Union `layers` into the shadow edge `source -> target`, creating it if
    /// needed. Returns true if the edge was created.
    fn merge_shadow_edge(
        &mut self,
        section: SectionId,
        source: ReadingId,
        target: ReadingId,
        layers: &WitnessLayers,
    ) -> Result<bool, Self::Error>;

    /// Outgoing shadow edges of a reading in a section's overlay.
    fn outgoing_shadows(&self, section: SectionId, id: ReadingId) -> Result<Vec<ShadowEdge>, Self::Error>;

    /// Delete one shadow edge. Returns true if it existed.
    fn remove_shadow_edge(
        &mut self,
        section: SectionId,
        source: ReadingId,
        target: ReadingId,
    ) -> Result<bool, Self::Error>;

    /// Every shadow edge, in any overlay, with an endpoint in the section.
    fn shadow_edges_in_section(&self, section: SectionId) -> Result<Vec<ShadowEdge>, Self::Error>;

    /// Publish all writes atomically.
    fn commit(self) -> Result<(), Self::Error>
    where
        Self: Sized;

    /// Discard all writes.
    fn rollback(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

pub use memory::{InMemoryGraphStore, InMemoryTransaction, TraditionGraph};
