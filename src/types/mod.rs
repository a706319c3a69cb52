//! Core types for the variant graph kernel.

pub mod ids;
pub mod reading;
pub mod edge;
pub mod ontology;
pub mod tradition;
pub mod table;

pub use ids::{TraditionId, SectionId, ReadingId};
pub use reading::{Reading, NewReading};
pub use edge::{WitnessLayers, SequenceEdge, RelationEdge, RelationScope, ShadowEdge};
pub use ontology::{RelationType, RelationTypeOntology};
pub use tradition::{Tradition, Section, SectionRange};
pub use table::{AlignmentTable, WitnessRow, Token};
