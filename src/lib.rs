//! # variant-graph-kernel
//!
//! Rank, cluster, normalize and align variant graphs of collated texts.
//!
//! A variant graph holds every witness (manuscript) of a text in one directed
//! graph: shared wording runs along shared sequence edges, divergent wording
//! along parallel paths, and scholarly judgments of near-equivalence are
//! recorded as relation edges between readings.
//!
//! ## Core Contract
//!
//! 1. Assign every reading a minimal rank consistent with sequence and relation edges
//! 2. Partition readings into clusters under a relation type, one representative each
//! 3. Build and tear down a normalization overlay over cluster representatives
//! 4. Reconstruct per-witness, per-layer rows as a rank-indexed alignment table
//!
//! ## Architecture
//!
//! ```text
//! VariantGraphKernel → GraphTransaction (one per operation) → rank / cluster / normalize / alignment
//!                              ↓
//!                      GraphStore (in-memory arena or external backend)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same graph state + same request → identical result and table fingerprint
//! - Worklists and traversals order nodes by identifier
//! - Ties in representative selection resolve to the lowest identifier

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod config;
pub mod canonical;
pub mod store;
pub mod traverse;
pub mod rank;
pub mod cluster;
pub mod normalize;
pub mod alignment;
pub mod kernel;

// Re-exports
pub use types::{TraditionId, SectionId, ReadingId};
pub use types::{Reading, NewReading, Tradition, Section, SectionRange};
pub use types::{WitnessLayers, SequenceEdge, RelationEdge, RelationScope, ShadowEdge};
pub use types::{RelationType, RelationTypeOntology};
pub use types::{AlignmentTable, WitnessRow, Token};
pub use error::CollationError;
pub use config::{KernelConfig, DEFAULT_BASE_LAYER_KEY, DEFAULT_BASE_LAYER_LABEL};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use store::{GraphStore, GraphTransaction, InMemoryGraphStore, InMemoryTransaction, TraditionGraph};
pub use store::memory::InMemoryError;
pub use rank::{assign_ranks, assign_ranks_covering, rank_section, RankChange, RankReport};
pub use cluster::{clusters, clusters_in, Cluster, RepresentativeMap};
pub use normalize::{build_normalization, teardown_normalization};
pub use alignment::{build_alignment, PathChoice};
pub use kernel::VariantGraphKernel;
