//! Error type shared by the collation algorithms.

use crate::types::{ReadingId, SectionId, TraditionId};

/// Error type for kernel operations.
///
/// Every algorithm validates its preconditions before mutating the graph, and
/// the kernel facade rolls the transaction back on any error, so callers see
/// either a complete result or no side effect at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollationError {
    /// Tradition identifier does not resolve.
    #[error("Tradition not found: {0}")]
    TraditionNotFound(TraditionId),
    /// Section identifier does not resolve.
    #[error("Specified {role} section not found: {section}")]
    SectionNotFound {
        /// Which boundary was being resolved ("start", "end", or "requested").
        role: &'static str,
        /// The unresolved section.
        section: SectionId,
    },
    /// Reading identifier does not resolve.
    #[error("Reading not found: {0}")]
    ReadingNotFound(ReadingId),
    /// Relation type absent from the tradition ontology.
    #[error("Relation type {0} does not exist in this tradition")]
    UnknownRelationType(String),
    /// Export range end precedes its start.
    #[error("End section found before start section reached (start {start}, end {end})")]
    RangeOrder {
        /// Declared first section.
        start: SectionId,
        /// Declared last section.
        end: SectionId,
    },
    /// A node the caller asked to rank is not reachable from the start.
    #[error("Reading {reading} is not reachable from start reading {start}")]
    Unreachable {
        /// The unreachable reading.
        reading: ReadingId,
        /// The declared start.
        start: ReadingId,
    },
    /// A section-local relation connects readings of two different sections.
    #[error("Local {relation_type} relation {source_id}-{target_id} crosses sections {source_section} and {target_section}")]
    InvalidRelationScope {
        /// Relation type name.
        relation_type: String,
        /// First endpoint.
        source_id: ReadingId,
        /// Second endpoint.
        target_id: ReadingId,
        /// Section of the first endpoint.
        source_section: SectionId,
        /// Section of the second endpoint.
        target_section: SectionId,
    },
    /// A normalization episode is already open on the section.
    #[error("Section {section} is already normalized on {relation_type}")]
    NormalizationActive {
        /// The section.
        section: SectionId,
        /// Relation type of the open episode.
        relation_type: String,
    },
    /// Teardown requested on a section without a normalization episode.
    #[error("Section {0} has no active normalization")]
    NoActiveNormalization(SectionId),
    /// A post-condition was violated; indicates corruption elsewhere.
    #[error("Data consistency error: {0}")]
    Consistency(String),
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl CollationError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }

    /// True for the not-found family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TraditionNotFound(_) | Self::SectionNotFound { .. } | Self::ReadingNotFound(_)
        )
    }

    /// True for errors that signal a data-integrity failure; never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}
