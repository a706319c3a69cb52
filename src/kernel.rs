//! Transactional entry points.
//!
//! [`VariantGraphKernel`] runs every operation inside exactly one store
//! transaction. Writes are committed only when the operation succeeds; any
//! error rolls the transaction back, so callers see either a complete result
//! or no change at all.

use std::sync::Arc;

use crate::alignment::build_alignment;
use crate::cluster::{clusters, clusters_in, Cluster, RepresentativeMap};
use crate::config::KernelConfig;
use crate::error::CollationError;
use crate::normalize::{build_normalization, teardown_normalization};
use crate::rank::{assign_ranks, assign_ranks_covering, rank_section, RankReport};
use crate::store::{GraphStore, GraphTransaction};
use crate::types::{AlignmentTable, ReadingId, SectionId, SectionRange, TraditionId};

/// Variant graph kernel over a graph store.
pub struct VariantGraphKernel<S: GraphStore> {
    store: Arc<S>,
    config: KernelConfig,
}

impl<S: GraphStore> VariantGraphKernel<S> {
    /// Create a kernel with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, KernelConfig::default())
    }

    /// Create a kernel with an explicit configuration.
    pub fn with_config(store: Arc<S>, config: KernelConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn begin(&self, tradition: &TraditionId) -> Result<S::Transaction, CollationError> {
        self.store
            .begin(tradition)
            .map_err(CollationError::from_store)?
            .ok_or(CollationError::TraditionNotFound(*tradition))
    }

    /// Run a read-only operation; the transaction is always rolled back.
    fn read<R>(
        &self,
        tradition: &TraditionId,
        op: impl FnOnce(&S::Transaction) -> Result<R, CollationError>,
    ) -> Result<R, CollationError> {
        let tx = self.begin(tradition)?;
        let result = op(&tx);
        tx.rollback().map_err(CollationError::from_store)?;
        result
    }

    /// Run a mutating operation; commit on success, roll back on failure.
    fn write<R>(
        &self,
        tradition: &TraditionId,
        op: impl FnOnce(&mut S::Transaction) -> Result<R, CollationError>,
    ) -> Result<R, CollationError> {
        let mut tx = self.begin(tradition)?;
        match op(&mut tx) {
            Ok(value) => {
                tx.commit().map_err(CollationError::from_store)?;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(tradition = %tradition, error = %e, "Rolling back");
                tx.rollback().map_err(CollationError::from_store)?;
                Err(e)
            }
        }
    }

    /// Propagate ranks from `start`.
    pub fn assign_ranks(&self, tradition: &TraditionId, start: ReadingId) -> Result<RankReport, CollationError> {
        self.write(tradition, |tx| assign_ranks(tx, start))
    }

    /// Propagate ranks from `start`, requiring `required` to be reachable.
    pub fn assign_ranks_covering(
        &self,
        tradition: &TraditionId,
        start: ReadingId,
        required: &[ReadingId],
    ) -> Result<RankReport, CollationError> {
        self.write(tradition, |tx| assign_ranks_covering(tx, start, required))
    }

    /// Recompute all ranks of one section.
    pub fn rank_section(&self, tradition: &TraditionId, section: SectionId) -> Result<RankReport, CollationError> {
        self.write(tradition, |tx| rank_section(tx, section))
    }

    /// Recompute the ranks of every section, in chain order.
    pub fn rank_tradition(&self, tradition: &TraditionId) -> Result<Vec<RankReport>, CollationError> {
        self.write(tradition, |tx| {
            let mut reports = Vec::new();
            for section in tx.sections().map_err(CollationError::from_store)? {
                reports.push(rank_section(tx, section.id)?);
            }
            Ok(reports)
        })
    }

    /// Clusters of the section containing `scope`.
    pub fn clusters(
        &self,
        tradition: &TraditionId,
        scope: ReadingId,
        relation_type: &str,
    ) -> Result<Vec<Cluster>, CollationError> {
        self.read(tradition, |tx| clusters(tx, scope, relation_type))
    }

    /// Representative map of a section.
    pub fn representatives(
        &self,
        tradition: &TraditionId,
        section: SectionId,
        relation_type: &str,
    ) -> Result<RepresentativeMap, CollationError> {
        self.read(tradition, |tx| {
            clusters_in(tx, &[section], relation_type).map(|c| RepresentativeMap::from_clusters(&c))
        })
    }

    /// Build the normalization overlay of a section.
    pub fn build_normalization(
        &self,
        tradition: &TraditionId,
        section: SectionId,
        relation_type: &str,
    ) -> Result<RepresentativeMap, CollationError> {
        self.write(tradition, |tx| build_normalization(tx, section, relation_type))
    }

    /// Remove the normalization overlay of a section.
    pub fn teardown_normalization(&self, tradition: &TraditionId, section: SectionId) -> Result<usize, CollationError> {
        self.write(tradition, |tx| teardown_normalization(tx, section))
    }

    /// Build the alignment table of a section range.
    pub fn build_alignment(
        &self,
        tradition: &TraditionId,
        range: &SectionRange,
        conflate: Option<&str>,
    ) -> Result<AlignmentTable, CollationError> {
        self.read(tradition, |tx| build_alignment(tx, range, conflate, &self.config))
    }
}
