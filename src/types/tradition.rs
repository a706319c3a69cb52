//! Tradition and section metadata.

use serde::{Deserialize, Serialize};

use super::ids::{ReadingId, SectionId, TraditionId};

/// Root aggregate of a collated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tradition {
    /// Tradition identifier.
    pub id: TraditionId,
    /// Display name.
    pub name: String,
    /// Owning user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Tradition {
    /// Create a new tradition record.
    pub fn new(id: TraditionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
        }
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// One linear collation bounded by a start and an end sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier.
    pub id: SectionId,
    /// Display name.
    pub name: String,
    /// Start sentinel reading.
    pub start: ReadingId,
    /// End sentinel reading.
    pub end: ReadingId,
}

/// Inclusive range of sections for export.
///
/// `None` bounds default to the first and last section of the tradition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRange {
    /// First section to include.
    pub start: Option<SectionId>,
    /// Last section to include.
    pub end: Option<SectionId>,
}

impl SectionRange {
    /// The whole tradition.
    pub fn all() -> Self {
        Self::default()
    }

    /// A single section.
    pub fn single(section: SectionId) -> Self {
        Self {
            start: Some(section),
            end: Some(section),
        }
    }

    /// An explicit range.
    pub fn between(start: SectionId, end: SectionId) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}
