//! Reading nodes of the variant graph.

use serde::{Deserialize, Serialize};

use super::ids::{ReadingId, SectionId};

/// A single text token as it appears in one or more witnesses.
///
/// Sentinel readings (`is_start` / `is_end`) bound each section and are never
/// emitted into alignment tables. Only `rank` is mutated by the algorithms in
/// this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Arena identifier.
    pub id: ReadingId,
    /// Section that owns this reading.
    pub section: SectionId,
    /// Literal text.
    pub text: String,
    /// Optional normalized form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_form: Option<String>,
    /// Logical text position.
    pub rank: u64,
    /// Whether this reading belongs to the lemma text.
    pub is_lemma: bool,
    /// Section start sentinel.
    pub is_start: bool,
    /// Section end sentinel.
    pub is_end: bool,
    /// Gap marker.
    pub is_lacuna: bool,
    /// Language tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Reading {
    /// The normalized form, falling back to the literal text.
    pub fn normalized(&self) -> &str {
        self.normal_form.as_deref().unwrap_or(&self.text)
    }

    /// True if the normal form differs from the literal text.
    pub fn has_distinct_normal_form(&self) -> bool {
        self.normalized() != self.text
    }
}

/// Ingestion-side description of a reading to be created.
#[derive(Debug, Clone, Default)]
pub struct NewReading {
    pub(crate) text: String,
    pub(crate) normal_form: Option<String>,
    pub(crate) rank: u64,
    pub(crate) is_lemma: bool,
    pub(crate) is_lacuna: bool,
    pub(crate) language: Option<String>,
}

impl NewReading {
    /// A plain reading with the given text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A lacuna marker.
    pub fn lacuna() -> Self {
        Self {
            text: "#LACUNA#".to_string(),
            is_lacuna: true,
            ..Self::default()
        }
    }

    /// Set the normal form.
    pub fn normal_form(mut self, normal_form: impl Into<String>) -> Self {
        self.normal_form = Some(normal_form.into());
        self
    }

    /// Pre-set the rank (ingestion formats that carry ranks).
    pub fn rank(mut self, rank: u64) -> Self {
        self.rank = rank;
        self
    }

    /// Flag as lemma.
    pub fn lemma(mut self) -> Self {
        self.is_lemma = true;
        self
    }

    /// Set the language tag.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub(crate) fn into_reading(self, id: ReadingId, section: SectionId) -> Reading {
        Reading {
            id,
            section,
            text: self.text,
            normal_form: self.normal_form,
            rank: self.rank,
            is_lemma: self.is_lemma,
            is_start: false,
            is_end: false,
            is_lacuna: self.is_lacuna,
            language: self.language,
        }
    }
}
