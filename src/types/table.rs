//! Alignment table types.
//!
//! The table is the shape consumed by every export format. It serializes to
//!
//! ```text
//! { "length": N,
//!   "alignment": [ { "witness": "A", "tokens": [ {reading}, null, ... ] },
//!                  { "witness": "A (a.c.)", "base": "A", "tokens": [...] } ] }
//! ```

use serde::Serialize;

use super::reading::Reading;
use crate::canonical::canonical_hash_hex;

/// One cell of a witness row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Token {
    /// The witness reads this reading at the column.
    Reading(Reading),
    /// The column lies inside a lacuna of the witness.
    Lacuna(Reading),
    /// The witness has no reading at the column.
    Absent,
}

impl Token {
    /// The reading behind the cell, if any.
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Reading(r) | Self::Lacuna(r) => Some(r),
            Self::Absent => None,
        }
    }

    /// Text of the reading behind the cell, if any.
    pub fn text(&self) -> Option<&str> {
        self.reading().map(|r| r.text.as_str())
    }

    /// True for empty cells.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True for lacuna cells.
    pub fn is_lacuna(&self) -> bool {
        matches!(self, Self::Lacuna(_))
    }
}

/// The tokens of one witness (or one witness layer) across the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WitnessRow {
    /// Row label: the sigil, or `"<sigil> (<layer>)"` for layer rows.
    pub witness: String,
    /// Base sigil for layer rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// One token per column.
    pub tokens: Vec<Token>,
}

impl WitnessRow {
    /// Whether this row renders a non-base layer.
    pub fn is_layer(&self) -> bool {
        self.base.is_some()
    }

    /// Texts per column, `None` for absent cells.
    pub fn texts(&self) -> Vec<Option<&str>> {
        self.tokens.iter().map(Token::text).collect()
    }
}

/// Rank-indexed table of witness rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentTable {
    /// Number of columns.
    pub length: u64,
    /// Rows sorted by label.
    pub alignment: Vec<WitnessRow>,
}

impl AlignmentTable {
    /// Find a row by label.
    pub fn row(&self, label: &str) -> Option<&WitnessRow> {
        self.alignment.iter().find(|r| r.witness == label)
    }

    /// Row labels in table order.
    pub fn labels(&self) -> Vec<&str> {
        self.alignment.iter().map(|r| r.witness.as_str()).collect()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.alignment.len()
    }

    /// Stable content fingerprint of the table.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}
