//! Population model
//!
//! Resolves the size of the token universe. The complement cell `d` of the
//! contingency table is whatever part of the population neither string uses.

use crate::bag::TokenBag;
use serde::{Deserialize, Serialize};

/// Universe of possible tokens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    /// No universe known; the complement is always 0
    #[default]
    Unknown,
    /// Number of distinct tokens in the universe
    Cardinality(u64),
    /// Explicit alphabet with multiplicities
    Alphabet(TokenBag),
}

impl Population {
    /// Cardinality of the universe outside `union`, never negative
    pub fn complement_card(&self, union: &TokenBag) -> f64 {
        match self {
            Self::Unknown => 0.0,
            Self::Cardinality(size) => (*size as f64 - union.unique() as f64).max(0.0),
            Self::Alphabet(alphabet) => alphabet.difference(union).card().max(0.0),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Cardinality(_) => "cardinality",
            Self::Alphabet(_) => "alphabet",
        }
    }
}
