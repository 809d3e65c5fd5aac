//! Cardinality normalizers
//!
//! A normalizer is chosen once per comparator and applied to every
//! cardinality the contingency accessors expose. Only [`Normalizer::Identity`]
//! preserves `a + b + c + d = n`; the others keep ratios between cells
//! meaningful instead.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scalar transform applied to reported cardinalities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    #[default]
    Identity,
    /// `value / max(1, population)`
    Proportional,
    /// `ln(1 + value)`
    Log,
    /// `e^value`
    Exp,
    /// `value + arity`, where arity is the number of table cells the value spans
    Laplace,
    /// `1 / value`, or `population` when value is 0
    Inverse,
    /// `population - value`
    Complement,
}

impl Normalizer {
    pub const ALL: [Normalizer; 7] = [
        Self::Identity,
        Self::Proportional,
        Self::Log,
        Self::Exp,
        Self::Laplace,
        Self::Inverse,
        Self::Complement,
    ];

    /// Normalize `value`, which covers `arity` cells of a table whose raw
    /// population is `population`
    #[inline]
    pub fn apply(self, value: f64, arity: u8, population: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::Proportional => value / population.max(1.0),
            Self::Log => value.ln_1p(),
            Self::Exp => value.exp(),
            Self::Laplace => value + f64::from(arity),
            Self::Inverse => {
                if value == 0.0 {
                    population
                } else {
                    1.0 / value
                }
            }
            Self::Complement => population - value,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Proportional => "proportional",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Laplace => "laplace",
            Self::Inverse => "inverse",
            Self::Complement => "complement",
        }
    }
}

impl fmt::Display for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Normalizer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|n| n.as_str() == lower)
            .ok_or_else(|| ConfigError::UnknownVariant {
                kind: "normalizer",
                value: s.to_string(),
            })
    }
}
