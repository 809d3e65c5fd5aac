//! Intersection strategies
//!
//! Each strategy splits two token bags into three: the overlap, what only
//! the source has, and what only the target has.
//!
//! # Strategies (in order of how much approximate matching they allow)
//!
//! 1. Crisp - exact token equality, per-token minimum
//! 2. Fuzzy - crisp plus token pairs whose similarity meets a threshold
//! 3. Soft - crisp plus character-aligned fragments of similar token pairs
//! 4. Linkage - crisp plus an optimal one-to-one pairing of leftover tokens
//!
//! Every strategy starts from the crisp split, so its intersection is never
//! smaller than the crisp one.
//!
//! # Example
//!
//! ```rust
//! use tokenmatch_core::bag::TokenBag;
//! use tokenmatch_core::intersection::{CrispIntersection, IntersectionStrategy};
//!
//! let src = TokenBag::from_tokens(["a", "b", "b"]);
//! let tar = TokenBag::from_tokens(["b", "c"]);
//! let overlap = CrispIntersection.intersect(&src, &tar).unwrap();
//! assert_eq!(overlap.intersection.card(), 1.0);
//! assert_eq!(overlap.src_only.card(), 2.0);
//! ```

mod crisp;
mod fuzzy;
mod linkage;
mod soft;

pub use crisp::CrispIntersection;
pub use fuzzy::FuzzyIntersection;
pub use linkage::{LinkageIntersection, LinkedPair};
pub use soft::SoftIntersection;

use crate::bag::TokenBag;
use crate::error::{ConfigError, Result};
use crate::metric::TokenMetric;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
use rayon::prelude::*;

/// Default pair count above which candidate scoring runs in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

/// Result of intersecting two token bags
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overlap {
    pub intersection: TokenBag,
    pub src_only: TokenBag,
    pub tar_only: TokenBag,
}

impl Overlap {
    /// Exact split: per-token minimum and the two saturating differences
    pub fn crisp(src: &TokenBag, tar: &TokenBag) -> Self {
        Self {
            intersection: src.intersection(tar),
            src_only: src.difference(tar),
            tar_only: tar.difference(src),
        }
    }

    /// Credit a partial match of `pairings` units between `src` and `tar`
    /// with weight `score`, split evenly between both tokens
    fn pair(&mut self, src: &str, tar: &str, score: f64, pairings: f64) {
        let credit = score / 2.0 * pairings;
        self.intersection.add(src, credit);
        self.intersection.add(tar, credit);
        self.src_only.remove(src, pairings);
        self.tar_only.remove(tar, pairings);
    }

    /// Units of `src` and `tar` still unpaired
    fn pairings(&self, src: &str, tar: &str) -> f64 {
        self.src_only.get(src).min(self.tar_only.get(tar))
    }
}

/// Splits two token bags into intersection and residuals
pub trait IntersectionStrategy: fmt::Debug + Send + Sync {
    fn kind(&self) -> IntersectionKind;

    fn intersect(&self, src: &TokenBag, tar: &TokenBag) -> Result<Overlap>;
}

/// Serializable strategy selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionKind {
    #[default]
    Crisp,
    Fuzzy,
    Soft,
    Linkage,
}

impl IntersectionKind {
    pub const ALL: [IntersectionKind; 4] = [Self::Crisp, Self::Fuzzy, Self::Soft, Self::Linkage];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crisp => "crisp",
            Self::Fuzzy => "fuzzy",
            Self::Soft => "soft",
            Self::Linkage => "linkage",
        }
    }

    /// Threshold used when none is configured
    pub fn default_threshold(self) -> Option<f64> {
        match self {
            Self::Fuzzy => Some(FuzzyIntersection::DEFAULT_THRESHOLD),
            Self::Linkage => Some(LinkageIntersection::DEFAULT_THRESHOLD),
            Self::Crisp | Self::Soft => None,
        }
    }

    /// Build the strategy. Thresholds are ignored by crisp and soft.
    pub fn build(
        self,
        metric: Arc<dyn TokenMetric>,
        threshold: Option<f64>,
        parallel_threshold: usize,
    ) -> std::result::Result<Box<dyn IntersectionStrategy>, ConfigError> {
        let threshold = match threshold.or(self.default_threshold()) {
            Some(t) => Some(validate_threshold(t)?),
            None => None,
        };

        Ok(match self {
            Self::Crisp => Box::new(CrispIntersection),
            Self::Fuzzy => Box::new(
                FuzzyIntersection::new(metric)
                    .with_threshold(threshold.unwrap_or(FuzzyIntersection::DEFAULT_THRESHOLD))?
                    .with_parallel_threshold(parallel_threshold),
            ),
            Self::Soft => {
                Box::new(SoftIntersection::new(metric)?.with_parallel_threshold(parallel_threshold))
            }
            Self::Linkage => Box::new(
                LinkageIntersection::new(metric)
                    .with_threshold(threshold.unwrap_or(LinkageIntersection::DEFAULT_THRESHOLD))?
                    .with_parallel_threshold(parallel_threshold),
            ),
        })
    }
}

impl fmt::Display for IntersectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntersectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crisp" => Ok(Self::Crisp),
            "fuzzy" => Ok(Self::Fuzzy),
            "soft" => Ok(Self::Soft),
            "linkage" | "group_linkage" => Ok(Self::Linkage),
            _ => Err(ConfigError::UnknownVariant {
                kind: "intersection",
                value: s.to_string(),
            }),
        }
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> std::result::Result<f64, ConfigError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::InvalidThreshold(threshold))
    }
}

/// A scored (source token, target token) pair
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub score: f64,
    pub src: String,
    pub tar: String,
}

impl Candidate {
    /// The pair's tokens in lexicographic order, independent of side
    fn tie_key(&self) -> (&str, &str) {
        if self.src <= self.tar {
            (&self.src, &self.tar)
        } else {
            (&self.tar, &self.src)
        }
    }
}

/// Sort by score descending, then by token pair for stability
pub(crate) fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.tie_key().cmp(&b.tie_key()))
    });
}

/// Score every (left, right) pair, row-major over `left`
#[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
pub(crate) fn score_pairs<F>(
    left: &[String],
    right: &[String],
    parallel_threshold: usize,
    score: F,
) -> Vec<f64>
where
    F: Fn(&str, &str) -> f64 + Sync + Send,
{
    let width = right.len();
    let total = left.len() * width;
    if total >= parallel_threshold {
        (0..total)
            .into_par_iter()
            .map(|i| score(&left[i / width], &right[i % width]))
            .collect()
    } else {
        score_pairs_sequential(left, right, score)
    }
}

/// Score every (left, right) pair, row-major over `left`
#[cfg(any(target_arch = "wasm32", not(feature = "parallel")))]
pub(crate) fn score_pairs<F>(
    left: &[String],
    right: &[String],
    _parallel_threshold: usize,
    score: F,
) -> Vec<f64>
where
    F: Fn(&str, &str) -> f64 + Sync + Send,
{
    score_pairs_sequential(left, right, score)
}

fn score_pairs_sequential<F>(left: &[String], right: &[String], score: F) -> Vec<f64>
where
    F: Fn(&str, &str) -> f64,
{
    left.iter()
        .flat_map(|l| right.iter().map(move |r| (l, r)))
        .map(|(l, r)| score(l, r))
        .collect()
}

/// Owned token list of a bag, in lexicographic order
pub(crate) fn token_list(bag: &TokenBag) -> Vec<String> {
    bag.tokens().map(str::to_string).collect()
}
