//! Group-linkage intersection
//!
//! Leftover source and target tokens are paired one-to-one so that the sum
//! of their distances is minimal, using the Hungarian solver. Each pair
//! within the distance threshold then credits `sim / 2` per paired unit to
//! both tokens, like the fuzzy intersection does.
//!
//! Cost is `O(n^3)` in the number of distinct leftover tokens; cap the token
//! count upstream when latency matters.

use super::{score_pairs, token_list, validate_threshold};
use super::{IntersectionKind, IntersectionStrategy, Overlap, DEFAULT_PARALLEL_THRESHOLD};
use crate::assignment::{self, CostMatrix};
use crate::bag::TokenBag;
use crate::error::{ConfigError, Result};
use crate::metric::TokenMetric;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

/// One matched pair of the optimal assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedPair {
    pub src: String,
    pub tar: String,
    /// `1 - distance`
    pub similarity: f64,
}

#[derive(Debug, Clone)]
pub struct LinkageIntersection {
    metric: Arc<dyn TokenMetric>,
    threshold: f64,
    parallel_threshold: usize,
}

impl LinkageIntersection {
    /// Maximum distance, i.e. similarity of at least 0.9
    pub const DEFAULT_THRESHOLD: f64 = 0.1;

    pub fn new(metric: Arc<dyn TokenMetric>) -> Self {
        Self {
            metric,
            threshold: Self::DEFAULT_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Maximum distance for a matched pair to count
    pub fn with_threshold(mut self, threshold: f64) -> std::result::Result<Self, ConfigError> {
        self.threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Optimal one-to-one matching of the distinct tokens of `src_only`
    /// against those of `tar_only`, before thresholding, sorted by
    /// `(src, tar)`
    ///
    /// Rows of the cost matrix are the side whose sorted token list is
    /// lexicographically smaller, so swapping the inputs solves the very
    /// same matrix and yields the mirrored matching.
    pub fn matching(&self, src_only: &TokenBag, tar_only: &TokenBag) -> Result<Vec<LinkedPair>> {
        let src_tokens = token_list(src_only);
        let tar_tokens = token_list(tar_only);
        if src_tokens.is_empty() || tar_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let src_rows = src_tokens <= tar_tokens;
        let (row_tokens, col_tokens) = if src_rows {
            (&src_tokens, &tar_tokens)
        } else {
            (&tar_tokens, &src_tokens)
        };

        let costs = score_pairs(row_tokens, col_tokens, self.parallel_threshold, |r, c| {
            self.metric.dist(r, c)
        });
        let costs = CostMatrix::from_vec(row_tokens.len(), col_tokens.len(), costs)?;
        trace!(
            rows = costs.rows(),
            cols = costs.cols(),
            src_rows,
            "linkage cost matrix"
        );

        let assignment = assignment::solve(&costs)?;
        let mut pairs: Vec<LinkedPair> = assignment
            .pairs
            .iter()
            .map(|&(row, col)| {
                let (src, tar) = if src_rows {
                    (&row_tokens[row], &col_tokens[col])
                } else {
                    (&col_tokens[col], &row_tokens[row])
                };
                LinkedPair {
                    src: src.clone(),
                    tar: tar.clone(),
                    similarity: 1.0 - costs.at(row, col),
                }
            })
            .collect();
        pairs.sort_by(|a, b| (&a.src, &a.tar).cmp(&(&b.src, &b.tar)));
        Ok(pairs)
    }
}

impl IntersectionStrategy for LinkageIntersection {
    fn kind(&self) -> IntersectionKind {
        IntersectionKind::Linkage
    }

    fn intersect(&self, src: &TokenBag, tar: &TokenBag) -> Result<Overlap> {
        let mut overlap = Overlap::crisp(src, tar);
        let matching = self.matching(&overlap.src_only, &overlap.tar_only)?;
        let floor = 1.0 - self.threshold;

        for pair in matching.iter().filter(|p| p.similarity >= floor) {
            let pairings = overlap.pairings(&pair.src, &pair.tar);
            if pairings > 0.0 {
                overlap.pair(&pair.src, &pair.tar, pair.similarity, pairings);
            }
        }

        Ok(overlap)
    }
}
