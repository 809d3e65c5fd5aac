//! Threshold-based fuzzy intersection
//!
//! Leftover tokens are paired greedily, most similar first. A pair credits
//! `sim / 2` per paired unit to each of its two tokens, so a perfect pair
//! adds one unit of overlap, the same as an exact match.
//!
//! Under a normalized edit similarity two distinct tokens of length `k` score
//! at most `(k - 1) / k`, so tokens shorter than `θ / (1 - θ)` never reach
//! the threshold unless they are equal.

use super::{rank, score_pairs, token_list, validate_threshold, Candidate};
use super::{IntersectionKind, IntersectionStrategy, Overlap, DEFAULT_PARALLEL_THRESHOLD};
use crate::bag::TokenBag;
use crate::error::{ConfigError, Result};
use crate::metric::TokenMetric;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct FuzzyIntersection {
    metric: Arc<dyn TokenMetric>,
    threshold: f64,
    parallel_threshold: usize,
}

impl FuzzyIntersection {
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    pub fn new(metric: Arc<dyn TokenMetric>) -> Self {
        Self {
            metric,
            threshold: Self::DEFAULT_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Minimum similarity for a pair to count
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

    fn candidates(&self, src_only: &TokenBag, tar_only: &TokenBag) -> Vec<Candidate> {
        let src_tokens = token_list(src_only);
        let tar_tokens = token_list(tar_only);
        let scores = score_pairs(&src_tokens, &tar_tokens, self.parallel_threshold, |s, t| {
            self.metric.sim(s, t)
        });

        let width = tar_tokens.len();
        let mut candidates: Vec<Candidate> = scores
            .into_iter()
            .enumerate()
            .filter(|&(_, score)| score >= self.threshold)
            .map(|(i, score)| Candidate {
                score,
                src: src_tokens[i / width].clone(),
                tar: tar_tokens[i % width].clone(),
            })
            .collect();
        rank(&mut candidates);
        candidates
    }
}

impl IntersectionStrategy for FuzzyIntersection {
    fn kind(&self) -> IntersectionKind {
        IntersectionKind::Fuzzy
    }

    fn intersect(&self, src: &TokenBag, tar: &TokenBag) -> Result<Overlap> {
        let mut overlap = Overlap::crisp(src, tar);
        if overlap.src_only.is_empty() || overlap.tar_only.is_empty() {
            return Ok(overlap);
        }

        let candidates = self.candidates(&overlap.src_only, &overlap.tar_only);
        trace!(
            candidates = candidates.len(),
            threshold = self.threshold,
            "fuzzy candidates"
        );

        for candidate in &candidates {
            let pairings = overlap.pairings(&candidate.src, &candidate.tar);
            if pairings > 0.0 {
                overlap.pair(&candidate.src, &candidate.tar, candidate.score, pairings);
            }
        }

        Ok(overlap)
    }
}
