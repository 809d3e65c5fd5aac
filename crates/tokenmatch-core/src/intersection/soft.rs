//! Alignment-based soft intersection
//!
//! Leftover token pairs are ranked by membership,
//! `max(len - edit_distance, common_prefix) / len`. The best pair is aligned
//! character by character: the characters both tokens share form a new
//! token in the intersection, and the characters each side does not share
//! stay behind as new residual tokens.
//!
//! Fragments keep their inner shape: a position the fragment does not own
//! is written as [`PLACEHOLDER`], and placeholders at either end are
//! trimmed. Aligning `cart` with `cast` yields `ca-t` shared, `r` left in
//! the source and `s` left in the target.

use super::{rank, score_pairs, token_list, Candidate};
use super::{IntersectionKind, IntersectionStrategy, Overlap, DEFAULT_PARALLEL_THRESHOLD};
use crate::bag::TokenBag;
use crate::error::{ConfigError, Result};
use crate::metric::{common_prefix_len, Aligner, TokenMetric};
use std::sync::Arc;
use tracing::trace;

/// Marks a position inside a fragment that belongs to another fragment
pub const PLACEHOLDER: char = '-';

#[derive(Debug, Clone)]
pub struct SoftIntersection {
    metric: Arc<dyn TokenMetric>,
    parallel_threshold: usize,
}

impl SoftIntersection {
    /// Fails unless `metric` can produce alignments
    pub fn new(metric: Arc<dyn TokenMetric>) -> std::result::Result<Self, ConfigError> {
        if metric.aligner().is_none() {
            return Err(ConfigError::Capability {
                strategy: IntersectionKind::Soft.as_str(),
                metric: metric.name().to_string(),
            });
        }
        Ok(Self {
            metric,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    fn candidates(
        &self,
        aligner: &dyn Aligner,
        src_only: &TokenBag,
        tar_only: &TokenBag,
    ) -> Vec<Candidate> {
        let src_tokens = token_list(src_only);
        let tar_tokens = token_list(tar_only);
        let scores = score_pairs(&src_tokens, &tar_tokens, self.parallel_threshold, |s, t| {
            membership(aligner, s, t)
        });

        let width = tar_tokens.len();
        let mut candidates: Vec<Candidate> = scores
            .into_iter()
            .enumerate()
            .filter(|&(_, score)| score > 0.0)
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

impl IntersectionStrategy for SoftIntersection {
    fn kind(&self) -> IntersectionKind {
        IntersectionKind::Soft
    }

    fn intersect(&self, src: &TokenBag, tar: &TokenBag) -> Result<Overlap> {
        let mut overlap = Overlap::crisp(src, tar);
        let Some(aligner) = self.metric.aligner() else {
            return Ok(overlap);
        };
        if overlap.src_only.is_empty() || overlap.tar_only.is_empty() {
            return Ok(overlap);
        }

        let candidates = self.candidates(aligner, &overlap.src_only, &overlap.tar_only);
        trace!(candidates = candidates.len(), "soft candidates");

        for candidate in &candidates {
            let pairings = overlap.pairings(&candidate.src, &candidate.tar);
            if pairings <= 0.0 {
                continue;
            }

            let fragments = Fragments::split(aligner, &candidate.src, &candidate.tar);
            overlap.src_only.remove(&candidate.src, pairings);
            overlap.tar_only.remove(&candidate.tar, pairings);
            if !fragments.shared.is_empty() {
                overlap.intersection.add(fragments.shared, pairings);
            }
            if !fragments.src.is_empty() {
                overlap.src_only.add(fragments.src, pairings);
            }
            if !fragments.tar.is_empty() {
                overlap.tar_only.add(fragments.tar, pairings);
            }
        }

        Ok(overlap)
    }
}

/// `max(len - edit_distance, common_prefix) / len`, with `len` the longer
/// token's character count
fn membership(aligner: &dyn Aligner, src: &str, tar: &str) -> f64 {
    let len = src.chars().count().max(tar.chars().count());
    if len == 0 {
        return 0.0;
    }
    let len = len as f64;
    let kept = len - aligner.dist_abs(src, tar);
    let prefix = common_prefix_len(src, tar) as f64;
    kept.max(prefix) / len
}

/// The three pieces an aligned pair breaks into
#[derive(Debug, Clone, PartialEq)]
struct Fragments {
    shared: String,
    src: String,
    tar: String,
}

impl Fragments {
    fn split(aligner: &dyn Aligner, src: &str, tar: &str) -> Self {
        let alignment = aligner.align(src, tar);
        let len = alignment.len();
        let mut shared = Vec::with_capacity(len);
        let mut src_rest = Vec::with_capacity(len);
        let mut tar_rest = Vec::with_capacity(len);

        for (&s, &t) in alignment.src.iter().zip(&alignment.tar) {
            if s.is_some() && s == t {
                shared.push(s);
                src_rest.push(None);
                tar_rest.push(None);
            } else {
                shared.push(None);
                src_rest.push(s);
                tar_rest.push(t);
            }
        }

        Self {
            shared: render(&shared),
            src: render(&src_rest),
            tar: render(&tar_rest),
        }
    }
}

/// Trim unowned positions from both ends, mark the inner ones
fn render(positions: &[Option<char>]) -> String {
    let first = positions.iter().position(Option::is_some);
    let last = positions.iter().rposition(Option::is_some);
    match (first, last) {
        (Some(first), Some(last)) => positions[first..=last]
            .iter()
            .map(|c| c.unwrap_or(PLACEHOLDER))
            .collect(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{JaroWinkler, Levenshtein};
    use pretty_assertions::assert_eq;

    fn soft() -> SoftIntersection {
        SoftIntersection::new(Arc::new(Levenshtein)).unwrap()
    }

    #[test]
    fn test_rejects_metric_without_alignment() {
        let err = SoftIntersection::new(Arc::new(JaroWinkler)).unwrap_err();
        assert!(matches!(err, ConfigError::Capability { strategy: "soft", .. }));
    }

    #[test]
    fn test_membership() {
        assert_eq!(membership(&Levenshtein, "cart", "cast"), 0.75);
        assert_eq!(membership(&Levenshtein, "abc", "xyz"), 0.0);
        // "abxyz" vs "ab": 3 edits leave the 2 shared prefix characters
        assert_eq!(membership(&Levenshtein, "abxyz", "ab"), 0.4);
    }

    #[test]
    fn test_fragments_of_substitution() {
        let f = Fragments::split(&Levenshtein, "cart", "cast");
        assert_eq!(
            f,
            Fragments {
                shared: "ca-t".to_string(),
                src: "r".to_string(),
                tar: "s".to_string(),
            }
        );
    }

    #[test]
    fn test_fragments_of_insertion() {
        let f = Fragments::split(&Levenshtein, "abc", "abxc");
        assert_eq!(f.shared, "ab-c");
        assert_eq!(f.src, "");
        assert_eq!(f.tar, "x");
    }

    #[test]
    fn test_render_trims_ends() {
        assert_eq!(render(&[None, Some('a'), None, Some('b'), None]), "a-b");
        assert_eq!(render(&[None, None]), "");
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_intersect_splits_tokens() {
        let src = TokenBag::from_tokens(["cart", "shared"]);
        let tar = TokenBag::from_tokens(["cast", "shared"]);
        let overlap = soft().intersect(&src, &tar).unwrap();

        assert_eq!(overlap.intersection, TokenBag::from_tokens(["ca-t", "shared"]));
        assert_eq!(overlap.src_only, TokenBag::from_tokens(["r"]));
        assert_eq!(overlap.tar_only, TokenBag::from_tokens(["s"]));
    }

    #[test]
    fn test_unrelated_tokens_untouched() {
        let src = TokenBag::from_tokens(["abc"]);
        let tar = TokenBag::from_tokens(["xyz"]);
        let overlap = soft().intersect(&src, &tar).unwrap();
        assert!(overlap.intersection.is_empty());
        assert_eq!(overlap.src_only, src);
        assert_eq!(overlap.tar_only, tar);
    }

    #[test]
    fn test_pairings_scale_fragments() {
        let src = TokenBag::from_tokens(["abcd", "abcd"]);
        let tar = TokenBag::from_tokens(["abce", "abce", "abce"]);
        let overlap = soft().intersect(&src, &tar).unwrap();
        assert_eq!(overlap.intersection.get("abc"), 2.0);
        assert_eq!(overlap.src_only.get("d"), 2.0);
        assert_eq!(overlap.tar_only.get("e"), 2.0);
        assert_eq!(overlap.tar_only.get("abce"), 1.0);
    }
}
