//! Token-level metrics
//!
//! The fuzzy, soft and linkage intersections compare individual tokens with
//! a [`TokenMetric`]. Metrics that can also produce an explicit edit
//! alignment expose it through [`TokenMetric::aligner`]; the soft
//! intersection refuses metrics that cannot.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strsim::{jaro_winkler, levenshtein};

/// Pairwise token comparison
pub trait TokenMetric: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Normalized distance in [0, 1]
    fn dist(&self, src: &str, tar: &str) -> f64;

    /// Similarity in [0, 1]
    fn sim(&self, src: &str, tar: &str) -> f64 {
        1.0 - self.dist(src, tar)
    }

    /// Alignment capability, if the metric has one
    fn aligner(&self) -> Option<&dyn Aligner> {
        None
    }
}

/// Edit-distance metric that can explain its cost as an alignment
pub trait Aligner: Send + Sync {
    /// Unnormalized edit distance
    fn dist_abs(&self, src: &str, tar: &str) -> f64;

    fn align(&self, src: &str, tar: &str) -> Alignment;
}

/// Character alignment of two tokens
///
/// Both sides have the same length; `None` marks a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub cost: f64,
    pub src: Vec<Option<char>>,
    pub tar: Vec<Option<char>>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

/// Length of the longest common prefix, in characters
pub fn common_prefix_len(src: &str, tar: &str) -> usize {
    src.chars()
        .zip(tar.chars())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Levenshtein edit distance (unit costs)
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl TokenMetric for Levenshtein {
    fn name(&self) -> &str {
        "levenshtein"
    }

    fn dist(&self, src: &str, tar: &str) -> f64 {
        let max_len = src.chars().count().max(tar.chars().count());
        if max_len == 0 {
            return 0.0;
        }
        levenshtein(src, tar) as f64 / max_len as f64
    }

    fn aligner(&self) -> Option<&dyn Aligner> {
        Some(self)
    }
}

impl Aligner for Levenshtein {
    fn dist_abs(&self, src: &str, tar: &str) -> f64 {
        levenshtein(src, tar) as f64
    }

    fn align(&self, src: &str, tar: &str) -> Alignment {
        let s: Vec<char> = src.chars().collect();
        let t: Vec<char> = tar.chars().collect();
        let width = t.len() + 1;

        let mut d = vec![0usize; (s.len() + 1) * width];
        for i in 0..=s.len() {
            d[i * width] = i;
        }
        for j in 0..=t.len() {
            d[j] = j;
        }
        for i in 1..=s.len() {
            for j in 1..=t.len() {
                let sub = d[(i - 1) * width + j - 1] + usize::from(s[i - 1] != t[j - 1]);
                let del = d[(i - 1) * width + j] + 1;
                let ins = d[i * width + j - 1] + 1;
                d[i * width + j] = sub.min(del).min(ins);
            }
        }

        // Traceback preferring match/substitution, then deletion, then insertion
        let mut src_aligned = Vec::with_capacity(s.len() + t.len());
        let mut tar_aligned = Vec::with_capacity(s.len() + t.len());
        let (mut i, mut j) = (s.len(), t.len());
        while i > 0 || j > 0 {
            let here = d[i * width + j];
            if i > 0
                && j > 0
                && here == d[(i - 1) * width + j - 1] + usize::from(s[i - 1] != t[j - 1])
            {
                src_aligned.push(Some(s[i - 1]));
                tar_aligned.push(Some(t[j - 1]));
                i -= 1;
                j -= 1;
            } else if i > 0 && here == d[(i - 1) * width + j] + 1 {
                src_aligned.push(Some(s[i - 1]));
                tar_aligned.push(None);
                i -= 1;
            } else {
                src_aligned.push(None);
                tar_aligned.push(Some(t[j - 1]));
                j -= 1;
            }
        }
        src_aligned.reverse();
        tar_aligned.reverse();

        Alignment {
            cost: d[s.len() * width + t.len()] as f64,
            src: src_aligned,
            tar: tar_aligned,
        }
    }
}

/// Jaro-Winkler similarity; has no alignment
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl TokenMetric for JaroWinkler {
    fn name(&self) -> &str {
        "jaro_winkler"
    }

    fn dist(&self, src: &str, tar: &str) -> f64 {
        1.0 - self.sim(src, tar)
    }

    fn sim(&self, src: &str, tar: &str) -> f64 {
        if src.is_empty() && tar.is_empty() {
            return 1.0;
        }
        jaro_winkler(src, tar)
    }
}

/// Serializable metric selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    #[default]
    Levenshtein,
    JaroWinkler,
}

impl MetricKind {
    pub fn build(self) -> Arc<dyn TokenMetric> {
        match self {
            Self::Levenshtein => Arc::new(Levenshtein),
            Self::JaroWinkler => Arc::new(JaroWinkler),
        }
    }
}

impl FromStr for MetricKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "levenshtein" => Ok(Self::Levenshtein),
            "jaro_winkler" | "jarowinkler" => Ok(Self::JaroWinkler),
            _ => Err(ConfigError::UnknownVariant {
                kind: "metric",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(side: &[Option<char>]) -> String {
        side.iter().map(|c| c.unwrap_or('-')).collect()
    }

    #[test]
    fn test_levenshtein_dist() {
        assert_eq!(Levenshtein.dist("cat", "cat"), 0.0);
        assert!((Levenshtein.dist("cat", "hat") - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(Levenshtein.dist("", ""), 0.0);
        assert_eq!(Levenshtein.dist("ab", ""), 1.0);
        assert_eq!(Levenshtein.sim("$c", "$h"), 0.5);
    }

    #[test]
    fn test_alignment_substitution() {
        let a = Levenshtein.align("cart", "cast");
        assert_eq!(a.cost, 1.0);
        assert_eq!(render(&a.src), "cart");
        assert_eq!(render(&a.tar), "cast");
    }

    #[test]
    fn test_alignment_with_gaps() {
        let a = Levenshtein.align("abc", "abxc");
        assert_eq!(a.cost, 1.0);
        assert_eq!(a.len(), 4);
        assert_eq!(render(&a.src), "ab-c");
        assert_eq!(render(&a.tar), "abxc");

        let b = Levenshtein.align("", "ab");
        assert_eq!(b.cost, 2.0);
        assert_eq!(render(&b.src), "--");
    }

    #[test]
    fn test_alignment_cost_matches_distance() {
        for (s, t) in [("kitten", "sitting"), ("flaw", "lawn"), ("gumbo", "gambol")] {
            assert_eq!(Levenshtein.align(s, t).cost, Levenshtein.dist_abs(s, t));
        }
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix_len("prefix", "prelude"), 3);
        assert_eq!(common_prefix_len("abc", "xbc"), 0);
        assert_eq!(common_prefix_len("", "abc"), 0);
    }

    #[test]
    fn test_jaro_winkler_has_no_aligner() {
        assert!(JaroWinkler.aligner().is_none());
        assert!(Levenshtein.aligner().is_some());
        assert_eq!(JaroWinkler.sim("martha", "martha"), 1.0);
        assert!(JaroWinkler.sim("martha", "marhta") > 0.9);
    }

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!("Jaro-Winkler".parse::<MetricKind>().unwrap(), MetricKind::JaroWinkler);
        assert_eq!("levenshtein".parse::<MetricKind>().unwrap(), MetricKind::Levenshtein);
        assert!("hamming".parse::<MetricKind>().is_err());
    }
}
