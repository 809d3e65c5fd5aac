//! Token multisets
//!
//! A [`TokenBag`] maps each token to a non-negative multiplicity. Counts are
//! stored as `f64` because fuzzy and linkage intersections credit partial
//! matches with fractional weight.
//!
//! Uses a BTreeMap so iteration is always in lexicographic token order, which
//! the intersection strategies rely on for deterministic tie-breaking.

use ahash::AHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Multiset of tokens with real-valued multiplicities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenBag {
    counts: BTreeMap<String, f64>,
}

impl TokenBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag counting each token once per occurrence
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bag = Self::new();
        for token in tokens {
            bag.add(token, 1.0);
        }
        bag
    }

    /// Add `count` occurrences of `token`. Non-positive results drop the token.
    pub fn add(&mut self, token: impl Into<String>, count: f64) {
        let token = token.into();
        let updated = self.get(&token) + count;
        if updated > 0.0 {
            self.counts.insert(token, updated);
        } else {
            self.counts.remove(&token);
        }
    }

    /// Remove up to `count` occurrences of `token`, saturating at zero
    pub fn remove(&mut self, token: &str, count: f64) {
        if let Some(entry) = self.counts.get_mut(token) {
            *entry -= count;
            if *entry <= 0.0 {
                self.counts.remove(token);
            }
        }
    }

    /// Multiplicity of `token` (0 when absent)
    pub fn get(&self, token: &str) -> f64 {
        self.counts.get(token).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.counts.contains_key(token)
    }

    /// Sum of all multiplicities
    pub fn card(&self) -> f64 {
        // Start from +0.0 so an empty bag never reports -0.0
        self.counts.values().fold(0.0, |acc, v| acc + v)
    }

    /// Number of distinct tokens with positive multiplicity
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Tokens in lexicographic order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// (token, multiplicity) pairs in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Per-token minimum
    pub fn intersection(&self, other: &TokenBag) -> TokenBag {
        let counts = self
            .counts
            .iter()
            .filter_map(|(token, &count)| {
                let shared = count.min(other.get(token));
                (shared > 0.0).then(|| (token.clone(), shared))
            })
            .collect();
        TokenBag { counts }
    }

    /// Per-token saturating difference
    pub fn difference(&self, other: &TokenBag) -> TokenBag {
        let counts = self
            .counts
            .iter()
            .filter_map(|(token, &count)| {
                let left = count - other.get(token);
                (left > 0.0).then(|| (token.clone(), left))
            })
            .collect();
        TokenBag { counts }
    }

    /// Per-token maximum
    pub fn union(&self, other: &TokenBag) -> TokenBag {
        let mut counts = self.counts.clone();
        for (token, &count) in &other.counts {
            counts
                .entry(token.clone())
                .and_modify(|v| *v = v.max(count))
                .or_insert(count);
        }
        TokenBag { counts }
    }

    /// Stable hash of the bag contents, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = AHasher::default();
        for (token, count) in &self.counts {
            token.hash(&mut hasher);
            count.to_bits().hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }
}

impl<S: Into<String>> FromIterator<S> for TokenBag {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_tokens(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_repeated_tokens() {
        let bag = TokenBag::from_tokens(["ab", "bc", "ab"]);
        assert_eq!(bag.get("ab"), 2.0);
        assert_eq!(bag.get("bc"), 1.0);
        assert_eq!(bag.get("zz"), 0.0);
        assert_eq!(bag.card(), 3.0);
        assert_eq!(bag.unique(), 2);
    }

    #[test]
    fn test_set_operations() {
        let a = TokenBag::from_tokens(["x", "x", "y"]);
        let b = TokenBag::from_tokens(["x", "z"]);

        assert_eq!(a.intersection(&b), TokenBag::from_tokens(["x"]));
        assert_eq!(a.difference(&b), TokenBag::from_tokens(["x", "y"]));
        assert_eq!(b.difference(&a), TokenBag::from_tokens(["z"]));
        assert_eq!(a.union(&b).card(), 4.0);
    }

    #[test]
    fn test_empty_card_is_positive_zero() {
        let card = TokenBag::new().card();
        assert_eq!(card, 0.0);
        assert!(card.is_sign_positive());
        assert_eq!(serde_json::to_string(&card).unwrap(), "0.0");
    }

    #[test]
    fn test_remove_saturates() {
        let mut bag = TokenBag::from_tokens(["a", "a"]);
        bag.remove("a", 1.0);
        assert_eq!(bag.get("a"), 1.0);
        bag.remove("a", 5.0);
        assert!(bag.is_empty());
        bag.remove("missing", 1.0);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_add_drops_non_positive() {
        let mut bag = TokenBag::new();
        bag.add("a", 0.5);
        bag.add("a", -0.5);
        assert!(!bag.contains("a"));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let bag = TokenBag::from_tokens(["c", "a", "b"]);
        let tokens: Vec<&str> = bag.tokens().collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fingerprint_tracks_contents() {
        let a = TokenBag::from_tokens(["a", "b"]);
        let b = TokenBag::from_tokens(["b", "a"]);
        let c = TokenBag::from_tokens(["a", "a"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
