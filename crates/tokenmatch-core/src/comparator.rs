//! Token comparator and contingency accessors
//!
//! A [`TokenComparator`] holds the immutable configuration (tokenizer,
//! intersection strategy, normalizer, population). Each call to
//! [`TokenComparator::prepare`] tokenizes a string pair, runs the strategy
//! once and returns a [`ComparisonContext`] that answers every cardinality
//! query for that pair.
//!
//! # Example
//!
//! ```rust
//! use tokenmatch_core::comparator::TokenComparator;
//!
//! let comparator = TokenComparator::builder().build().unwrap();
//! let ctx = comparator.prepare("cat", "hat").unwrap();
//! assert_eq!(ctx.intersection_card(), 2.0); // "at", "t#"
//! assert_eq!(ctx.src_only_card(), 2.0); // "$c", "ca"
//! assert_eq!(ctx.tar_only_card(), 2.0); // "$h", "ha"
//! ```

use crate::bag::TokenBag;
use crate::error::{ConfigError, Result};
use crate::intersection::{
    IntersectionKind, IntersectionStrategy, Overlap, DEFAULT_PARALLEL_THRESHOLD,
};
use crate::metric::{MetricKind, TokenMetric};
use crate::normalizer::Normalizer;
use crate::population::Population;
use crate::tokenizer::{QGrams, Tokenizer, TokenizerConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Serializable comparator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    pub tokenizer: TokenizerConfig,
    pub intersection: IntersectionKind,
    pub metric: MetricKind,
    /// Strategy default when absent
    pub threshold: Option<f64>,
    pub normalizer: Normalizer,
    pub population: Population,
    pub parallel_threshold: usize,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            intersection: IntersectionKind::default(),
            metric: MetricKind::default(),
            threshold: None,
            normalizer: Normalizer::default(),
            population: Population::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ComparatorConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    pub fn build(&self) -> std::result::Result<TokenComparator, ConfigError> {
        TokenComparator::builder()
            .tokenizer(Arc::from(self.tokenizer.build()?))
            .intersection(self.intersection)
            .metric(self.metric.build())
            .threshold_opt(self.threshold)
            .normalizer(self.normalizer)
            .population(self.population.clone())
            .parallel_threshold(self.parallel_threshold)
            .build()
    }
}

/// Builder for [`TokenComparator`]
#[derive(Debug, Clone)]
pub struct ComparatorBuilder {
    tokenizer: Arc<dyn Tokenizer>,
    intersection: IntersectionKind,
    metric: Arc<dyn TokenMetric>,
    threshold: Option<f64>,
    normalizer: Normalizer,
    population: Population,
    parallel_threshold: usize,
}

impl Default for ComparatorBuilder {
    fn default() -> Self {
        Self {
            tokenizer: Arc::new(QGrams::default()),
            intersection: IntersectionKind::default(),
            metric: MetricKind::default().build(),
            threshold: None,
            normalizer: Normalizer::default(),
            population: Population::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ComparatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn intersection(mut self, kind: IntersectionKind) -> Self {
        self.intersection = kind;
        self
    }

    pub fn metric(mut self, metric: Arc<dyn TokenMetric>) -> Self {
        self.metric = metric;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn threshold_opt(mut self, threshold: Option<f64>) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn population(mut self, population: Population) -> Self {
        self.population = population;
        self
    }

    pub fn parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Validate the configuration and select the strategy
    pub fn build(self) -> std::result::Result<TokenComparator, ConfigError> {
        let strategy =
            self.intersection
                .build(self.metric.clone(), self.threshold, self.parallel_threshold)?;

        debug!(
            intersection = %self.intersection,
            metric = self.metric.name(),
            normalizer = %self.normalizer,
            population = self.population.kind(),
            "comparator built"
        );

        Ok(TokenComparator {
            tokenizer: self.tokenizer,
            strategy: Arc::from(strategy),
            normalizer: self.normalizer,
            population: Arc::new(self.population),
        })
    }
}

/// Immutable, shareable comparison configuration
#[derive(Debug, Clone)]
pub struct TokenComparator {
    tokenizer: Arc<dyn Tokenizer>,
    strategy: Arc<dyn IntersectionStrategy>,
    normalizer: Normalizer,
    population: Arc<Population>,
}

impl TokenComparator {
    pub fn builder() -> ComparatorBuilder {
        ComparatorBuilder::new()
    }

    pub fn intersection_kind(&self) -> IntersectionKind {
        self.strategy.kind()
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn tokenize(&self, input: &str) -> TokenBag {
        self.tokenizer.tokenize(input)
    }

    /// Tokenize both strings and compute their overlap
    pub fn prepare(&self, src: &str, tar: &str) -> Result<ComparisonContext> {
        self.prepare_bags(self.tokenize(src), self.tokenize(tar))
    }

    /// Compute the overlap of two already tokenized bags
    pub fn prepare_bags(&self, src: TokenBag, tar: TokenBag) -> Result<ComparisonContext> {
        let overlap = self.strategy.intersect(&src, &tar)?;
        let complement = self.population.complement_card(&src.union(&tar));

        let ctx = ComparisonContext {
            src,
            tar,
            overlap,
            complement,
            normalizer: self.normalizer,
        };

        debug!(
            intersection = %self.strategy.kind(),
            src_tokens = ctx.src.unique(),
            tar_tokens = ctx.tar.unique(),
            a = ctx.overlap.intersection.card(),
            b = ctx.overlap.src_only.card(),
            c = ctx.overlap.tar_only.card(),
            d = ctx.complement,
            "comparison prepared"
        );

        Ok(ctx)
    }
}

/// Raw contingency cells of one comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl ContingencyTable {
    pub fn population(&self) -> f64 {
        self.a + self.b + self.c + self.d
    }
}

/// Per-comparison state: the token bags, the strategy's overlap and the
/// population complement
///
/// All `*_card` accessors return normalized values. [`Self::raw_table`] gives
/// the unnormalized cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonContext {
    src: TokenBag,
    tar: TokenBag,
    overlap: Overlap,
    complement: f64,
    normalizer: Normalizer,
}

impl ComparisonContext {
    pub fn src_tokens(&self) -> &TokenBag {
        &self.src
    }

    pub fn tar_tokens(&self) -> &TokenBag {
        &self.tar
    }

    pub fn intersection(&self) -> &TokenBag {
        &self.overlap.intersection
    }

    pub fn src_only(&self) -> &TokenBag {
        &self.overlap.src_only
    }

    pub fn tar_only(&self) -> &TokenBag {
        &self.overlap.tar_only
    }

    pub fn overlap(&self) -> &Overlap {
        &self.overlap
    }

    /// Unnormalized a, b, c, d
    pub fn raw_table(&self) -> ContingencyTable {
        ContingencyTable {
            a: self.overlap.intersection.card(),
            b: self.overlap.src_only.card(),
            c: self.overlap.tar_only.card(),
            d: self.complement,
        }
    }

    /// Normalized a, b, c, d
    pub fn table(&self) -> ContingencyTable {
        ContingencyTable {
            a: self.intersection_card(),
            b: self.src_only_card(),
            c: self.tar_only_card(),
            d: self.total_complement_card(),
        }
    }

    /// Fingerprints of the src and tar token bags
    pub fn fingerprints(&self) -> (String, String) {
        (self.src.fingerprint(), self.tar.fingerprint())
    }

    fn raw_population(&self) -> f64 {
        self.raw_table().population()
    }

    fn norm(&self, value: f64, arity: u8) -> f64 {
        self.normalizer.apply(value, arity, self.raw_population())
    }

    /// a
    pub fn intersection_card(&self) -> f64 {
        self.norm(self.overlap.intersection.card(), 1)
    }

    /// Exact-match intersection, whatever the configured strategy
    pub fn crisp_intersection_card(&self) -> f64 {
        self.norm(self.src.intersection(&self.tar).card(), 1)
    }

    /// b
    pub fn src_only_card(&self) -> f64 {
        self.norm(self.overlap.src_only.card(), 1)
    }

    /// c
    pub fn tar_only_card(&self) -> f64 {
        self.norm(self.overlap.tar_only.card(), 1)
    }

    /// d
    pub fn total_complement_card(&self) -> f64 {
        self.norm(self.complement, 1)
    }

    /// a + b
    pub fn src_card(&self) -> f64 {
        let t = self.raw_table();
        self.norm(t.a + t.b, 2)
    }

    /// a + c
    pub fn tar_card(&self) -> f64 {
        let t = self.raw_table();
        self.norm(t.a + t.c, 2)
    }

    /// b + c
    pub fn symmetric_difference_card(&self) -> f64 {
        let t = self.raw_table();
        self.norm(t.b + t.c, 2)
    }

    /// a + b + c
    pub fn union_card(&self) -> f64 {
        let t = self.raw_table();
        self.norm(t.a + t.b + t.c, 3)
    }

    /// a + b + c + d
    pub fn population_card(&self) -> f64 {
        self.norm(self.raw_population(), 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Whitespace;

    #[test]
    fn test_default_is_crisp_bigrams() {
        let comparator = TokenComparator::builder().build().unwrap();
        assert_eq!(comparator.intersection_kind(), IntersectionKind::Crisp);
        let ctx = comparator.prepare("cat", "hat").unwrap();
        assert_eq!(
            ctx.raw_table(),
            ContingencyTable {
                a: 2.0,
                b: 2.0,
                c: 2.0,
                d: 0.0
            }
        );
        assert_eq!(ctx.union_card(), 6.0);
        assert_eq!(ctx.symmetric_difference_card(), 4.0);
        assert_eq!(ctx.src_card(), 4.0);
        assert_eq!(ctx.tar_card(), 4.0);
    }

    #[test]
    fn test_population_cardinality() {
        let comparator = TokenComparator::builder()
            .population(Population::Cardinality(20))
            .build()
            .unwrap();
        let ctx = comparator.prepare("cat", "hat").unwrap();
        // 6 distinct grams in the union
        assert_eq!(ctx.total_complement_card(), 14.0);
        assert_eq!(ctx.population_card(), 20.0);
    }

    #[test]
    fn test_normalizer_applies_to_every_cell() {
        let comparator = TokenComparator::builder()
            .normalizer(Normalizer::Proportional)
            .population(Population::Cardinality(10))
            .build()
            .unwrap();
        let ctx = comparator.prepare("cat", "hat").unwrap();
        assert_eq!(ctx.intersection_card(), 0.2);
        assert_eq!(ctx.src_only_card(), 0.2);
        assert_eq!(ctx.total_complement_card(), 0.4);
        assert_eq!(ctx.population_card(), 1.0);
    }

    #[test]
    fn test_laplace_arity() {
        let comparator = TokenComparator::builder()
            .normalizer(Normalizer::Laplace)
            .build()
            .unwrap();
        let ctx = comparator.prepare("cat", "hat").unwrap();
        assert_eq!(ctx.intersection_card(), 3.0);
        assert_eq!(ctx.symmetric_difference_card(), 6.0);
        assert_eq!(ctx.union_card(), 9.0);
        assert_eq!(ctx.population_card(), 10.0);
    }

    #[test]
    fn test_empty_strings() {
        let comparator = TokenComparator::builder().build().unwrap();
        let ctx = comparator.prepare("", "").unwrap();
        assert_eq!(ctx.population_card(), 0.0);
        assert_eq!(ctx.intersection_card(), 0.0);
    }

    #[test]
    fn test_custom_tokenizer() {
        let comparator = TokenComparator::builder()
            .tokenizer(Arc::new(Whitespace))
            .build()
            .unwrap();
        let ctx = comparator.prepare("the quick fox", "the slow fox").unwrap();
        assert_eq!(ctx.intersection_card(), 2.0);
        assert_eq!(ctx.src_only(), &TokenBag::from_tokens(["quick"]));
    }

    #[test]
    fn test_config_from_json() {
        let config = ComparatorConfig::from_json(
            r#"{
                "tokenizer": {"kind": "whitespace"},
                "intersection": "fuzzy",
                "threshold": 0.6,
                "normalizer": "log",
                "population": {"cardinality": 100}
            }"#,
        )
        .unwrap();
        assert_eq!(config.intersection, IntersectionKind::Fuzzy);
        assert_eq!(config.metric, MetricKind::Levenshtein);
        assert_eq!(config.threshold, Some(0.6));

        let comparator = config.build().unwrap();
        assert_eq!(comparator.intersection_kind(), IntersectionKind::Fuzzy);
        assert_eq!(comparator.normalizer(), Normalizer::Log);
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            ComparatorConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));

        let config = ComparatorConfig {
            intersection: IntersectionKind::Soft,
            metric: MetricKind::JaroWinkler,
            ..Default::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::Capability { .. })
        ));

        let config = ComparatorConfig {
            tokenizer: TokenizerConfig::Qgrams {
                qval: 0,
                start_stop: None,
            },
            ..Default::default()
        };
        assert_eq!(config.build().unwrap_err(), ConfigError::InvalidQval(0));
    }
}
