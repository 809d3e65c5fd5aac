//! Tokenmatch Core Engine
//!
//! Turns two strings into the contingency table (a, b, c, d) that token-based
//! similarity and distance measures are computed from:
//!
//! - `a` - tokens both strings share
//! - `b` - tokens only the source has
//! - `c` - tokens only the target has
//! - `d` - tokens of the population neither string uses
//!
//! Four intersection strategies decide what "share" means: crisp (exact),
//! fuzzy (similarity threshold), soft (character alignment) and linkage
//! (optimal assignment via the Hungarian algorithm).
//!
//! # Features
//!
//! - `native` - Enable all native optimizations
//! - `parallel` - Parallel candidate scoring via rayon for large token sets
//!
//! # Example
//!
//! ```rust
//! use tokenmatch_core::{IntersectionKind, TokenComparator};
//!
//! let comparator = TokenComparator::builder()
//!     .intersection(IntersectionKind::Fuzzy)
//!     .threshold(0.5)
//!     .build()
//!     .unwrap();
//!
//! let ctx = comparator.prepare("night", "nacht").unwrap();
//! let t = ctx.table();
//! assert!(ctx.intersection_card() >= ctx.crisp_intersection_card());
//! assert_eq!(t.a + t.b + t.c + t.d, ctx.population_card());
//! ```

pub mod assignment;
pub mod bag;
pub mod comparator;
pub mod error;
pub mod intersection;
pub mod metric;
pub mod normalizer;
pub mod population;
pub mod tokenizer;

// Re-export main types at crate root
pub use assignment::{solve, Assignment, CostMatrix};
pub use bag::TokenBag;
pub use comparator::{
    ComparatorBuilder, ComparatorConfig, ComparisonContext, ContingencyTable, TokenComparator,
};
pub use error::{AssignmentError, ConfigError, Error, Result};
pub use intersection::{
    CrispIntersection, FuzzyIntersection, IntersectionKind, IntersectionStrategy,
    LinkageIntersection, LinkedPair, Overlap, SoftIntersection,
};
pub use metric::{Aligner, Alignment, JaroWinkler, Levenshtein, MetricKind, TokenMetric};
pub use normalizer::Normalizer;
pub use population::Population;
pub use tokenizer::{Characters, QGrams, Tokenizer, TokenizerConfig, Whitespace};
