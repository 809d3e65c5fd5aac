//! JSON report of one comparison

use serde::Serialize;
use tokenmatch_core::{ComparisonContext, ContingencyTable, IntersectionKind, Normalizer, TokenBag};

#[derive(Debug, Serialize)]
pub struct Fingerprints {
    pub src: String,
    pub tar: String,
}

/// Everything the comparator knows about a string pair
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub intersection_kind: IntersectionKind,
    pub normalizer: Normalizer,
    /// Normalized cells
    pub table: ContingencyTable,
    pub raw_table: ContingencyTable,
    pub crisp_intersection: f64,
    pub src_card: f64,
    pub tar_card: f64,
    pub symmetric_difference: f64,
    pub union: f64,
    pub population: f64,
    pub intersection: &'a TokenBag,
    pub src_only: &'a TokenBag,
    pub tar_only: &'a TokenBag,
    pub fingerprints: Fingerprints,
}

impl<'a> Report<'a> {
    pub fn new(kind: IntersectionKind, normalizer: Normalizer, ctx: &'a ComparisonContext) -> Self {
        let (src, tar) = ctx.fingerprints();
        Self {
            intersection_kind: kind,
            normalizer,
            table: ctx.table(),
            raw_table: ctx.raw_table(),
            crisp_intersection: ctx.crisp_intersection_card(),
            src_card: ctx.src_card(),
            tar_card: ctx.tar_card(),
            symmetric_difference: ctx.symmetric_difference_card(),
            union: ctx.union_card(),
            population: ctx.population_card(),
            intersection: ctx.intersection(),
            src_only: ctx.src_only(),
            tar_only: ctx.tar_only(),
            fingerprints: Fingerprints { src, tar },
        }
    }
}
