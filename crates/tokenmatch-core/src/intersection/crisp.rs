use super::{IntersectionKind, IntersectionStrategy, Overlap};
use crate::bag::TokenBag;
use crate::error::Result;

/// Exact token equality
#[derive(Debug, Clone, Copy, Default)]
pub struct CrispIntersection;

impl IntersectionStrategy for CrispIntersection {
    fn kind(&self) -> IntersectionKind {
        IntersectionKind::Crisp
    }

    fn intersect(&self, src: &TokenBag, tar: &TokenBag) -> Result<Overlap> {
        Ok(Overlap::crisp(src, tar))
    }
}
