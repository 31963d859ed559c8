use crate::error::Result;
use crate::score::{try_score, Score};

/// Gap penalties applied on top of the per-residue scores of the
/// substitution matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GapCosts {
    /// Penalty paid for every residue of a gap run, typically negative.
    pub gap: Score,
    /// Additional penalty paid once per maximal gap run, typically
    /// non-positive.
    pub gapopen: Score,
}

impl GapCosts {
    pub fn new(gap: f64, gapopen: f64) -> Result<Self> {
        Ok(Self {
            gap: try_score(gap, "gap")?,
            gapopen: try_score(gapopen, "gapopen")?,
        })
    }
}
