use std::fmt::{Display, Formatter};

use crate::score::{r64, Score};
use crate::substitution_matrix::GAP;

/// Outcome of aligning a target against a query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentResult {
    pub score: Score,
    pub target_name: String,
    pub query_name: String,
    pub target_alignment: String,
    pub query_alignment: String,
}

impl AlignmentResult {
    /// Total number of gap characters across both aligned strings.
    pub fn gap_count(&self) -> usize {
        self.target_gaps() + self.query_gaps()
    }

    /// Gaps beyond those forced by the length difference of the inputs.
    pub fn excess_gap_count(&self) -> usize {
        self.gap_count() - self.target_len().abs_diff(self.query_len())
    }

    /// Score divided by the shorter input length.
    pub fn short_normalized(&self) -> Score {
        self.score / r64(self.target_len().min(self.query_len()).max(1) as f64)
    }

    /// Score divided by the longer input length.
    pub fn long_normalized(&self) -> Score {
        self.score / r64(self.target_len().max(self.query_len()).max(1) as f64)
    }

    fn target_gaps(&self) -> usize {
        self.target_alignment.chars().filter(|&c| c == GAP).count()
    }

    fn query_gaps(&self) -> usize {
        self.query_alignment.chars().filter(|&c| c == GAP).count()
    }

    fn target_len(&self) -> usize {
        self.target_alignment.chars().count() - self.target_gaps()
    }

    fn query_len(&self) -> usize {
        self.query_alignment.chars().count() - self.query_gaps()
    }
}

impl Display for AlignmentResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        writeln!(f, "{}: {}", self.target_name, self.target_alignment)?;
        write!(f, "{}: {}", self.query_name, self.query_alignment)
    }
}
