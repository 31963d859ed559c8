use ndarray::Array2;

use crate::costs::GapCosts;
use crate::score::{r64, Score};

/// DP move that realised a cell's best score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Matrix origin and border cells; never chosen by the recurrence.
    None,
    Diagonal,
    Left,
    Up,
}

/// The two gap moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDirection {
    /// Gap in the query, advancing the target.
    Left,
    /// Gap in the target, advancing the query.
    Up,
}

impl GapDirection {
    pub fn direction(self) -> Direction {
        match self {
            Self::Left => Direction::Left,
            Self::Up => Direction::Up,
        }
    }

    /// Maps gap-space coordinates (gap sequence index first) to matrix
    /// coordinates.
    pub fn cell(self, gap_index: usize, other_index: usize) -> [usize; 2] {
        match self {
            Self::Left => [gap_index, other_index],
            Self::Up => [other_index, gap_index],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEntry {
    pub score: Score,
    pub direction: Direction,
    /// Matrix coordinates the traceback continues from.
    pub predecessor: [usize; 2],
}

/// What a successor extending a gap run through a cell sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapEntry {
    /// No gap run can pass through this cell in this direction.
    NoGap,
    Gap {
        /// Best score of the cell under the gap move.
        score: Score,
        /// True when choosing this gap forces the predecessor cell to keep
        /// gapping in the same direction.
        extends: bool,
    },
}

pub struct DpMatrices {
    pub cells: Array2<CellEntry>,
    pub left: Array2<GapEntry>,
    pub up: Array2<GapEntry>,
}

impl DpMatrices {
    pub fn new(target_len: usize, query_len: usize, costs: &GapCosts) -> Self {
        let shape = (target_len + 1, query_len + 1);
        let mut cells = Array2::from_elem(
            shape,
            CellEntry {
                score: r64(0.0),
                direction: Direction::None,
                predecessor: [0, 0],
            },
        );

        // The first row and column are one gap run each, so `gapopen` is
        // charged exactly once.
        for i in 1..=target_len {
            cells[[i, 0]].score = costs.gap * r64(i as f64) + costs.gapopen;
        }
        for j in 1..=query_len {
            cells[[0, j]].score = costs.gap * r64(j as f64) + costs.gapopen;
        }

        Self {
            cells,
            left: Array2::from_elem(shape, GapEntry::NoGap),
            up: Array2::from_elem(shape, GapEntry::NoGap),
        }
    }

    pub fn gap_entries(&self, direction: GapDirection) -> &Array2<GapEntry> {
        match direction {
            GapDirection::Left => &self.left,
            GapDirection::Up => &self.up,
        }
    }

    pub fn gap_entries_mut(&mut self, direction: GapDirection) -> &mut Array2<GapEntry> {
        match direction {
            GapDirection::Left => &mut self.left,
            GapDirection::Up => &mut self.up,
        }
    }
}
