use std::collections::HashSet;

use log::debug;

use crate::{
    costs::GapCosts,
    error::{Error, Result},
    node_types::{NodeType, NodeTypeMap},
    score::Score,
    substitution_matrix::{SubstitutionMatrix, GAP},
    tree_sequence::{TaTable, TreeSequence},
};

use matrices::{CellEntry, Direction, DpMatrices, GapDirection, GapEntry};

mod matrices;
pub mod result;

#[cfg(test)]
mod tests;

pub use result::AlignmentResult;

/// Node type and gap cost of every residue of a sequence, precomputed in
/// sequence order, plus its T↔A association table.
struct SequenceProfile<'a> {
    sequence: &'a TreeSequence,
    types: Vec<NodeType>,
    gap_costs: Vec<Score>,
    ta_table: TaTable,
}

impl<'a> SequenceProfile<'a> {
    fn new(
        sequence: &'a TreeSequence,
        node_types: &NodeTypeMap,
        substitution_matrix: &SubstitutionMatrix,
    ) -> Result<Self> {
        let mut types = Vec::with_capacity(sequence.len());
        let mut gap_costs = Vec::with_capacity(sequence.len());
        for &residue in sequence.residues() {
            let node_type = node_types
                .classify(residue)
                .ok_or_else(|| Error::UnknownResidue {
                    name: sequence.name().to_owned(),
                    residue,
                })?;
            let gap_cost =
                substitution_matrix
                    .gap_cost(residue)
                    .ok_or(Error::UnknownResiduePair {
                        first: residue,
                        second: GAP,
                    })?;
            types.push(node_type);
            gap_costs.push(gap_cost);
        }

        let ta_table = TaTable::build(sequence, &types, &gap_costs)?;
        Ok(Self {
            sequence,
            types,
            gap_costs,
            ta_table,
        })
    }
}

/// Global aligner for typed tree-sequences.
///
/// Aligning validates both sequences against the node type map and the
/// substitution matrix before any matrix is allocated; the fill and the
/// traceback cannot fail afterwards. The aligner borrows its configuration
/// immutably, so one instance can serve concurrent alignments.
pub struct TreeSequenceAligner<'a> {
    substitution_matrix: &'a SubstitutionMatrix,
    node_types: &'a NodeTypeMap,
    costs: GapCosts,
}

impl<'a> TreeSequenceAligner<'a> {
    pub fn new(
        substitution_matrix: &'a SubstitutionMatrix,
        node_types: &'a NodeTypeMap,
        costs: GapCosts,
    ) -> Self {
        Self {
            substitution_matrix,
            node_types,
            costs,
        }
    }

    pub fn align(&self, target: &TreeSequence, query: &TreeSequence) -> Result<AlignmentResult> {
        let target_profile = SequenceProfile::new(target, self.node_types, self.substitution_matrix)?;
        let query_profile = SequenceProfile::new(query, self.node_types, self.substitution_matrix)?;
        self.check_pair_coverage(target, query)?;

        debug!(
            "aligning '{}' ({} residues) against '{}' ({} residues)",
            target.name(),
            target.len(),
            query.name(),
            query.len()
        );

        let mut pass = AlignmentPass {
            target_profile: &target_profile,
            query_profile: &query_profile,
            substitution_matrix: self.substitution_matrix,
            costs: self.costs,
            matrices: DpMatrices::new(target.len(), query.len(), &self.costs),
        };
        pass.fill();
        let score = pass.matrices.cells[[target.len(), query.len()]].score;
        let (target_alignment, query_alignment) = pass.traceback();

        Ok(AlignmentResult {
            score,
            target_name: target.name().to_owned(),
            query_name: query.name().to_owned(),
            target_alignment,
            query_alignment,
        })
    }

    /// Every residue pair the fill may look up must be present, so the fill
    /// stays total.
    fn check_pair_coverage(&self, target: &TreeSequence, query: &TreeSequence) -> Result<()> {
        let target_residues: HashSet<char> = target.residues().iter().copied().collect();
        let query_residues: HashSet<char> = query.residues().iter().copied().collect();
        for &first in &target_residues {
            for &second in &query_residues {
                if self.substitution_matrix.score(first, second).is_none() {
                    return Err(Error::UnknownResiduePair { first, second });
                }
            }
        }
        Ok(())
    }
}

/// A gap candidate in gap-space coordinates: the gap sequence index comes
/// first regardless of the direction.
struct GapMove {
    score: Score,
    predecessor: (usize, usize),
    extends: bool,
}

/// One alignment in flight: the DP matrices plus everything the recurrence
/// reads. Dropped as a whole once the traceback has run.
struct AlignmentPass<'a> {
    target_profile: &'a SequenceProfile<'a>,
    query_profile: &'a SequenceProfile<'a>,
    substitution_matrix: &'a SubstitutionMatrix,
    costs: GapCosts,
    matrices: DpMatrices,
}

impl<'a> AlignmentPass<'a> {
    /// The profile advanced by a gap move in `direction`, then the other one.
    fn gap_profiles(&self, direction: GapDirection) -> (&'a SequenceProfile<'a>, &'a SequenceProfile<'a>) {
        match direction {
            GapDirection::Left => (self.target_profile, self.query_profile),
            GapDirection::Up => (self.query_profile, self.target_profile),
        }
    }

    /// Row-major fill; every cell's dependencies (left, up, diagonal and the
    /// gap entries back to the subtree openings) lie in earlier cells.
    fn fill(&mut self) {
        let target_len = self.target_profile.sequence.len();
        let query_len = self.query_profile.sequence.len();
        for i in 1..=target_len {
            for j in 1..=query_len {
                let diagonal = self.diagonal_candidate(i, j);
                let left = self.gap_candidate(i, j, GapDirection::Left);
                let up = self.gap_candidate(j, i, GapDirection::Up);
                self.matrices.cells[[i, j]] = select(i, j, diagonal, left, up);
            }
        }
    }

    /// Match/mismatch candidate. A-nodes only match A-nodes, C-nodes only
    /// C-nodes and T-nodes only T-nodes; any other pairing is forbidden.
    fn diagonal_candidate(&self, i: usize, j: usize) -> Option<Score> {
        if self.target_profile.types[i - 1] != self.query_profile.types[j - 1] {
            return None;
        }
        let score = self.substitution_matrix.score(
            self.target_profile.sequence.residues()[i - 1],
            self.query_profile.sequence.residues()[j - 1],
        )?;
        Some(self.matrices.cells[[i - 1, j - 1]].score + score)
    }

    /// Gap candidate at `(gap_index, other_index)` in gap-space. Writes the
    /// direction's gap entry for downstream cells before returning.
    fn gap_candidate(
        &mut self,
        gap_index: usize,
        other_index: usize,
        direction: GapDirection,
    ) -> Option<GapMove> {
        let (gap_profile, other_profile) = self.gap_profiles(direction);
        let candidate = match gap_profile.types[gap_index - 1] {
            // Gap one position.
            NodeType::C => {
                let step_cost = gap_profile.gap_costs[gap_index - 1];
                let (score, extends) =
                    self.open_or_extend(gap_index - 1, other_index, step_cost, direction);
                Some(GapMove {
                    score,
                    predecessor: (gap_index - 1, other_index),
                    extends,
                })
            }
            // Gap the entire subtree back to the paired A-node.
            NodeType::T => {
                let ta_table = &gap_profile.ta_table;
                let partner = ta_table.partner(gap_index - 1);
                let opening = partner.unwrap_or(0);
                let enclosed_cost = ta_table.subtree_gap_cost(gap_index - 1);
                let opening_cost = gap_profile.gap_costs[opening];

                let (all_gap_score, extends) = self.open_or_extend(
                    opening,
                    other_index,
                    enclosed_cost + opening_cost,
                    direction,
                );

                // The opening A-node may instead match a C-node in the other
                // sequence right before the rest of the subtree is gapped;
                // that necessarily starts a new gap run after the match.
                let ac_match = match partner {
                    Some(opening) if other_profile.types[other_index - 1] == NodeType::C => self
                        .substitution_matrix
                        .score(
                            gap_profile.sequence.residues()[opening],
                            other_profile.sequence.residues()[other_index - 1],
                        )
                        .map(|score| {
                            self.matrices.cells[direction.cell(opening, other_index - 1)].score
                                + enclosed_cost
                                + score
                                + self.costs.gapopen
                        }),
                    _ => None,
                };

                match ac_match {
                    Some(score) if score >= all_gap_score => Some(GapMove {
                        score,
                        predecessor: (opening, other_index - 1),
                        extends: false,
                    }),
                    _ => Some(GapMove {
                        score: all_gap_score,
                        predecessor: (opening, other_index),
                        extends,
                    }),
                }
            }
            // An A-node is never the right end of a gap run.
            NodeType::A => None,
        };

        let entry = match &candidate {
            Some(gap) => GapEntry::Gap {
                score: gap.score,
                extends: gap.extends,
            },
            None => GapEntry::NoGap,
        };
        self.matrices.gap_entries_mut(direction)[direction.cell(gap_index, other_index)] = entry;
        candidate
    }

    /// Decides whether a gap step through the predecessor cell (gap-space
    /// coordinates) opens a new gap run or extends one.
    fn open_or_extend(
        &self,
        predecessor_gap_index: usize,
        predecessor_other_index: usize,
        step_cost: Score,
        direction: GapDirection,
    ) -> (Score, bool) {
        let index = direction.cell(predecessor_gap_index, predecessor_other_index);
        let predecessor = self.matrices.cells[index];
        match self.matrices.gap_entries(direction)[index] {
            // The predecessor cannot lie on a gap run, so a new run opens.
            GapEntry::NoGap => (predecessor.score + step_cost + self.costs.gapopen, false),
            GapEntry::Gap {
                score: through_score,
                ..
            } => {
                if predecessor.direction == direction.direction() {
                    // Already a continuation; the cell score is the best
                    // extension value here.
                    (predecessor.score + step_cost, true)
                } else {
                    // Extending overrides the predecessor's own choice; the
                    // traceback honours the override via the extends flag.
                    let open = predecessor.score + step_cost + self.costs.gapopen;
                    let extend = through_score + step_cost;
                    if open >= extend {
                        (open, false)
                    } else {
                        (extend, true)
                    }
                }
            }
        }
    }

    fn traceback(&self) -> (String, String) {
        let target = self.target_profile.sequence.residues();
        let query = self.query_profile.sequence.residues();
        let mut target_alignment = Vec::new();
        let mut query_alignment = Vec::new();
        let mut i = target.len();
        let mut j = query.len();
        let mut forced: Option<GapDirection> = None;

        while i > 0 && j > 0 {
            let direction = match forced {
                Some(gap_direction) => gap_direction.direction(),
                None => self.matrices.cells[[i, j]].direction,
            };
            match direction {
                Direction::Diagonal => {
                    forced = None;
                    target_alignment.push(target[i - 1]);
                    query_alignment.push(query[j - 1]);
                    i -= 1;
                    j -= 1;
                }
                Direction::Left => {
                    forced = self.forces(GapDirection::Left, [i, j]);
                    if self.target_profile.types[i - 1] == NodeType::T {
                        let [pi, pj] = self.matrices.cells[[i, j]].predecessor;
                        while i > pi + 1 {
                            target_alignment.push(target[i - 1]);
                            query_alignment.push(GAP);
                            i -= 1;
                        }
                        if pj < j {
                            // The subtree gap is preceded by the A/C match.
                            target_alignment.push(target[i - 1]);
                            query_alignment.push(query[j - 1]);
                            i -= 1;
                            j -= 1;
                        } else {
                            // The opening A-node is gapped as well.
                            target_alignment.push(target[i - 1]);
                            query_alignment.push(GAP);
                            i -= 1;
                        }
                    } else {
                        target_alignment.push(target[i - 1]);
                        query_alignment.push(GAP);
                        i -= 1;
                    }
                }
                Direction::Up => {
                    forced = self.forces(GapDirection::Up, [i, j]);
                    if self.query_profile.types[j - 1] == NodeType::T {
                        let [pi, pj] = self.matrices.cells[[i, j]].predecessor;
                        while j > pj + 1 {
                            target_alignment.push(GAP);
                            query_alignment.push(query[j - 1]);
                            j -= 1;
                        }
                        if pi < i {
                            target_alignment.push(target[i - 1]);
                            query_alignment.push(query[j - 1]);
                            i -= 1;
                            j -= 1;
                        } else {
                            target_alignment.push(GAP);
                            query_alignment.push(query[j - 1]);
                            j -= 1;
                        }
                    } else {
                        target_alignment.push(GAP);
                        query_alignment.push(query[j - 1]);
                        j -= 1;
                    }
                }
                Direction::None => {
                    unreachable!("interior cells always record a direction")
                }
            }
        }

        while i > 0 {
            target_alignment.push(target[i - 1]);
            query_alignment.push(GAP);
            i -= 1;
        }
        while j > 0 {
            target_alignment.push(GAP);
            query_alignment.push(query[j - 1]);
            j -= 1;
        }

        (
            target_alignment.into_iter().rev().collect(),
            query_alignment.into_iter().rev().collect(),
        )
    }

    /// Whether choosing `direction` at `index` forces the predecessor to keep
    /// gapping in the same direction.
    fn forces(&self, direction: GapDirection, index: [usize; 2]) -> Option<GapDirection> {
        match self.matrices.gap_entries(direction)[index] {
            GapEntry::Gap { extends: true, .. } => Some(direction),
            _ => None,
        }
    }
}

/// Ties prefer the diagonal over a left gap over an up gap.
fn select(
    i: usize,
    j: usize,
    diagonal: Option<Score>,
    left: Option<GapMove>,
    up: Option<GapMove>,
) -> CellEntry {
    if let Some(score) = diagonal {
        let beats_left = left.as_ref().map_or(true, |gap| score >= gap.score);
        let beats_up = up.as_ref().map_or(true, |gap| score >= gap.score);
        if beats_left && beats_up {
            return CellEntry {
                score,
                direction: Direction::Diagonal,
                predecessor: [i - 1, j - 1],
            };
        }
    }
    match (left, up) {
        (Some(left), up) if up.as_ref().map_or(true, |up| left.score >= up.score) => CellEntry {
            score: left.score,
            direction: Direction::Left,
            predecessor: GapDirection::Left.cell(left.predecessor.0, left.predecessor.1),
        },
        (Some(left), None) => CellEntry {
            score: left.score,
            direction: Direction::Left,
            predecessor: GapDirection::Left.cell(left.predecessor.0, left.predecessor.1),
        },
        (_, Some(up)) => CellEntry {
            score: up.score,
            direction: Direction::Up,
            predecessor: GapDirection::Up.cell(up.predecessor.0, up.predecessor.1),
        },
        (None, None) => unreachable!("the diagonal is legal whenever both gap moves are forbidden"),
    }
}
