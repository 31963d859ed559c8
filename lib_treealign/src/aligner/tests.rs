use super::{AlignmentResult, TreeSequenceAligner};
use crate::{
    costs::GapCosts,
    error::{Error, Result},
    node_types::{NodeType, NodeTypeMap},
    score::{r64, Score},
    substitution_matrix::{SubstitutionMatrix, GAP},
    tree_sequence::TreeSequence,
};

fn unit_matrix(alphabet: &[char]) -> SubstitutionMatrix {
    let mut entries = Vec::new();
    for &first in alphabet {
        for &second in alphabet {
            entries.push(((first, second), if first == second { 1.0 } else { -1.0 }));
        }
    }
    SubstitutionMatrix::new(entries, r64(-2.0)).unwrap()
}

fn align(target: &str, query: &str) -> Result<AlignmentResult> {
    let substitution_matrix = unit_matrix(&['A', 'C', 'T']);
    let node_types = NodeTypeMap::default();
    let costs = GapCosts::new(-2.0, -4.0).unwrap();
    let aligner = TreeSequenceAligner::new(&substitution_matrix, &node_types, costs);
    aligner.align(
        &TreeSequence::new("target", target.chars()),
        &TreeSequence::new("query", query.chars()),
    )
}

/// Recomputes the score from the aligned strings: per-column substitution
/// matrix scores plus one gap open penalty per maximal gap run.
fn recompute_score(
    result: &AlignmentResult,
    substitution_matrix: &SubstitutionMatrix,
    costs: &GapCosts,
) -> Score {
    let target: Vec<char> = result.target_alignment.chars().collect();
    let query: Vec<char> = result.query_alignment.chars().collect();
    assert_eq!(target.len(), query.len());

    let mut score = r64(0.0);
    for (&first, &second) in target.iter().zip(&query) {
        score += substitution_matrix.score(first, second).unwrap();
    }
    for aligned in [&target, &query] {
        let mut in_run = false;
        for &residue in aligned.iter() {
            if residue == GAP && !in_run {
                score += costs.gapopen;
            }
            in_run = residue == GAP;
        }
    }
    score
}

#[test]
fn identical_sequences_align_without_gaps() {
    let result = align("ACT", "ACT").unwrap();
    assert_eq!(result.score, r64(3.0));
    assert_eq!(result.target_alignment, "ACT");
    assert_eq!(result.query_alignment, "ACT");
}

#[test]
fn extra_interior_residue_is_gapped() {
    let result = align("ACT", "ACCT").unwrap();
    assert_eq!(result.score, r64(-3.0));
    assert_eq!(result.target_alignment, "A-CT");
    assert_eq!(result.query_alignment, "ACCT");
}

#[test]
fn missing_interior_residue_is_gapped() {
    let result = align("AT", "ACT").unwrap();
    assert_eq!(result.score, r64(-4.0));
    assert_eq!(result.target_alignment, "A-T");
    assert_eq!(result.query_alignment, "ACT");
}

#[test]
fn unbalanced_sequence_is_rejected() {
    let error = align("ACT", "A").unwrap_err();
    assert!(matches!(error, Error::MalformedTree { .. }));
}

#[test]
fn nested_subtree_gaps_with_an_ac_match() {
    // The inner subtree of the target is gapped as a whole, with its opening
    // A-node matching the C-node of the query.
    let result = align("AACTT", "ACT").unwrap();
    assert_eq!(result.score, r64(-7.0));
    assert_eq!(result.target_alignment, "AACTT");
    assert_eq!(result.query_alignment, "AC--T");
}

#[test]
fn sequences_without_subtrees_reduce_to_affine_alignment() {
    let result = align("CCCC", "CC").unwrap();
    assert_eq!(result.score, r64(-6.0));
    assert_eq!(result.target_alignment, "CCCC");
    assert_eq!(result.query_alignment, "--CC");
}

#[test]
fn interior_gap_run_extends_across_cells() {
    let node_types = NodeTypeMap::from_groups([
        (NodeType::A, "A"),
        (NodeType::C, "CDE"),
        (NodeType::T, "T"),
    ]);
    let mut entries = Vec::new();
    for first in ['C', 'D', 'E'] {
        for second in ['C', 'D', 'E'] {
            entries.push(((first, second), if first == second { 10.0 } else { -10.0 }));
        }
    }
    let substitution_matrix = SubstitutionMatrix::new(entries, r64(-1.0)).unwrap();
    let costs = GapCosts::new(-1.0, -2.0).unwrap();
    let aligner = TreeSequenceAligner::new(&substitution_matrix, &node_types, costs);

    let result = aligner
        .align(
            &TreeSequence::new("target", "CDDE".chars()),
            &TreeSequence::new("query", "CE".chars()),
        )
        .unwrap();
    assert_eq!(result.score, r64(16.0));
    assert_eq!(result.target_alignment, "CDDE");
    assert_eq!(result.query_alignment, "C--E");
}

#[test]
fn empty_query_is_fully_gapped() {
    let result = align("CC", "").unwrap();
    assert_eq!(result.score, r64(-8.0));
    assert_eq!(result.target_alignment, "CC");
    assert_eq!(result.query_alignment, "--");
}

#[test]
fn score_is_symmetric() {
    for (first, second) in [("ACT", "ACCT"), ("AACTT", "ACT"), ("CCCC", "CC")] {
        let forward = align(first, second).unwrap();
        let backward = align(second, first).unwrap();
        assert_eq!(forward.score, backward.score, "{first} vs {second}");
    }
}

#[test]
fn alignment_is_deterministic() {
    let first = align("AACTT", "ACCT").unwrap();
    let second = align("AACTT", "ACCT").unwrap();
    assert_eq!(first, second);
}

#[test]
fn aligned_strings_reproduce_the_inputs() {
    for (first, second) in [("ACT", "ACCT"), ("AACTT", "ACT"), ("CCCC", "CC")] {
        let result = align(first, second).unwrap();
        assert_eq!(result.target_alignment.len(), result.query_alignment.len());
        let stripped_target: String = result
            .target_alignment
            .chars()
            .filter(|&c| c != GAP)
            .collect();
        let stripped_query: String = result
            .query_alignment
            .chars()
            .filter(|&c| c != GAP)
            .collect();
        assert_eq!(stripped_target, first);
        assert_eq!(stripped_query, second);
    }
}

#[test]
fn score_matches_the_aligned_strings() {
    let substitution_matrix = unit_matrix(&['A', 'C', 'T']);
    let costs = GapCosts::new(-2.0, -4.0).unwrap();
    for (first, second) in [("ACT", "ACCT"), ("AACTT", "ACT"), ("AT", "ACT")] {
        let result = align(first, second).unwrap();
        assert_eq!(
            result.score,
            recompute_score(&result, &substitution_matrix, &costs),
            "{first} vs {second}"
        );
    }
}

#[test]
fn unclassified_residue_is_rejected() {
    let error = align("AXT", "ACT").unwrap_err();
    assert!(matches!(error, Error::UnknownResidue { residue: 'X', .. }));
}

#[test]
fn uncovered_residue_pair_is_rejected() {
    let substitution_matrix = unit_matrix(&['A', 'T']);
    let node_types = NodeTypeMap::default();
    let costs = GapCosts::new(-2.0, -4.0).unwrap();
    let aligner = TreeSequenceAligner::new(&substitution_matrix, &node_types, costs);
    let error = aligner
        .align(
            &TreeSequence::new("target", "ACT".chars()),
            &TreeSequence::new("query", "AT".chars()),
        )
        .unwrap_err();
    assert!(matches!(error, Error::UnknownResiduePair { .. }));
}
