use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    score::{try_score, Score},
};

pub mod io;

/// The character marking a gapped position in an aligned string.
pub const GAP: char = '-';

/// Pairwise residue scores plus per-residue gap costs.
///
/// Construction normalises the raw entries so that
/// - every real-residue pair present in either order is present in both,
/// - every residue has a `(residue, '-')` gap entry, defaulting to the
///   bundled gap extension cost when the input does not provide one,
/// - no `('-', '-')` entry exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    scores: HashMap<(char, char), Score>,
}

impl SubstitutionMatrix {
    pub fn new(
        entries: impl IntoIterator<Item = ((char, char), f64)>,
        default_gap: Score,
    ) -> Result<Self> {
        let mut scores = HashMap::new();
        for ((first, second), value) in entries {
            let value = try_score(value, "substitution score")?;
            if let Some(previous) = scores.insert((first, second), value) {
                if previous != value {
                    return Err(Error::IncompatibleMatrix {
                        first,
                        second,
                        left: previous.raw(),
                        right: value.raw(),
                    });
                }
            }
        }

        let mut matrix = Self { scores };
        matrix.normalise(default_gap)?;
        Ok(matrix)
    }

    /// Score of aligning `first` against `second`. `None` when the pair is
    /// not covered; the aligner validates coverage before filling.
    pub fn score(&self, first: char, second: char) -> Option<Score> {
        self.scores.get(&(first, second)).copied()
    }

    /// Cost of gapping `residue`.
    pub fn gap_cost(&self, residue: char) -> Option<Score> {
        self.score(residue, GAP)
    }

    fn normalise(&mut self, default_gap: Score) -> Result<()> {
        let mut additions = HashMap::new();

        for (&(first, second), &score) in &self.scores {
            if first == GAP && second == GAP {
                continue;
            } else if first == GAP || second == GAP {
                let residue = if first == GAP { second } else { first };
                let mirrored = if first == GAP {
                    (residue, GAP)
                } else {
                    (GAP, residue)
                };
                self.reconcile(&mut additions, mirrored, score)?;
            } else {
                self.reconcile(&mut additions, (second, first), score)?;
            }
        }
        self.scores.extend(additions.drain());

        // Residues that never appeared next to a gap get the default cost.
        let residues: Vec<char> = self
            .scores
            .keys()
            .flat_map(|&(first, second)| [first, second])
            .filter(|&residue| residue != GAP)
            .collect();
        for residue in residues {
            if !self.scores.contains_key(&(residue, GAP)) {
                self.scores.insert((residue, GAP), default_gap);
            }
            if !self.scores.contains_key(&(GAP, residue)) {
                self.scores.insert((GAP, residue), default_gap);
            }
        }

        self.scores.remove(&(GAP, GAP));
        Ok(())
    }

    fn reconcile(
        &self,
        additions: &mut HashMap<(char, char), Score>,
        key: (char, char),
        score: Score,
    ) -> Result<()> {
        let existing = self.scores.get(&key).or_else(|| additions.get(&key));
        match existing {
            Some(&present) if present != score => Err(Error::IncompatibleMatrix {
                first: key.0,
                second: key.1,
                left: present.raw(),
                right: score.raw(),
            }),
            Some(_) => Ok(()),
            None => {
                additions.insert(key, score);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SubstitutionMatrix, GAP};
    use crate::error::Error;
    use crate::score::r64;

    fn entries() -> Vec<((char, char), f64)> {
        vec![
            (('A', 'A'), 1.0),
            (('A', 'C'), -1.0),
            (('C', 'C'), 1.0),
            (('C', GAP), -3.0),
        ]
    }

    #[test]
    fn normalisation_mirrors_and_fills_gaps() {
        let matrix = SubstitutionMatrix::new(entries(), r64(-2.0)).unwrap();

        assert_eq!(matrix.score('C', 'A'), Some(r64(-1.0)));
        assert_eq!(matrix.score('A', 'C'), Some(r64(-1.0)));
        // Explicit gap cost preserved, missing one defaulted.
        assert_eq!(matrix.gap_cost('C'), Some(r64(-3.0)));
        assert_eq!(matrix.gap_cost('A'), Some(r64(-2.0)));
        assert_eq!(matrix.score(GAP, 'A'), Some(r64(-2.0)));
        assert_eq!(matrix.score(GAP, GAP), None);
    }

    #[test]
    fn normalisation_is_idempotent() {
        let matrix = SubstitutionMatrix::new(entries(), r64(-2.0)).unwrap();
        let renormalised = SubstitutionMatrix::new(
            matrix
                .scores
                .iter()
                .map(|(&pair, &score)| (pair, score.raw())),
            r64(-2.0),
        )
        .unwrap();
        assert_eq!(matrix, renormalised);
    }

    #[test]
    fn contradictory_mirror_entries_are_rejected() {
        let mut raw = entries();
        raw.push((('C', 'A'), 2.0));
        let error = SubstitutionMatrix::new(raw, r64(-2.0)).unwrap_err();
        assert!(matches!(error, Error::IncompatibleMatrix { .. }));
    }

    #[test]
    fn gap_gap_entries_are_dropped() {
        let mut raw = entries();
        raw.push(((GAP, GAP), 7.0));
        let matrix = SubstitutionMatrix::new(raw, r64(-2.0)).unwrap();
        assert_eq!(matrix.score(GAP, GAP), None);
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let mut raw = entries();
        raw.push((('A', 'T'), f64::NAN));
        let error = SubstitutionMatrix::new(raw, r64(-2.0)).unwrap_err();
        assert!(matches!(error, Error::InvalidCost { .. }));
    }
}
