use std::io::Read;

use nom::{
    character::complete::{char, line_ending, satisfy},
    combinator::{cut, opt},
    multi::many1,
    number::complete::double,
    IResult,
};

use super::SubstitutionMatrix;
use crate::{
    error::Result,
    io::{is_any_line_break, translate_nom_error},
    score::Score,
};

impl SubstitutionMatrix {
    /// Reads a custom substitution matrix with one tab-separated
    /// `<residue> <residue> <score>` triple per line. An empty line
    /// terminates the matrix; a non-blank line with fewer than three columns
    /// is an error.
    ///
    /// The result is normalised, with `default_gap` filling missing
    /// per-residue gap costs.
    pub fn read_plain(mut reader: impl Read, default_gap: Score) -> Result<Self> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;

        let (_, entries) = parse_plain(&input).map_err(translate_nom_error)?;
        Self::new(entries, default_gap)
    }
}

fn parse_plain(input: &str) -> IResult<&str, Vec<((char, char), f64)>> {
    many1(parse_entry)(input)
}

fn parse_entry(input: &str) -> IResult<&str, ((char, char), f64)> {
    let (input, _) = opt(line_ending)(input)?;
    // A line break here means an empty line, which ends the matrix.
    let (input, first) = parse_residue(input)?;
    let (input, _) = cut(char('\t'))(input)?;
    let (input, second) = cut(parse_residue)(input)?;
    let (input, _) = cut(char('\t'))(input)?;
    let (input, score) = cut(double)(input)?;
    Ok((input, ((first, second), score)))
}

fn parse_residue(input: &str) -> IResult<&str, char> {
    satisfy(|c| !is_any_line_break(c) && c != '\t')(input)
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::score::r64;
    use crate::substitution_matrix::SubstitutionMatrix;

    #[test]
    fn read_custom_matrix() {
        let input = "A\tA\t8\nA\tT\t-5\nT\tA\t-5\nA\tC\t2\n";
        let matrix = SubstitutionMatrix::read_plain(input.as_bytes(), r64(-2.0)).unwrap();
        assert_eq!(matrix.score('A', 'A'), Some(r64(8.0)));
        assert_eq!(matrix.score('T', 'A'), Some(r64(-5.0)));
        assert_eq!(matrix.score('C', 'A'), Some(r64(2.0)));
        assert_eq!(matrix.gap_cost('T'), Some(r64(-2.0)));
    }

    #[test]
    fn empty_line_terminates() {
        let input = "A\tA\t8\n\nA\tT\t-5\n";
        let matrix = SubstitutionMatrix::read_plain(input.as_bytes(), r64(-2.0)).unwrap();
        assert_eq!(matrix.score('A', 'A'), Some(r64(8.0)));
        assert_eq!(matrix.score('A', 'T'), None);
    }

    #[test]
    fn missing_columns_are_an_error() {
        let input = "A\tA\t8\nA\tT\n";
        let error = SubstitutionMatrix::read_plain(input.as_bytes(), r64(-2.0)).unwrap_err();
        assert!(matches!(error, Error::Parser { .. }));
    }
}
