use std::{fs, path::Path};

use anyhow::{anyhow, Result};
use log::debug;
use nom::{
    bytes::complete::{take_till, take_till1},
    character::complete::{char, line_ending, multispace0},
    combinator::{cut, opt},
    multi::{many0, many1},
    IResult,
};

/// A fasta record: the first word of the header line, the remainder of the
/// header, and the residues with whitespace stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    pub comment: String,
    pub sequence: String,
}

pub fn parse_pair_fasta_file(path: impl AsRef<Path>) -> Result<(FastaRecord, FastaRecord)> {
    let path = path.as_ref();
    let mut records = parse_fasta_file(path)?;
    if records.len() != 2 {
        return Err(anyhow!(
            "Expected paired fasta file with two records, but {} contains {} records",
            path.display(),
            records.len()
        ));
    }
    let second = records.remove(1);
    let first = records.remove(0);
    Ok((first, second))
}

pub fn parse_single_fasta_file(path: impl AsRef<Path>) -> Result<FastaRecord> {
    let path = path.as_ref();
    let mut records = parse_fasta_file(path)?;
    if records.len() != 1 {
        return Err(anyhow!(
            "Expected single-record fasta file, but {} contains {} records",
            path.display(),
            records.len()
        ));
    }
    Ok(records.remove(0))
}

pub fn parse_fasta_file(path: impl AsRef<Path>) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    debug!("Parsing fasta file {}", path.display());

    let input = fs::read_to_string(path)
        .map_err(|error| anyhow!("Unable to open input file {}: {error}", path.display()))?;
    let (_, records) = parse_fasta(&input)
        .map_err(|error| anyhow!("{} is not a valid fasta file: {error}", path.display()))?;
    Ok(records)
}

fn parse_fasta(input: &str) -> IResult<&str, Vec<FastaRecord>> {
    let (input, _) = multispace0(input)?;
    many1(parse_record)(input)
}

fn parse_record(input: &str) -> IResult<&str, FastaRecord> {
    let (input, _) = char('>')(input)?;
    let (input, name) = cut(take_till1(char::is_whitespace))(input)?;
    let (input, comment) = take_till(is_line_break)(input)?;
    let (input, _) = opt(line_ending)(input)?;
    let (input, lines) = many0(parse_sequence_line)(input)?;

    let mut sequence = String::new();
    for line in lines {
        sequence.extend(line.chars().filter(|c| !c.is_whitespace()));
    }

    Ok((
        input,
        FastaRecord {
            name: name.to_owned(),
            comment: comment.trim().to_owned(),
            sequence,
        },
    ))
}

/// One line of residues. The next record header or the end of the file stops
/// the repetition.
fn parse_sequence_line(input: &str) -> IResult<&str, &str> {
    if input.is_empty() || input.starts_with('>') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let (input, line) = take_till(is_line_break)(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, line))
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}
