use std::io::Read;

use nom::{
    bytes::complete::take_till,
    character::complete::{char, line_ending, satisfy},
    combinator::{cut, opt},
    multi::many1,
    IResult,
};

use super::{NodeType, NodeTypeMap};
use crate::{
    error::Result,
    io::{failure, is_any_line_break, translate_nom_error},
};

impl NodeTypeMap {
    /// Reads a node type specification with one `<tag>:<residues>` line per
    /// type, for example `C:BRPD`. An empty line terminates the
    /// specification; tags other than `A`, `C` and `T` are errors.
    pub fn read_plain(mut reader: impl Read) -> Result<Self> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;

        parse_plain(&input)
            .map_err(translate_nom_error)
            .map(|(_, output)| output)
    }
}

fn parse_plain(input: &str) -> IResult<&str, NodeTypeMap> {
    let (input, groups) = many1(parse_group)(input)?;
    Ok((input, NodeTypeMap::from_groups(groups)))
}

fn parse_group(input: &str) -> IResult<&str, (NodeType, &str)> {
    let (input, _) = opt(line_ending)(input)?;
    let (input, tag) = parse_tag(input)?;
    let (input, _) = cut(char(':'))(input)?;
    let (input, residues) = take_till(is_any_line_break)(input)?;
    Ok((input, (tag, residues)))
}

fn parse_tag(input: &str) -> IResult<&str, NodeType> {
    // A line break here means an empty line, which ends the specification.
    let (rest, tag) = satisfy(|c| !is_any_line_break(c))(input)?;
    let node_type = match tag {
        'A' => NodeType::A,
        'C' => NodeType::C,
        'T' => NodeType::T,
        _ => return Err(failure(input)),
    };
    Ok((rest, node_type))
}

#[cfg(test)]
mod tests {
    use crate::node_types::{NodeType, NodeTypeMap};

    #[test]
    fn read_specification() {
        let input = "A:A\nC:BRPD\nT:T\n";
        let node_types = NodeTypeMap::read_plain(input.as_bytes()).unwrap();
        assert_eq!(node_types.classify('B'), Some(NodeType::C));
        assert_eq!(node_types.classify('A'), Some(NodeType::A));
        assert_eq!(node_types.classify('T'), Some(NodeType::T));
    }

    #[test]
    fn empty_line_terminates() {
        let input = "A:A\nC:C\n\nT:T\n";
        let node_types = NodeTypeMap::read_plain(input.as_bytes()).unwrap();
        assert_eq!(node_types.classify('C'), Some(NodeType::C));
        assert_eq!(node_types.classify('T'), None);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let input = "A:A\nX:QWE\n";
        assert!(NodeTypeMap::read_plain(input.as_bytes()).is_err());
    }
}
