use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An IO error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("A parsing error occurred on string '{input}': {kind:?}")]
    Parser {
        input: String,
        kind: nom::error::ErrorKind,
    },

    #[error("Parsing was unsuccessful due to incomplete input: {0:?}")]
    ParserIncomplete(nom::Needed),

    /// A residue in an input sequence has no node type classification.
    #[error("residue '{residue}' in sequence '{name}' has no node type")]
    UnknownResidue { name: String, residue: char },

    /// A residue pair occurring in the inputs has no substitution matrix entry.
    #[error("residue pair ('{first}', '{second}') has no substitution matrix entry")]
    UnknownResiduePair { first: char, second: char },

    /// The A/T nesting of a tree sequence is unbalanced.
    #[error("sequence '{name}' is not a well-formed tree sequence: {kind}")]
    MalformedTree {
        name: String,
        kind: MalformedTreeKind,
    },

    /// Mirrored substitution matrix entries contradict each other.
    #[error(
        "contradictory substitution matrix entries for ('{first}', '{second}'): {left} vs {right}"
    )]
    IncompatibleMatrix {
        first: char,
        second: char,
        left: f64,
        right: f64,
    },

    /// A cost is not a finite number.
    #[error("cost '{name}' is not finite: {value}")]
    InvalidCost { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedTreeKind {
    /// A closing T-node has no matching A-node.
    UnmatchedClose { index: usize },
    /// One or more A-nodes are never closed by a T-node.
    UnmatchedOpen { count: usize },
}

impl std::fmt::Display for MalformedTreeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmatchedClose { index } => {
                write!(f, "the T-node at index {index} has no matching A-node")
            }
            Self::UnmatchedOpen { count } => {
                write!(f, "{count} A-node(s) are never closed by a T-node")
            }
        }
    }
}
