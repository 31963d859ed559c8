use crate::{
    error::{Error, MalformedTreeKind, Result},
    node_types::NodeType,
    score::{r64, Score},
};

/// A named sequence of residues interpreted as a linearised labelled tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSequence {
    name: String,
    residues: Vec<char>,
}

impl TreeSequence {
    pub fn new(name: impl Into<String>, residues: impl IntoIterator<Item = char>) -> Self {
        Self {
            name: name.into(),
            residues: residues.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn residues(&self) -> &[char] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Associates every closing T-node of a sequence with the A-node opening its
/// subtree, along with the gap cost accumulated inside the subtree.
///
/// Built in one left-to-right scan; building doubles as the well-formedness
/// check for the A/T nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaTable {
    partners: Vec<Option<usize>>,
    subtree_gap_costs: Vec<Score>,
}

impl TaTable {
    /// Scans `sequence` and pairs every T-node with its opening A-node.
    ///
    /// `types` and `gap_costs` must hold the node type and gap cost of every
    /// residue, in sequence order.
    pub fn build(sequence: &TreeSequence, types: &[NodeType], gap_costs: &[Score]) -> Result<Self> {
        let mut partners = vec![None; sequence.len()];
        let mut subtree_gap_costs = vec![r64(0.0); sequence.len()];

        // The stacks move in lockstep. `None` at the bottom of the A-stack is
        // the virtual outermost scope; the corresponding cost register
        // accumulates the gap cost of everything outside any subtree.
        let mut a_stack: Vec<Option<usize>> = vec![None];
        let mut cost_stack: Vec<Score> = vec![r64(0.0)];
        let mut outermost_close = None;

        for index in 0..sequence.len() {
            if let Some(register) = cost_stack.last_mut() {
                *register += gap_costs[index];
            }

            match types[index] {
                NodeType::A => {
                    a_stack.push(Some(index));
                    cost_stack.push(r64(0.0));
                }
                NodeType::T => {
                    let (Some(partner), Some(enclosed)) = (a_stack.pop(), cost_stack.pop()) else {
                        return Err(Error::MalformedTree {
                            name: sequence.name().to_owned(),
                            kind: MalformedTreeKind::UnmatchedClose { index },
                        });
                    };
                    if partner.is_none() {
                        outermost_close = Some(index);
                    }
                    partners[index] = partner;
                    subtree_gap_costs[index] = enclosed;
                    if let Some(register) = cost_stack.last_mut() {
                        *register += enclosed;
                    }
                }
                NodeType::C => {}
            }
        }

        match a_stack.as_slice() {
            [None] => Ok(Self {
                partners,
                subtree_gap_costs,
            }),
            [] => Err(Error::MalformedTree {
                name: sequence.name().to_owned(),
                kind: MalformedTreeKind::UnmatchedClose {
                    index: outermost_close.unwrap_or(0),
                },
            }),
            open => Err(Error::MalformedTree {
                name: sequence.name().to_owned(),
                kind: MalformedTreeKind::UnmatchedOpen {
                    count: open.iter().filter(|entry| entry.is_some()).count(),
                },
            }),
        }
    }

    /// Index of the A-node opening the subtree closed at `index`, or `None`
    /// when the T-node closes the outermost scope. In the latter case the
    /// subtree spans from the start of the sequence.
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.partners[index]
    }

    /// Gap cost accumulated between the opening A-node (exclusive) and the
    /// closing T-node at `index` (inclusive).
    pub fn subtree_gap_cost(&self, index: usize) -> Score {
        self.subtree_gap_costs[index]
    }
}
