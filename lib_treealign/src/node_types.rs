use std::collections::HashMap;

pub mod io;

/// Structural role of a residue within a linearised labelled tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Opens a subtree.
    A,
    /// Interior of a subtree.
    C,
    /// Closes a subtree, matching the nearest open A-node.
    T,
}

/// Maps every residue to its node type.
///
/// Residues missing from the map are unclassified; the aligner rejects
/// sequences containing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeMap {
    residue_types: HashMap<char, NodeType>,
}

impl NodeTypeMap {
    /// Builds the map from groups of residues sharing a node type.
    ///
    /// A residue appearing in several groups takes the type of the last one.
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = (NodeType, &'a str)>) -> Self {
        let mut residue_types = HashMap::new();
        for (node_type, residues) in groups {
            for residue in residues.chars() {
                residue_types.insert(residue, node_type);
            }
        }
        Self { residue_types }
    }

    pub fn classify(&self, residue: char) -> Option<NodeType> {
        self.residue_types.get(&residue).copied()
    }
}

impl Default for NodeTypeMap {
    /// The trivial classification: `A` opens, `C` is interior, `T` closes.
    fn default() -> Self {
        Self::from_groups([(NodeType::A, "A"), (NodeType::C, "C"), (NodeType::T, "T")])
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeType, NodeTypeMap};

    #[test]
    fn default_classification() {
        let node_types = NodeTypeMap::default();
        assert_eq!(node_types.classify('A'), Some(NodeType::A));
        assert_eq!(node_types.classify('C'), Some(NodeType::C));
        assert_eq!(node_types.classify('T'), Some(NodeType::T));
        assert_eq!(node_types.classify('G'), None);
    }

    #[test]
    fn grouped_classification() {
        let node_types = NodeTypeMap::from_groups([
            (NodeType::A, "A"),
            (NodeType::C, "BRPD"),
            (NodeType::T, "T"),
        ]);
        assert_eq!(node_types.classify('R'), Some(NodeType::C));
        assert_eq!(node_types.classify('D'), Some(NodeType::C));
        assert_eq!(node_types.classify('C'), None);
    }
}
