//! Node
//!
//! Vertices of a decision graph. A node's kind (leaf, decision or join) follows from its
//! number of children and is never stored separately.
use crate::data::{AttributeId, Dataset};
use crate::operation::SplitOperation;
use hashbrown::HashSet;
use std::collections::BTreeSet;
use std::fmt;

/// The side of a split a child was created for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Branch {
    /// Rows whose categorical value has this code.
    Category(u32),
    /// Rows with a value `<=` the cut.
    AtMost(f64),
    /// Rows with a value `>` the cut.
    Above(f64),
}

/// How a node is reached.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Root,
    Branch { parent: usize, branch: Branch },
    /// Shared child of every listed join node.
    Join { parents: Vec<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Decision,
    Join,
}

/// The test applied at a decision node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRule {
    pub attribute: AttributeId,
    /// Threshold of a numeric split, `None` for a categorical one.
    pub cut: Option<f64>,
    /// Bits needed to transmit the threshold.
    pub cut_bits: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub num: usize,
    pub depth: usize,
    pub incoming: Incoming,
    pub children: Vec<usize>,
    pub split: Option<SplitRule>,
    pub data: Dataset,
    /// Label counts of the node's own rows.
    pub label_counts: Vec<usize>,
    /// Label counts used for prediction; inherited from the parent when the node is empty.
    pub class_freq: Vec<usize>,
    /// Best split found for this node, computed at most once.
    pub best_split: Option<SplitOperation>,
    /// Attributes whose split yields a strictly positive saving.
    pub split_savings: HashSet<AttributeId>,
}

impl Node {
    pub fn new(num: usize, depth: usize, incoming: Incoming, data: Dataset, parent_freq: Option<&[usize]>) -> Self {
        let label_counts = data.label_counts();
        let mut node = Node {
            num,
            depth,
            incoming,
            children: Vec::new(),
            split: None,
            data,
            class_freq: Vec::new(),
            label_counts,
            best_split: None,
            split_savings: HashSet::new(),
        };
        node.compute_class_frequencies(parent_freq);
        node
    }

    /// Tabulate label frequencies from the node's rows, or copy the parent's when there are none.
    pub fn compute_class_frequencies(&mut self, parent_freq: Option<&[usize]>) {
        self.class_freq = match parent_freq {
            Some(freq) if self.data.is_empty() => freq.to_vec(),
            _ => self.label_counts.clone(),
        };
    }

    /// Label code with the largest frequency. Ties go to the lowest code.
    pub fn most_frequent_class(&self) -> u32 {
        let mut best = 0;
        for (code, &count) in self.class_freq.iter().enumerate() {
            if count > self.class_freq[best] {
                best = code;
            }
        }
        best as u32
    }

    pub fn kind(&self) -> NodeKind {
        match self.children.len() {
            0 => NodeKind::Leaf,
            1 => NodeKind::Join,
            _ => NodeKind::Decision,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_join(&self) -> bool {
        self.children.len() == 1
    }

    pub fn is_decision(&self) -> bool {
        self.children.len() >= 2
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// At most one label occurs among the node's rows.
    pub fn is_pure(&self) -> bool {
        self.label_counts.iter().filter(|&&c| c > 0).count() <= 1
    }

    /// The root of the graph or the shared child of a join.
    pub fn is_subtree_root(&self) -> bool {
        matches!(self.incoming, Incoming::Root | Incoming::Join { .. })
    }

    /// The single parent reached through a branch. Join children and the root have none.
    pub fn branch_parent(&self) -> Option<usize> {
        match self.incoming {
            Incoming::Branch { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub fn parents(&self) -> Vec<usize> {
        match &self.incoming {
            Incoming::Root => Vec::new(),
            Incoming::Branch { parent, .. } => vec![*parent],
            Incoming::Join { parents } => parents.clone(),
        }
    }

    pub fn remaining_attributes(&self) -> &BTreeSet<AttributeId> {
        self.data.attributes()
    }
}

impl fmt::Display for Node {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind(), &self.split) {
            (NodeKind::Decision, Some(SplitRule { attribute, cut: Some(cut), .. })) => write!(
                f,
                "{}:[{} <= {}] children={:?},cover={}",
                self.num,
                attribute,
                cut,
                self.children,
                self.data.n_rows()
            ),
            (NodeKind::Decision, Some(SplitRule { attribute, cut: None, .. })) => write!(
                f,
                "{}:[{} in domain] children={:?},cover={}",
                self.num,
                attribute,
                self.children,
                self.data.n_rows()
            ),
            (NodeKind::Join, _) => write!(f, "{}:join={},cover={}", self.num, self.children[0], self.data.n_rows()),
            _ => write!(
                f,
                "{}:leaf={},counts={:?},cover={}",
                self.num,
                self.most_frequent_class(),
                self.class_freq,
                self.data.n_rows()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnSpec, Table};

    fn data() -> Dataset {
        let specs = vec![
            ColumnSpec::categorical("a", ["x", "y", "z"]),
            ColumnSpec::categorical("label", ["p", "q", "r"]),
        ];
        let columns = vec![
            Column::Categorical(vec![0, 0, 1, 1, 0]),
            Column::Categorical(vec![1, 1, 2, 2, 1]),
        ];
        Dataset::new(Table::new(specs, columns, "label").unwrap())
    }

    #[test]
    fn test_class_frequencies() {
        let data = data();
        let root = Node::new(0, 0, Incoming::Root, data.clone(), None);
        assert_eq!(root.class_freq, vec![0, 3, 2]);
        assert_eq!(root.most_frequent_class(), 1);
        assert!(!root.is_pure());
        assert!(root.is_leaf());
        assert!(root.is_subtree_root());

        let parts = data.partition_categorical(0);
        let incoming = Incoming::Branch {
            parent: 0,
            branch: Branch::Category(2),
        };
        let empty = Node::new(1, 1, incoming, parts[2].clone(), Some(&root.class_freq));
        assert!(empty.is_empty());
        assert!(empty.is_pure());
        assert_eq!(empty.label_counts, vec![0, 0, 0]);
        assert_eq!(empty.class_freq, root.class_freq);
        assert_eq!(empty.most_frequent_class(), 1);
        assert_eq!(empty.branch_parent(), Some(0));
        assert!(!empty.is_subtree_root());

        let pure = Node::new(2, 1, Incoming::Root, parts[1].clone(), Some(&root.class_freq));
        assert!(pure.is_pure());
        assert_eq!(pure.class_freq, vec![0, 0, 2]);
    }

    #[test]
    fn test_most_frequent_ties_lowest_code() {
        let specs = vec![
            ColumnSpec::numeric("v"),
            ColumnSpec::categorical("label", ["p", "q"]),
        ];
        let columns = vec![Column::Numeric(vec![1., 2.]), Column::Categorical(vec![1, 0])];
        let data = Dataset::new(Table::new(specs, columns, "label").unwrap());
        let node = Node::new(0, 0, Incoming::Root, data, None);
        assert_eq!(node.most_frequent_class(), 0);
    }

    #[test]
    fn test_kind_from_children() {
        let mut node = Node::new(0, 0, Incoming::Root, data(), None);
        assert_eq!(node.kind(), NodeKind::Leaf);
        node.children = vec![3];
        assert_eq!(node.kind(), NodeKind::Join);
        assert!(node.is_join());
        node.children = vec![3, 4];
        assert_eq!(node.kind(), NodeKind::Decision);
        assert!(node.is_decision());
        let join_child = Node::new(
            5,
            2,
            Incoming::Join { parents: vec![3, 4] },
            data(),
            None,
        );
        assert!(join_child.is_subtree_root());
        assert_eq!(join_child.parents(), vec![3, 4]);
        assert_eq!(join_child.branch_parent(), None);
    }
}
