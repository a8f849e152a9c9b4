//! Operation
//!
//! Reversible structural edits of a decision graph. An edit can be applied, measured and
//! reversed any number of times before it is committed.
use crate::data::AttributeId;
use crate::graph::DecisionGraph;
use crate::node::SplitRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaves that an applied edit removed from and added to the live leaf set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafDelta {
    pub removed: Vec<usize>,
    pub added: Vec<usize>,
}

/// A structural edit of a decision graph.
pub trait GraphEdit {
    /// Apply the edit.
    fn perform(&mut self, graph: &mut DecisionGraph);
    /// Undo a previous `perform`, leaving the graph exactly as it was before.
    fn reverse(&mut self, graph: &mut DecisionGraph);
    /// Leaf changes caused by the applied edit.
    fn affected_leaves(&self, graph: &DecisionGraph) -> LeafDelta;
    /// Bits saved by the edit. Non-positive means not worth applying.
    fn savings(&self) -> f64;
    fn record(&self, graph: &DecisionGraph) -> OperationRecord;
}

/// Turn a leaf into a decision node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOperation {
    pub node: usize,
    /// `None` when no attribute is worth splitting on.
    pub attribute: Option<AttributeId>,
    pub cut: Option<f64>,
    pub cut_bits: f64,
    pub savings: f64,
}

impl SplitOperation {
    /// Zero-savings placeholder.
    pub fn none(node: usize) -> Self {
        SplitOperation {
            node,
            attribute: None,
            cut: None,
            cut_bits: 0.0,
            savings: 0.0,
        }
    }

    pub fn categorical(node: usize, attribute: AttributeId) -> Self {
        SplitOperation {
            attribute: Some(attribute),
            ..Self::none(node)
        }
    }

    /// * `cut_bits` - Bits needed to transmit the threshold.
    pub fn numeric(node: usize, attribute: AttributeId, cut: f64, cut_bits: f64) -> Self {
        SplitOperation {
            node,
            attribute: Some(attribute),
            cut: Some(cut),
            cut_bits,
            savings: 0.0,
        }
    }

    pub fn rule(&self) -> Option<SplitRule> {
        self.attribute.map(|attribute| SplitRule {
            attribute,
            cut: self.cut,
            cut_bits: self.cut_bits,
        })
    }
}

impl GraphEdit for SplitOperation {
    fn perform(&mut self, graph: &mut DecisionGraph) {
        if let Some(rule) = self.rule() {
            graph.apply_split(self.node, rule);
        }
    }

    fn reverse(&mut self, graph: &mut DecisionGraph) {
        if self.attribute.is_some() {
            graph.reverse_split(self.node);
        }
    }

    fn affected_leaves(&self, graph: &DecisionGraph) -> LeafDelta {
        if self.attribute.is_none() {
            return LeafDelta::default();
        }
        LeafDelta {
            removed: vec![self.node],
            added: graph.node(self.node).children.clone(),
        }
    }

    fn savings(&self) -> f64 {
        self.savings
    }

    fn record(&self, graph: &DecisionGraph) -> OperationRecord {
        OperationRecord {
            kind: OperationKind::Split,
            nodes: vec![self.node],
            attribute: self.attribute.map(|a| graph.table().spec(a).name.clone()),
            cut: self.cut,
            created: graph.node(self.node).children.clone(),
            savings: self.savings,
        }
    }
}

impl fmt::Display for SplitOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.attribute, self.cut) {
            (None, _) => write!(f, "no split"),
            (Some(a), Some(cut)) => write!(
                f,
                "split node {} on attribute {} at {}, savings {:.4}",
                self.node, a, cut, self.savings
            ),
            (Some(a), None) => write!(f, "split node {} on attribute {}, savings {:.4}", self.node, a, self.savings),
        }
    }
}

/// Merge two or more leaves into one shared child.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOperation {
    pub nodes: Vec<usize>,
    /// The shared child, set while the join is applied.
    pub joined_node: Option<usize>,
    pub savings: f64,
}

impl JoinOperation {
    pub fn new(nodes: Vec<usize>) -> Self {
        JoinOperation {
            nodes,
            joined_node: None,
            savings: 0.0,
        }
    }

    /// Zero-savings placeholder.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }
}

impl GraphEdit for JoinOperation {
    fn perform(&mut self, graph: &mut DecisionGraph) {
        if self.nodes.len() >= 2 {
            self.joined_node = Some(graph.apply_join(&self.nodes));
        }
    }

    fn reverse(&mut self, graph: &mut DecisionGraph) {
        if let Some(child) = self.joined_node.take() {
            graph.reverse_join(&self.nodes, child);
        }
    }

    fn affected_leaves(&self, _graph: &DecisionGraph) -> LeafDelta {
        match self.joined_node {
            Some(child) => LeafDelta {
                removed: self.nodes.clone(),
                added: vec![child],
            },
            None => LeafDelta::default(),
        }
    }

    fn savings(&self) -> f64 {
        self.savings
    }

    fn record(&self, _graph: &DecisionGraph) -> OperationRecord {
        OperationRecord {
            kind: OperationKind::Join,
            nodes: self.nodes.clone(),
            attribute: None,
            cut: None,
            created: self.joined_node.into_iter().collect(),
            savings: self.savings,
        }
    }
}

impl fmt::Display for JoinOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.joined_node {
            Some(child) => write!(f, "join nodes {:?} into {}, savings {:.4}", self.nodes, child, self.savings),
            None => write!(f, "join nodes {:?}, savings {:.4}", self.nodes, self.savings),
        }
    }
}

/// The best edit chosen in one round of the search.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Split(SplitOperation),
    Join(JoinOperation),
}

impl GraphEdit for Operation {
    fn perform(&mut self, graph: &mut DecisionGraph) {
        match self {
            Operation::Split(op) => op.perform(graph),
            Operation::Join(op) => op.perform(graph),
        }
    }

    fn reverse(&mut self, graph: &mut DecisionGraph) {
        match self {
            Operation::Split(op) => op.reverse(graph),
            Operation::Join(op) => op.reverse(graph),
        }
    }

    fn affected_leaves(&self, graph: &DecisionGraph) -> LeafDelta {
        match self {
            Operation::Split(op) => op.affected_leaves(graph),
            Operation::Join(op) => op.affected_leaves(graph),
        }
    }

    fn savings(&self) -> f64 {
        match self {
            Operation::Split(op) => op.savings,
            Operation::Join(op) => op.savings,
        }
    }

    fn record(&self, graph: &DecisionGraph) -> OperationRecord {
        match self {
            Operation::Split(op) => op.record(graph),
            Operation::Join(op) => op.record(graph),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Split(op) => write!(f, "{}", op),
            Operation::Join(op) => write!(f, "{}", op),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Split,
    Join,
}

/// A committed edit, as kept in the graph's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub nodes: Vec<usize>,
    /// Name of the split attribute.
    pub attribute: Option<String>,
    pub cut: Option<f64>,
    pub created: Vec<usize>,
    pub savings: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnSpec, Dataset, Table};

    fn graph() -> DecisionGraph {
        let specs = vec![
            ColumnSpec::categorical("a", ["x", "y", "z"]),
            ColumnSpec::numeric("v"),
            ColumnSpec::categorical("label", ["p", "q"]),
        ];
        let columns = vec![
            Column::Categorical(vec![0, 1, 2, 0, 1, 2]),
            Column::Numeric(vec![1., 2., 3., 4., 5., 6.]),
            Column::Categorical(vec![0, 0, 1, 1, 0, 1]),
        ];
        DecisionGraph::new(Dataset::new(Table::new(specs, columns, "label").unwrap()))
    }

    #[test]
    fn test_split_perform_reverse_restores_state() {
        let mut g = graph();
        let before = g.nodes.clone();
        let mut op = SplitOperation::numeric(0, 1, 3.5, 2.0f64.log2());
        for _ in 0..3 {
            op.perform(&mut g);
            assert_eq!(g.len(), 3);
            assert_eq!(op.affected_leaves(&g).added, vec![1, 2]);
            op.reverse(&mut g);
            assert_eq!(g.nodes, before);
        }
    }

    #[test]
    fn test_join_perform_reverse_restores_state() {
        let mut g = graph();
        let mut split = SplitOperation::categorical(0, 0);
        g.commit(&mut split);
        let before = g.nodes.clone();
        let leaves = g.leaves.clone();

        let mut join = JoinOperation::new(vec![1, 3]);
        join.perform(&mut g);
        let child = join.joined_node.unwrap();
        assert_eq!(
            join.affected_leaves(&g),
            LeafDelta {
                removed: vec![1, 3],
                added: vec![child]
            }
        );
        join.reverse(&mut g);
        assert_eq!(join.joined_node, None);
        assert_eq!(g.nodes, before);
        assert_eq!(g.leaves, leaves);
    }

    #[test]
    fn test_placeholders_do_nothing() {
        let mut g = graph();
        let before = g.nodes.clone();
        let mut op = Operation::Split(SplitOperation::none(0));
        op.perform(&mut g);
        assert_eq!(op.affected_leaves(&g), LeafDelta::default());
        op.reverse(&mut g);
        let mut op = Operation::Join(JoinOperation::none());
        op.perform(&mut g);
        op.reverse(&mut g);
        assert_eq!(g.nodes, before);
        assert_eq!(op.savings(), 0.0);
    }

    #[test]
    fn test_record_and_display() {
        let mut g = graph();
        let mut op = Operation::Split(SplitOperation::numeric(0, 1, 3.5, 1.0));
        op.perform(&mut g);
        let record = op.record(&g);
        assert_eq!(record.kind, OperationKind::Split);
        assert_eq!(record.attribute, Some("v".to_string()));
        assert_eq!(record.created, vec![1, 2]);
        assert!(format!("{}", op).starts_with("split node 0 on attribute 1 at 3.5"));
    }
}
