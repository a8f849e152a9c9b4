//! Join Ledger
//!
//! Bookkeeping of join nodes across the waves of the global message length. Join nodes
//! met in the current wave are "new"; join nodes left unresolved by earlier waves are
//! "old". Resolving groups both by their shared child.
use crate::graph::DecisionGraph;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct JoinLedger {
    new_nodes: BTreeSet<usize>,
    old_nodes: BTreeSet<usize>,
    pending: BTreeSet<usize>,
    joined: BTreeSet<usize>,
    groups: Vec<BTreeSet<usize>>,
}

/// The counts a join pattern is priced from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinPattern {
    /// Join nodes registered in this wave.
    pub n_new: usize,
    /// Unresolved join nodes from earlier waves.
    pub n_old: usize,
    /// Nodes not (yet) sharing their child with another join node.
    pub n_pending: usize,
    /// Pending nodes that are new in this wave.
    pub n_pending_new: usize,
    /// Size of each join group and how many of its members are new.
    pub groups: Vec<(usize, usize)>,
}

impl JoinLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the next wave: this wave's nodes become old, resolved ones are forgotten.
    pub fn new_wave(&mut self) {
        let new_nodes = std::mem::take(&mut self.new_nodes);
        self.old_nodes.extend(new_nodes);
        for n in &self.joined {
            self.old_nodes.remove(n);
        }
        self.pending.clear();
        self.joined.clear();
        self.groups.clear();
    }

    /// Register a join node met during the current wave.
    pub fn add(&mut self, node: usize) {
        self.new_nodes.insert(node);
    }

    pub fn n_new(&self) -> usize {
        self.new_nodes.len()
    }

    pub fn new_nodes(&self) -> &BTreeSet<usize> {
        &self.new_nodes
    }

    pub fn old_nodes(&self) -> &BTreeSet<usize> {
        &self.old_nodes
    }

    pub fn pending(&self) -> &BTreeSet<usize> {
        &self.pending
    }

    pub fn groups(&self) -> &[BTreeSet<usize>] {
        &self.groups
    }

    /// Group new and old nodes by their shared child. Groups of two or more form joins,
    /// single nodes stay pending.
    pub fn resolve(&mut self, graph: &DecisionGraph) {
        let mut by_child: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for &n in self.new_nodes.iter().chain(self.old_nodes.iter()) {
            if let Some(&child) = graph.node(n).children.first() {
                by_child.entry(child).or_default().insert(n);
            }
        }
        for group in by_child.into_values() {
            if group.len() > 1 {
                self.joined.extend(group.iter().copied());
                self.groups.push(group);
            } else {
                self.pending.extend(group);
            }
        }
    }

    pub fn pattern(&self) -> JoinPattern {
        JoinPattern {
            n_new: self.new_nodes.len(),
            n_old: self.old_nodes.len(),
            n_pending: self.pending.len(),
            n_pending_new: self.pending.intersection(&self.new_nodes).count(),
            groups: self
                .groups
                .iter()
                .map(|g| (g.len(), g.iter().filter(|n| self.new_nodes.contains(n)).count()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnSpec, Dataset, Table};
    use crate::operation::{JoinOperation, SplitOperation};

    fn graph() -> DecisionGraph {
        let specs = vec![
            ColumnSpec::categorical("a", ["x", "y", "z", "w"]),
            ColumnSpec::categorical("label", ["p", "q"]),
        ];
        let columns = vec![
            Column::Categorical(vec![0, 1, 2, 3, 0, 1, 2, 3]),
            Column::Categorical(vec![0, 0, 1, 1, 0, 1, 1, 0]),
        ];
        let mut g = DecisionGraph::new(Dataset::new(Table::new(specs, columns, "label").unwrap()));
        g.commit(&mut SplitOperation::categorical(0, 0));
        g
    }

    #[test]
    fn test_resolve_groups_by_child() {
        let mut g = graph();
        g.commit(&mut JoinOperation::new(vec![1, 2]));
        let mut ledger = JoinLedger::new();
        ledger.new_wave();
        ledger.add(1);
        ledger.add(2);
        ledger.resolve(&g);
        assert_eq!(ledger.groups(), &[BTreeSet::from([1, 2])]);
        assert!(ledger.pending().is_empty());
        assert_eq!(
            ledger.pattern(),
            JoinPattern {
                n_new: 2,
                n_old: 0,
                n_pending: 0,
                n_pending_new: 0,
                groups: vec![(2, 2)],
            }
        );
        ledger.new_wave();
        assert!(ledger.old_nodes().is_empty());
        assert!(ledger.new_nodes().is_empty());
    }

    #[test]
    fn test_pending_carries_to_next_wave() {
        let mut g = graph();
        g.commit(&mut JoinOperation::new(vec![1, 2]));
        g.commit(&mut JoinOperation::new(vec![3, 4]));
        let mut ledger = JoinLedger::new();
        ledger.add(1);
        ledger.resolve(&g);
        assert_eq!(ledger.pending(), &BTreeSet::from([1]));
        ledger.new_wave();
        assert_eq!(ledger.old_nodes(), &BTreeSet::from([1]));

        ledger.add(2);
        ledger.add(3);
        ledger.resolve(&g);
        let pattern = ledger.pattern();
        assert_eq!(pattern.n_new, 2);
        assert_eq!(pattern.n_old, 1);
        assert_eq!(pattern.groups, vec![(2, 1)]);
        assert_eq!(pattern.n_pending, 1);
        assert_eq!(pattern.n_pending_new, 1);
        ledger.new_wave();
        assert_eq!(ledger.old_nodes(), &BTreeSet::from([3]));
    }
}
