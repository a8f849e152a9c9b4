//! Decision Graph
//!
//! The arena of nodes together with the live set of leaves. Nodes are addressed by
//! stable ids; tentative nodes are only ever created at the end of the arena and are
//! dropped again when the edit that created them is reversed.
use crate::data::{AttributeId, Column, ColumnType, Dataset, Table, Value};
use crate::errors::GraphError;
use crate::node::{Branch, Incoming, Node, SplitRule};
use crate::operation::{GraphEdit, LeafDelta, OperationRecord};
use hashbrown::HashSet;
use rayon::prelude::*;
use std::fmt::{self, Display};
use std::sync::Arc;

/// A cell as seen while routing a row.
enum Cell {
    Code(u32),
    Number(f64),
    Unknown,
}

#[derive(Debug, Clone)]
pub struct DecisionGraph {
    pub nodes: Vec<Node>,
    pub leaves: Vec<usize>,
    pub root: usize,
    /// Total message length in bits, maintained while fitting.
    pub message_length: f64,
    pub history: Vec<OperationRecord>,
    table: Arc<Table>,
}

impl DecisionGraph {
    /// A graph made of a single root leaf holding all of `data`.
    pub fn new(data: Dataset) -> Self {
        let table = Arc::clone(data.table());
        let root = Node::new(0, 0, Incoming::Root, data, None);
        DecisionGraph {
            nodes: vec![root],
            leaves: vec![0],
            root: 0,
            message_length: 0.0,
            history: Vec::new(),
            table,
        }
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn n_leaves(&self) -> usize {
        self.leaves.len()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Turn leaf `idx` into a decision node, one child per bucket of the partition.
    pub fn apply_split(&mut self, idx: usize, rule: SplitRule) {
        let parent = &self.nodes[idx];
        let depth = parent.depth + 1;
        let parent_freq = parent.class_freq.clone();
        let parts: Vec<(Branch, Dataset)> = match rule.cut {
            None => parent
                .data
                .partition_categorical(rule.attribute)
                .into_iter()
                .enumerate()
                .map(|(code, d)| (Branch::Category(code as u32), d))
                .collect(),
            Some(cut) => {
                let (low, high) = parent.data.partition_numeric(rule.attribute, cut);
                vec![(Branch::AtMost(cut), low), (Branch::Above(cut), high)]
            }
        };

        let mut children = Vec::with_capacity(parts.len());
        for (branch, data) in parts {
            let num = self.nodes.len();
            let incoming = Incoming::Branch { parent: idx, branch };
            self.nodes
                .push(Node::new(num, depth, incoming, data, Some(&parent_freq)));
            children.push(num);
        }
        let node = &mut self.nodes[idx];
        node.children = children;
        node.split = Some(rule);
    }

    /// Restore leaf state of a node split by `apply_split`.
    pub fn reverse_split(&mut self, idx: usize) {
        let node = &mut self.nodes[idx];
        let children = std::mem::take(&mut node.children);
        node.split = None;
        self.release(&children);
    }

    /// Attach one new child holding the union of all `sources` to each of them.
    /// Returns the id of the shared child.
    pub fn apply_join(&mut self, sources: &[usize]) -> usize {
        let first = &self.nodes[sources[0]];
        let parent_freq = first.class_freq.clone();
        let mut data = first.data.clone();
        for &s in &sources[1..] {
            data = data.union(&self.nodes[s].data);
        }
        let depth = sources.iter().map(|&s| self.nodes[s].depth).max().unwrap_or(0) + 1;
        let num = self.nodes.len();
        let incoming = Incoming::Join {
            parents: sources.to_vec(),
        };
        self.nodes
            .push(Node::new(num, depth, incoming, data, Some(&parent_freq)));
        for &s in sources {
            self.nodes[s].children = vec![num];
        }
        num
    }

    /// Detach the shared child created by `apply_join` from every source.
    pub fn reverse_join(&mut self, sources: &[usize], child: usize) {
        for &s in sources {
            self.nodes[s].children.clear();
        }
        self.release(&[child]);
    }

    // Nodes at the end of the arena are dropped, anything else stays detached.
    fn release(&mut self, created: &[usize]) {
        if let Some(&first) = created.iter().min() {
            if first + created.len() == self.nodes.len() {
                self.nodes.truncate(first);
            }
        }
    }

    /// Apply `op`, evaluate `measure` on the edited graph and reverse `op` again.
    pub fn trial<E, F, R>(&mut self, op: &mut E, measure: F) -> R
    where
        E: GraphEdit + ?Sized,
        F: FnOnce(&DecisionGraph) -> R,
    {
        op.perform(self);
        let result = measure(self);
        op.reverse(self);
        result
    }

    /// Apply `op` for good, updating the leaf set and the history.
    pub fn commit<E: GraphEdit + ?Sized>(&mut self, op: &mut E) {
        op.perform(self);
        let delta = op.affected_leaves(self);
        self.update_leaves(&delta);
        let record = op.record(self);
        self.history.push(record);
    }

    fn update_leaves(&mut self, delta: &LeafDelta) {
        self.leaves.retain(|l| !delta.removed.contains(l));
        self.leaves.extend_from_slice(&delta.added);
    }

    // Descend from the root. A row that cannot be routed past a decision node
    // stops there and is predicted with that node's frequencies.
    fn find_node<F>(&self, cell: F) -> usize
    where
        F: Fn(AttributeId) -> Cell,
    {
        let mut node_idx = self.root;
        loop {
            let node = &self.nodes[node_idx];
            if node.is_leaf() {
                return node_idx;
            }
            if node.is_join() {
                node_idx = node.children[0];
                continue;
            }
            let next = match node.split {
                Some(SplitRule { attribute, cut, .. }) => match (cut, cell(attribute)) {
                    (Some(cut), Cell::Number(v)) => Some(if v <= cut { node.children[0] } else { node.children[1] }),
                    (None, Cell::Code(code)) => node.children.get(code as usize).copied(),
                    _ => None,
                },
                None => None,
            };
            match next {
                Some(child) => node_idx = child,
                None => return node_idx,
            }
        }
    }

    fn label_of(&self, node_idx: usize) -> &str {
        self.table.label_name(self.nodes[node_idx].most_frequent_class())
    }

    /// Predict the label of a single row laid out like the training table.
    /// The label cell is ignored.
    pub fn predict_row(&self, row: &[Value]) -> Result<&str, GraphError> {
        if row.len() != self.table.n_cols() {
            return Err(GraphError::RowLength(row.len(), self.table.n_cols()));
        }
        let node_idx = self.find_node(|attr| {
            let spec = self.table.spec(attr);
            match (&row[attr], spec.column_type) {
                (Value::Category(v), ColumnType::Categorical) => spec.code_of(v).map_or(Cell::Unknown, Cell::Code),
                (Value::Number(v), ColumnType::Numeric) => Cell::Number(*v),
                _ => Cell::Unknown,
            }
        });
        Ok(self.label_of(node_idx))
    }

    fn predict_dataset_row(&self, table: &Table, row: usize) -> &str {
        let node_idx = self.find_node(|attr| match table.column(attr) {
            Column::Categorical(codes) => Cell::Code(codes[row]),
            Column::Numeric(values) => Cell::Number(values[row]),
        });
        self.label_of(node_idx)
    }

    /// Predict the label of every row of `data`.
    ///
    /// * `data` - Rows of a table sharing the training schema.
    /// * `parallel` - Whether to predict rows in parallel.
    pub fn predict(&self, data: &Dataset, parallel: bool) -> Result<Vec<&str>, GraphError> {
        let table = data.table();
        if table.specs() != self.table.specs() {
            return Err(GraphError::SchemaMismatch);
        }
        let predictions: Vec<&str> = if parallel {
            data.rows()
                .par_iter()
                .map(|&r| self.predict_dataset_row(table, r))
                .collect()
        } else {
            data.rows()
                .iter()
                .map(|&r| self.predict_dataset_row(table, r))
                .collect()
        };
        Ok(predictions)
    }

    /// Committed operations as a json array.
    pub fn history_json(&self) -> Result<String, GraphError> {
        serde_json::to_string(&self.history).map_err(|e| GraphError::UnableToWrite(e.to_string()))
    }
}

impl Display for DecisionGraph {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = vec![self.root];
        let mut printed = HashSet::new();
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let node = &self.nodes[idx];
            let indent = "      ".repeat(node.depth);
            if !printed.insert(idx) {
                r += format!("{}{}:shared\n", indent, idx).as_str();
                continue;
            }
            r += format!("{}{}\n", indent, node).as_str();
            print_buffer.extend(node.children.iter().rev());
        }
        write!(f, "{}", r)
    }
}
