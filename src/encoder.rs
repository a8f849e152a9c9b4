//! Encoder
//!
//! Minimum message length of a decision graph, as a two-part code: bits announcing the
//! structure of the graph plus bits announcing the labels observed in every leaf.
//!
//! Join children are priced in later "waves": a join node only costs the bit saying it
//! is not a leaf, and the subgraph under its shared child is costed once in the next
//! wave, together with the cost of the pattern in which join nodes were merged.
use crate::graph::DecisionGraph;
use crate::ledger::{JoinLedger, JoinPattern};
use crate::node::{Incoming, NodeKind};
use crate::utils::{bits, log2_binomial, log2_factorial};
use hashbrown::HashSet;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoder {
    /// Concentration of the label prior.
    pub alpha: f64,
    /// Size of the label domain.
    pub n_classes: usize,
}

impl Encoder {
    pub fn new(alpha: f64, n_classes: usize) -> Self {
        Encoder { alpha, n_classes }
    }

    /// Bits needed to transmit the labels of a leaf with the given label counts,
    /// using the incremental (adaptive) code. Does not depend on row order.
    ///
    /// Matches `sequential_length` only for `alpha > 0`. At `alpha = 0` the two skip
    /// different zero-probability terms and disagree.
    pub fn category_length(&self, counts: &[usize]) -> f64 {
        let n: usize = counts.iter().sum();
        let c_alpha = self.n_classes as f64 * self.alpha;
        let mut ml = 0.0;
        for &count in counts {
            for i in 0..count {
                let num = i as f64 + self.alpha;
                if num > 0.0 {
                    ml -= num.log2();
                }
            }
        }
        for j in 0..n {
            let den = j as f64 + c_alpha;
            if den > 0.0 {
                ml += den.log2();
            }
        }
        ml
    }

    /// The same code evaluated one label at a time, in the given order.
    pub fn sequential_length(&self, labels: &[u32]) -> f64 {
        let c_alpha = self.n_classes as f64 * self.alpha;
        let mut seen = vec![0usize; self.n_classes];
        let mut ml = 0.0;
        for (j, &label) in labels.iter().enumerate() {
            let q = (seen[label as usize] as f64 + self.alpha) / (j as f64 + c_alpha);
            if q > 0.0 && q.is_finite() {
                ml -= q.log2();
            }
            seen[label as usize] += 1;
        }
        ml
    }

    /// Probability that the node is not a leaf.
    pub fn not_leaf_probability(&self, graph: &DecisionGraph, idx: usize) -> f64 {
        let node = graph.node(idx);
        match &node.incoming {
            Incoming::Root | Incoming::Join { .. } => {
                let n_attrs = node.remaining_attributes().len();
                if n_attrs == 0 {
                    0.0
                } else {
                    1.0 - 1.0 / n_attrs as f64
                }
            }
            Incoming::Branch { parent, .. } => 1.0 / graph.node(*parent).children.len() as f64,
        }
    }

    /// Message length of the subgraph rooted at `idx`, stopping at join nodes.
    pub fn local_length(&self, graph: &DecisionGraph, idx: usize) -> f64 {
        let mut ledger = JoinLedger::new();
        let mut next_roots = BTreeSet::new();
        self.tree_length(graph, idx, &mut ledger, &mut next_roots)
    }

    fn tree_length(
        &self,
        graph: &DecisionGraph,
        idx: usize,
        ledger: &mut JoinLedger,
        next_roots: &mut BTreeSet<usize>,
    ) -> f64 {
        let node = graph.node(idx);
        let p = self.not_leaf_probability(graph, idx);
        match node.kind() {
            NodeKind::Leaf => bits(1.0 - p) + self.category_length(&node.label_counts),
            NodeKind::Join => {
                ledger.add(idx);
                next_roots.insert(node.children[0]);
                bits(1.0 - p)
            }
            NodeKind::Decision => {
                let mut ml = bits(p);
                let n_attrs = node.remaining_attributes().len();
                if n_attrs > 0 {
                    ml += (n_attrs as f64).log2();
                }
                if let Some(rule) = &node.split {
                    ml += rule.cut_bits;
                }
                for &child in &node.children {
                    ml += self.tree_length(graph, child, ledger, next_roots);
                }
                ml
            }
        }
    }

    /// Message length of the whole graph, join children and join patterns included.
    pub fn global_length(&self, graph: &DecisionGraph) -> f64 {
        let mut ledger = JoinLedger::new();
        let mut roots = BTreeSet::from([graph.root]);
        let mut costed = HashSet::new();
        let mut ml = 0.0;
        while !roots.is_empty() {
            ledger.new_wave();
            let mut next_roots = BTreeSet::new();
            for root in roots {
                if costed.insert(root) {
                    ml += self.tree_length(graph, root, &mut ledger, &mut next_roots);
                }
            }
            if ledger.n_new() > 0 {
                ledger.resolve(graph);
                if ledger.n_new() > 1 {
                    ml += self.join_pattern_length(&ledger.pattern());
                }
            }
            roots = next_roots;
        }
        ml
    }

    /// Bits needed to say which of the candidate join nodes were merged, and into which groups.
    pub fn join_pattern_length(&self, pattern: &JoinPattern) -> f64 {
        let n = pattern.n_new;
        let q = pattern.n_old;
        let m = pattern.groups.len();
        let y = pattern.n_pending_new;

        let choices = (n as f64).min((n + q) as f64 / 2.0);
        let ml1 = if choices > 0.0 { choices.log2() } else { 0.0 };
        let ml2 = log2_binomial((n + q).saturating_sub(m), m);
        let mut ml3 = log2_factorial(n) + log2_factorial(q)
            - log2_factorial(y)
            - log2_factorial(pattern.n_pending.saturating_sub(y));
        for &(size, new) in &pattern.groups {
            ml3 -= log2_factorial(new) + log2_factorial(size.saturating_sub(new));
        }
        ml1 + ml2 + ml3
    }
}
