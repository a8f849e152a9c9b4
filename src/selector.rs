//! Selector
//!
//! Greedy search for the next edit of a decision graph: the best split over all
//! current leaves, the best join of leaves that split well on a common attribute,
//! and the choice between the two.
use crate::builder::config::GraphConfig;
use crate::constants::MIN_JOIN_NODES;
use crate::continuous::ContinuousSplit;
use crate::data::{AttributeId, ColumnType};
use crate::encoder::Encoder;
use crate::graph::DecisionGraph;
use crate::node::Incoming;
use crate::operation::{JoinOperation, Operation, SplitOperation};
use crate::utils::Combinations;
use hashbrown::HashSet;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Instant;

pub struct Selector<'a> {
    encoder: &'a Encoder,
    cfg: &'a GraphConfig,
    rng: StdRng,
}

impl<'a> Selector<'a> {
    pub fn new(encoder: &'a Encoder, cfg: &'a GraphConfig) -> Self {
        Selector {
            encoder,
            cfg,
            rng: StdRng::seed_from_u64(cfg.seed),
        }
    }

    /// Best split over every leaf that still has something to separate.
    pub fn best_split(&mut self, graph: &mut DecisionGraph) -> SplitOperation {
        let mut best = SplitOperation::none(graph.root);
        for idx in graph.leaves.clone() {
            let node = graph.node(idx);
            if node.is_empty() || node.is_pure() {
                continue;
            }
            let split = match node.best_split.clone() {
                Some(split) => split,
                None => self.best_split_for_node(graph, idx),
            };
            if split.savings > best.savings {
                best = split;
            }
        }
        best
    }

    /// Try every remaining attribute of leaf `idx` and remember the best split on the node.
    pub fn best_split_for_node(&mut self, graph: &mut DecisionGraph, idx: usize) -> SplitOperation {
        let encoder = self.encoder;
        let current = encoder.local_length(graph, idx);
        let attributes: Vec<AttributeId> = graph.node(idx).remaining_attributes().iter().copied().collect();
        let mut best = SplitOperation::none(idx);
        for attr in attributes {
            let mut split = match self.candidate_split(graph, idx, attr) {
                Some(split) => split,
                None => continue,
            };
            let length = graph.trial(&mut split, |g| encoder.local_length(g, idx));
            split.savings = current - length;
            if split.savings > 0.0 {
                graph.node_mut(idx).split_savings.insert(attr);
            }
            if split.savings > best.savings {
                best = split;
            }
        }
        debug!("best {} for node {}", best, idx);
        graph.node_mut(idx).best_split = Some(best.clone());
        best
    }

    fn candidate_split(&mut self, graph: &DecisionGraph, idx: usize, attr: AttributeId) -> Option<SplitOperation> {
        let spec = graph.table().spec(attr);
        match spec.column_type {
            ColumnType::Categorical => {
                let node = graph.node(idx);
                (spec.domain.len() >= 2 && node.data.distinct_value_count(attr) >= 2)
                    .then(|| SplitOperation::categorical(idx, attr))
            }
            ColumnType::Numeric => {
                let split = ContinuousSplit::new(&graph.node(idx).data, attr);
                if split.unique_values() < 2 {
                    return None;
                }
                let cut = split.select_best_cut_value(self.encoder, &mut self.rng, self.cfg.max_cut_candidates)?;
                Some(SplitOperation::numeric(idx, attr, cut, split.cut_bits()))
            }
        }
    }

    /// Leaves not reached through a join, grouped by each attribute they split well on.
    pub fn join_candidates(graph: &DecisionGraph) -> BTreeMap<AttributeId, Vec<usize>> {
        let mut candidates: BTreeMap<AttributeId, Vec<usize>> = BTreeMap::new();
        for &idx in &graph.leaves {
            let node = graph.node(idx);
            if matches!(node.incoming, Incoming::Join { .. }) {
                continue;
            }
            let mut attrs: Vec<AttributeId> = node.split_savings.iter().copied().collect();
            attrs.sort_unstable();
            for attr in attrs {
                candidates.entry(attr).or_default().push(idx);
            }
        }
        candidates
    }

    /// Best join of leaves that share a positive-savings attribute.
    pub fn best_join(&mut self, graph: &mut DecisionGraph) -> JoinOperation {
        let mut best = JoinOperation::none();
        let candidates = Self::join_candidates(graph);
        if candidates.values().all(|nodes| nodes.len() <= MIN_JOIN_NODES) {
            return best;
        }
        let start = Instant::now();
        let current = self.encoder.global_length(graph);
        let mut tested: HashSet<Vec<usize>> = HashSet::new();
        for (attr, nodes) in candidates {
            let join = self.test_join_combinations(graph, &nodes, current, &mut tested, start);
            if join.savings > best.savings {
                best = join;
            }
            if self.timed_out(start) {
                warn!(
                    "Reached join search timeout after {} seconds at attribute {}, using the best join found so far.",
                    start.elapsed().as_secs_f32(),
                    attr
                );
                break;
            }
        }
        best
    }

    fn timed_out(&self, start: Instant) -> bool {
        match self.cfg.join_search_timeout {
            Some(t) => start.elapsed().as_secs_f32() >= t,
            None => false,
        }
    }

    fn test_join_combinations(
        &mut self,
        graph: &mut DecisionGraph,
        nodes: &[usize],
        current: f64,
        tested: &mut HashSet<Vec<usize>>,
        start: Instant,
    ) -> JoinOperation {
        let encoder = self.encoder;
        let mut best = JoinOperation::none();
        let n = nodes.len().min(self.cfg.max_join_nodes);
        for k in MIN_JOIN_NODES..n {
            for combination in Combinations::new(n, k) {
                let members: Vec<usize> = combination.iter().map(|&i| nodes[i]).collect();
                let mut key = members.clone();
                key.sort_unstable();
                if !tested.insert(key) || !can_form_join(graph, &members) {
                    continue;
                }
                let mut join = JoinOperation::new(members);
                let length = graph.trial(&mut join, |g| encoder.global_length(g));
                join.savings = current - length;
                if join.savings > best.savings {
                    best = join;
                }
                if self.timed_out(start) {
                    return best;
                }
            }
        }
        best
    }

    /// The edit to apply next. Ties go to the split.
    pub fn best_operation(&mut self, graph: &mut DecisionGraph) -> Operation {
        let split = self.best_split(graph);
        if !self.cfg.allow_joins {
            return Operation::Split(split);
        }
        let join = self.best_join(graph);
        if self.cfg.prefer_joins {
            if join.savings > 0.0 {
                Operation::Join(join)
            } else {
                Operation::Split(split)
            }
        } else if split.savings < join.savings {
            Operation::Join(join)
        } else {
            Operation::Split(split)
        }
    }
}

/// Joining all children of a single parent only rebuilds that parent.
pub fn can_form_join(graph: &DecisionGraph, nodes: &[usize]) -> bool {
    if nodes.len() < MIN_JOIN_NODES {
        return false;
    }
    let first = graph.node(nodes[0]).branch_parent();
    let shared = nodes.iter().all(|&n| graph.node(n).branch_parent() == first);
    match (shared, first) {
        (true, Some(parent)) => !graph.node(parent).children.iter().all(|c| nodes.contains(c)),
        _ => true,
    }
}
