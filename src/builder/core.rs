use crate::builder::config::GraphConfig;
use crate::data::Dataset;
use crate::encoder::Encoder;
use crate::errors::GraphError;
use crate::graph::DecisionGraph;
use crate::operation::GraphEdit;
use crate::selector::Selector;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Decision graph builder
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphBuilder {
    pub cfg: GraphConfig,
}

impl GraphBuilder {
    /// Decision graph builder
    ///
    /// * `cfg` - Search configuration, validated here.
    pub fn new(cfg: GraphConfig) -> Result<Self, GraphError> {
        cfg.validate()?;
        Ok(GraphBuilder { cfg })
    }

    /// Grow a decision graph on `data`.
    ///
    /// Starting from a single leaf, the edit saving the most bits is committed until no
    /// edit shortens the message any further, or `operation_limit` edits were made.
    ///
    /// * `data` - Training rows; the label column of its table is the target.
    pub fn fit(&self, data: &Dataset) -> Result<DecisionGraph, GraphError> {
        self.cfg.validate()?;
        let start = Instant::now();

        let encoder = Encoder::new(self.cfg.alpha, data.table().n_classes());
        let mut graph = DecisionGraph::new(data.clone());
        graph.message_length = encoder.global_length(&graph);
        let initial_length = graph.message_length;
        if self.cfg.log_iterations > 0 {
            info!(
                "Fitting a decision graph on {0} rows, initial message length: {1:.4} bits.",
                data.n_rows(),
                initial_length
            );
        }

        let mut selector = Selector::new(&encoder, &self.cfg);
        let mut i = 0;
        loop {
            if let Some(limit) = self.cfg.operation_limit {
                if i >= limit {
                    warn!("Reached operation limit before the message length stopped decreasing.");
                    break;
                }
            }

            let mut op = selector.best_operation(&mut graph);
            let savings = op.savings();
            if savings <= 0.0 {
                break;
            }
            graph.commit(&mut op);
            graph.message_length -= savings;
            i += 1;

            debug!("operation {}: {}, message length: {}", i, op, graph.message_length);
            if self.cfg.log_iterations > 0 && i % self.cfg.log_iterations == 0 {
                info!(
                    "operation {:0?}, graph.nodes: {:1?}, graph.leaves: {:2?}, message length: {:3?}",
                    i,
                    graph.len(),
                    graph.n_leaves(),
                    graph.message_length,
                );
            }
        }

        if self.cfg.log_iterations > 0 {
            info!(
                "Finished fitting a decision graph with {0} operations in {1} seconds, message length {2:.4} -> {3:.4} bits.",
                graph.history.len(),
                start.elapsed().as_secs(),
                initial_length,
                graph.message_length
            );
        }
        Ok(graph)
    }
}
