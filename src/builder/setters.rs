use crate::GraphBuilder;

impl GraphBuilder {
    // Set methods for parameters

    /// Set the alpha on the builder.
    /// * `alpha` - Concentration of the label prior, within [0, 1]. Smaller values
    ///   make pure leaves cheaper to describe.
    pub fn set_alpha(mut self, alpha: f64) -> Self {
        self.cfg.alpha = alpha;
        self
    }

    /// Set allow_joins on the builder.
    /// * `allow_joins` - Whether leaves may be merged into a shared child.
    pub fn set_allow_joins(mut self, allow_joins: bool) -> Self {
        self.cfg.allow_joins = allow_joins;
        self
    }

    /// Set prefer_joins on the builder.
    /// * `prefer_joins` - Take any join with positive savings, even when a split saves more.
    pub fn set_prefer_joins(mut self, prefer_joins: bool) -> Self {
        self.cfg.prefer_joins = prefer_joins;
        self
    }

    /// Set the maximum number of join candidates per attribute.
    /// * `max_join_nodes` - Cap on the candidates combined for one attribute.
    pub fn set_max_join_nodes(mut self, max_join_nodes: usize) -> Self {
        self.cfg.max_join_nodes = max_join_nodes;
        self
    }

    /// Set the maximum number of evaluated thresholds.
    /// * `max_cut_candidates` - Thresholds evaluated per numeric attribute and node.
    pub fn set_max_cut_candidates(mut self, max_cut_candidates: usize) -> Self {
        self.cfg.max_cut_candidates = max_cut_candidates;
        self
    }

    /// Set the seed on the builder.
    /// * `seed` - Integer value used to seed the threshold subsampling.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.cfg.seed = seed;
        self
    }

    /// Set the join search timeout on the builder.
    /// * `join_search_timeout` - Seconds the join search may take per round.
    pub fn set_join_search_timeout(mut self, join_search_timeout: Option<f32>) -> Self {
        self.cfg.join_search_timeout = join_search_timeout;
        self
    }

    /// Set the operation limit on the builder.
    /// * `operation_limit` - Maximum number of committed operations.
    pub fn set_operation_limit(mut self, operation_limit: Option<usize>) -> Self {
        self.cfg.operation_limit = operation_limit;
        self
    }

    /// Set log iterations on the builder.
    /// * `log_iterations` - The number of operations between progress logs.
    pub fn set_log_iterations(mut self, log_iterations: usize) -> Self {
        self.cfg.log_iterations = log_iterations;
        self
    }
}
