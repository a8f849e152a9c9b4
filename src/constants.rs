pub const DEFAULT_ALPHA: f64 = 0.5;
pub const MAX_CUT_CANDIDATES: usize = 500;
pub const MAX_JOIN_NODES: usize = usize::MAX;
pub const MIN_JOIN_NODES: usize = 2;
pub const LENGTH_TOLERANCE: f64 = 1e-6;
