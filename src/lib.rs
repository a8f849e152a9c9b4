// Modules
pub mod builder;
pub mod constants;
pub mod continuous;
pub mod data;
pub mod encoder;
pub mod errors;
pub mod graph;
pub mod ledger;
pub mod node;
pub mod operation;
pub mod selector;
pub mod utils;

// Individual classes, and functions
pub use builder::config::{ConfigIO, GraphConfig};
pub use builder::core::GraphBuilder;
pub use data::{Column, ColumnSpec, Dataset, Table, Value};
pub use graph::DecisionGraph;
