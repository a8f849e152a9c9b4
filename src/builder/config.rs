//! Builder Configuration
//!
//! Configuration of the graph induction search, with json IO.
use crate::constants::{DEFAULT_ALPHA, MAX_CUT_CANDIDATES, MAX_JOIN_NODES, MIN_JOIN_NODES};
use crate::errors::GraphError;
use crate::utils::{validate_float_parameter, validate_min_parameter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_allow_joins() -> bool {
    true
}
fn default_max_join_nodes() -> usize {
    MAX_JOIN_NODES
}
fn default_max_cut_candidates() -> usize {
    MAX_CUT_CANDIDATES
}
fn default_join_search_timeout() -> Option<f32> {
    None
}
fn default_operation_limit() -> Option<usize> {
    None
}
fn default_log_iterations() -> usize {
    0
}

/// Configuration for the `GraphBuilder`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Concentration of the label prior, within [0, 1].
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Whether leaves may be merged by joins.
    #[serde(default = "default_allow_joins")]
    pub allow_joins: bool,
    /// Take any join with positive savings over the best split.
    #[serde(default)]
    pub prefer_joins: bool,
    /// Only the first `max_join_nodes` candidates of an attribute are combined.
    #[serde(default = "default_max_join_nodes")]
    pub max_join_nodes: usize,
    /// Maximum number of thresholds evaluated per numeric attribute and node.
    #[serde(default = "default_max_cut_candidates")]
    pub max_cut_candidates: usize,
    /// Seed for the threshold subsampling.
    #[serde(default)]
    pub seed: u64,
    /// Time limit for the join search of a single round (seconds).
    #[serde(default = "default_join_search_timeout")]
    pub join_search_timeout: Option<f32>,
    /// Hard limit for the number of committed operations.
    #[serde(default = "default_operation_limit")]
    pub operation_limit: Option<usize>,
    /// Logging frequency (every N operations).
    #[serde(default = "default_log_iterations")]
    pub log_iterations: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            alpha: DEFAULT_ALPHA,
            allow_joins: true,
            prefer_joins: false,
            max_join_nodes: MAX_JOIN_NODES,
            max_cut_candidates: MAX_CUT_CANDIDATES,
            seed: 0,
            join_search_timeout: None,
            operation_limit: None,
            log_iterations: 0,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        validate_float_parameter(self.alpha, 0.0, 1.0, "alpha")?;
        validate_min_parameter(self.max_join_nodes, MIN_JOIN_NODES, "max_join_nodes")?;
        validate_min_parameter(self.max_cut_candidates, 1, "max_cut_candidates")?;
        if let Some(t) = self.join_search_timeout {
            validate_float_parameter(t as f64, 0.0, f64::INFINITY, "join_search_timeout")?;
        }
        Ok(())
    }
}

/// IO
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save a config as a json object to a file.
    ///
    /// * `path` - Path to save config.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        fs::write(path, self.json_dump()?).map_err(|e| GraphError::UnableToWrite(e.to_string()))
    }

    /// Dump a config as a json object
    fn json_dump(&self) -> Result<String, GraphError> {
        serde_json::to_string(self).map_err(|e| GraphError::UnableToWrite(e.to_string()))
    }

    /// Load a config from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, GraphError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| GraphError::UnableToRead(e.to_string()))
    }

    /// Load a config from a path to a json config object.
    ///
    /// * `path` - Path to load config from.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let json_str = fs::read_to_string(path).map_err(|e| GraphError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for GraphConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_graph_config_default() {
        let config = GraphConfig::default();
        assert_eq!(config.alpha, 0.5);
        assert!(config.allow_joins);
        assert!(!config.prefer_joins);
        assert_eq!(config.max_join_nodes, usize::MAX);
        assert_eq!(config.max_cut_candidates, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_io_json() {
        let config = GraphConfig {
            alpha: 0.25,
            max_join_nodes: 20,
            ..Default::default()
        };
        let json = config.json_dump().unwrap();
        let config2 = GraphConfig::from_json(&json).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_config_io_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let config = GraphConfig {
            prefer_joins: true,
            seed: 11,
            ..Default::default()
        };
        config.save_config(&file_path).unwrap();
        let config2 = GraphConfig::load_config(&file_path).unwrap();
        assert_eq!(config, config2);
        assert!(GraphConfig::load_config(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = GraphConfig::from_json(r#"{"alpha": 1.0, "allow_joins": false}"#).unwrap();
        assert_eq!(config.alpha, 1.0);
        assert!(!config.allow_joins);
        assert_eq!(config.max_join_nodes, usize::MAX);
        assert_eq!(config.join_search_timeout, None);
    }

    #[test]
    fn test_validate() {
        let config = GraphConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GraphError::InvalidParameter(_, _, _))));
        let config = GraphConfig {
            max_join_nodes: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = GraphConfig {
            join_search_timeout: Some(-1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
