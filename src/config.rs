use crate::expectimax::{DepthPolicy, LeafEvaluation};
use crate::weights::WeightVector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Everything needed to build an [`crate::expectimax::Expectimax`].
///
/// Missing JSON fields take their defaults, so `{}` is a valid config.
///
/// ```
/// use expectimax_2048::config::EngineConfig;
/// let cfg = EngineConfig::from_json_str(r#"{ "depth": { "default_depth": 3 } }"#).unwrap();
/// assert_eq!(cfg.depth.default_depth, 3);
/// assert_eq!(cfg.depth.critical_depth, 9);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: WeightVector,
    pub depth: DepthPolicy,
    pub leaf: LeafEvaluation,
    /// Log feature values of every leaf evaluation.
    pub verbose: bool,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        EngineConfig::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
