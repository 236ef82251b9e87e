//! Engine configuration
//!
//! All sections have defaults, so an empty YAML document is a valid config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration of a graph engine instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub traversal: TraversalConfig,
    pub snapshot: SnapshotConfig,
}

/// Variable-length traversal tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Frontier rows at which a composition step runs on the rayon pool
    pub parallel_threshold: usize,
    /// Input records gathered into one starting relation
    pub batch_size: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 4096,
            batch_size: 1024,
        }
    }
}

/// Snapshot encoding options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Gzip the snapshot body
    pub compress: bool,
    /// 0-9
    pub compression_level: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            compress: false,
            compression_level: 6,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        // serde_yaml rejects an empty document, treat it as all defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.traversal.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "traversal.batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.snapshot.compression_level > 9 {
            return Err(ConfigError::Invalid {
                field: "snapshot.compression_level",
                reason: format!("{} is above 9", self.snapshot.compression_level),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.traversal.batch_size, 1024);
        assert!(!config.snapshot.compress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = EngineConfig::from_yaml_str("snapshot:\n  compress: true\n").unwrap();
        assert!(config.snapshot.compress);
        assert_eq!(config.snapshot.compression_level, 6);
        assert_eq!(config.traversal, TraversalConfig::default());

        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_values() {
        let err = EngineConfig::from_yaml_str("traversal:\n  batch_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "traversal.batch_size", .. }));

        let err = EngineConfig::from_yaml_str("snapshot:\n  compression_level: 12\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = EngineConfig::from_yaml_str("traversal: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        let mut config = EngineConfig::default();
        config.traversal.parallel_threshold = 8;
        std::fs::write(&path, config.to_yaml_string().unwrap()).unwrap();

        assert_eq!(EngineConfig::from_yaml_file(&path).unwrap(), config);
    }
}
