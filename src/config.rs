use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for projection and paging, loadable from TOML.
///
/// ```toml
/// max_depth = 5
/// max_record_depth = 3
/// default_page_size = 50
/// max_page_size = 500
/// include_non_public = false
/// denied_attributes = ["sharedMesh"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Maximum nesting depth of projected values below a component.
    pub max_depth: usize,
    /// Nested records allowed beyond the first record entry.
    pub max_record_depth: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Report serialized non-public attributes by default.
    pub include_non_public: bool,
    /// Attribute names skipped on every type, in addition to the built-in
    /// denylist.
    pub denied_attributes: Vec<String>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_record_depth: 3,
            default_page_size: 50,
            max_page_size: 500,
            include_non_public: false,
            denied_attributes: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ProjectionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ProjectionConfig::from_toml_str("max_depth = 2\n").unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.max_record_depth, 3);
        assert_eq!(config.max_page_size, 500);
    }

    #[test]
    fn denied_attributes_parse() {
        let config =
            ProjectionConfig::from_toml_str("denied_attributes = [\"sharedMesh\", \"mesh\"]")
                .unwrap();
        assert_eq!(config.denied_attributes, vec!["sharedMesh", "mesh"]);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = ProjectionConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ProjectionConfig::load(Path::new("/nonexistent/scenewire.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
