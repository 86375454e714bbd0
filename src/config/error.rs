//! Error types for configuration resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for configuration resolution.
///
/// All variants are fatal: a failed merge never yields a partial config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing or unreadable config file (leaf or BASE entry)
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML document
    #[error("Malformed YAML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Well-formed YAML whose keys or value types do not match the schema
    #[error("Config file {} does not match the schema: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// BASE entries form a cycle
    #[error("Circular BASE reference involving {}", path.display())]
    CircularBase { path: PathBuf },

    /// Merged values fail semantic validation
    #[error("Invalid configuration: {0}")]
    Invalid(anyhow::Error),
}
