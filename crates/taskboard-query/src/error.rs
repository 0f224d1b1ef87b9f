//! Error types for the query crate.
//!
//! Query stages themselves are total. These errors only arise at the edges:
//! parsing user-supplied directives and loading configuration files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing query inputs or loading configuration.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Sort order text was neither `asc` nor `desc`.
    #[error("invalid sort order '{0}': expected 'asc' or 'desc'")]
    InvalidSortOrder(String),

    /// Filter expression was not of the form `key=value`.
    #[error("invalid filter '{0}': expected key=value")]
    InvalidFilter(String),

    /// Config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config was not valid JSON for the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config was not valid YAML for the expected shape.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File extension is not one of `json`, `yaml`, `yml`.
    #[error("unsupported file format '{0}': expected .json, .yaml or .yml")]
    UnsupportedFormat(String),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
