//! Per-view search configuration.
//!
//! A view supplies its configuration once, when it is constructed. It can be
//! built in code or loaded from a JSON or YAML file:
//!
//! ```yaml
//! searchFields: [title, description]
//! dateFields: [dueDate, created, updated, completedAt]
//! defaultSort:
//!   field: priority
//!   order: desc
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::ordering::SortDirective;

/// Fields sorted as dates unless a config says otherwise.
pub const DEFAULT_DATE_FIELDS: &[&str] = &["dueDate", "created", "updated"];

/// Which fields a view searches, which it treats as dates, and how it sorts
/// initially.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Fields scanned for free-text matches, in order.
    pub search_fields: Vec<String>,
    /// Fields normalized as timestamps when sorting.
    pub date_fields: Vec<String>,
    /// Sort directive a fresh view starts with.
    pub default_sort: SortDirective,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            search_fields: Vec::new(),
            date_fields: DEFAULT_DATE_FIELDS.iter().map(|f| f.to_string()).collect(),
            default_sort: SortDirective::default(),
        }
    }
}

impl SearchConfig {
    /// Creates a config searching the given fields, with default date fields
    /// and sort.
    pub fn new<I, S>(search_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SearchConfig {
            search_fields: search_fields.into_iter().map(Into::into).collect(),
            ..SearchConfig::default()
        }
    }

    /// Replaces the date fields.
    pub fn with_date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the initial sort directive.
    pub fn with_default_sort(mut self, directive: SortDirective) -> Self {
        self.default_sort = directive;
        self
    }

    /// Parses a config from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::trace!(path = %path.display(), "loading search config");
        let text = read_to_string(path)?;
        match Format::of(path)? {
            Format::Json => SearchConfig::from_json_str(&text),
            Format::Yaml => SearchConfig::from_yaml_str(&text),
        }
    }
}

/// Data file formats accepted for configs and item collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from a file extension.
    pub fn of(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(QueryError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads a file, attaching the path to any I/O error.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| QueryError::Io {
        path: path.to_path_buf(),
        source,
    })
}
