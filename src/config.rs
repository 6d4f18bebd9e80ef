//! Settings shared by the editor and the serializer.
//!
//! Loaded from an optional JSON file; command line flags override it.

use crate::dialect::Dialect;
use crate::edit::ApplyOptions;
use crate::editor::{EditorOptions, TieBreak};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for inserted lines
    pub indent: String,
    pub tie_break: TieBreak,
    /// Relocate drifted modifications on their line when applying
    pub local_recovery: bool,
    /// Forced dialect; detected from the file name when unset
    pub dialect: Option<Dialect>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            tie_break: TieBreak::FirstMatch,
            local_recovery: true,
            dialect: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Editor settings, with `fallback` used when no dialect is configured
    pub fn editor_options(&self, fallback: Dialect) -> EditorOptions {
        EditorOptions {
            indent: self.indent.clone(),
            tie_break: self.tie_break,
            dialect: self.dialect.unwrap_or(fallback),
        }
    }

    pub fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            local_recovery: self.local_recovery,
        }
    }
}
