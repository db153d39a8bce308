//! Error types for schema compatibility checking

use thiserror::Error;

use crate::merge::{MergeError, MergeErrorKind};
use crate::path::Path;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema compatibility errors
///
/// Incompatibilities between two trees are never reported through this type;
/// they are [`Finding`](crate::compatibility::Finding)s. Everything here aborts
/// the invocation before a verdict is produced.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Conflicting declarations at {path}")]
    MergeConflict { path: Path },

    #[error("Incompatible node shapes at {path}")]
    ShapeConflict { path: Path },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Schema path not found: {path}")]
    PathNotFound { path: Path },

    #[error("Excluded marker is only allowed in override trees (found at {path})")]
    ExcludedOutsideOverride { path: Path },

    #[error("Override entries matched no finding: {}", format_paths(.paths))]
    StaleOverrides { paths: Vec<Path> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl From<MergeError> for SchemaError {
    fn from(err: MergeError) -> Self {
        match err.kind {
            MergeErrorKind::Conflict => SchemaError::MergeConflict { path: err.path },
            MergeErrorKind::ShapeConflict => SchemaError::ShapeConflict { path: err.path },
        }
    }
}

impl SchemaError {
    /// Whether this error came out of fragment merging
    pub fn is_merge_error(&self) -> bool {
        matches!(
            self,
            SchemaError::MergeConflict { .. } | SchemaError::ShapeConflict { .. }
        )
    }
}

fn format_paths(paths: &[Path]) -> String {
    paths
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
