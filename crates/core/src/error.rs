//! Error types shared by the retention crates

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by an external collaborator (tag store, file store, ...)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested item does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Target path is already occupied
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Caller lacks the permission for this operation
    #[error("not permitted: {0}")]
    NotPermitted(String),

    /// Path exists but is not a folder
    #[error("{} exists but is not a folder", .0.display())]
    NotAContainer(PathBuf),

    /// Any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True when the error means "someone else already put something there"
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Invalid retention rule data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("tag identifier '{0}' is malformed")]
    MalformedTag(String),

    #[error("unknown time unit code {0}")]
    UnknownTimeUnit(i64),

    #[error("unknown time basis code {0}")]
    UnknownTimeBasis(i64),

    #[error("unknown action type code {0}")]
    UnknownActionType(i64),

    #[error("time amount must be a positive integer, got {0}")]
    InvalidAmount(i64),

    #[error("move_to_path is required when the action is move to path")]
    MissingDestination,

    #[error("destination '{0}' contains a '.' or '..' segment")]
    InvalidDestination(String),
}

/// Settings could not be loaded or are out of range
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("could not determine the configuration directory")]
    NoConfigDir,
}
