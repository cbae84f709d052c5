//! Error taxonomy for tree building and structural mutations

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by tree construction and mutation operations.
///
/// A failed mutation never leaves partial state behind: every validation runs
/// before the single filesystem call, and in-memory patches happen only after
/// that call succeeds.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Enumeration or file I/O denied or failed
    #[error("cannot access {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target path already exists
    #[error("an entry already exists at {path}")]
    NameCollision { path: PathBuf },

    /// Self-move or move into one's own descendant
    #[error("invalid move from {source_path} to {dest_path}: {reason}")]
    InvalidMove {
        source_path: PathBuf,
        dest_path: PathBuf,
        reason: &'static str,
    },

    /// An operation requiring a folder target was given a file
    #[error("{path} is not a folder")]
    NotAFolder { path: PathBuf },

    /// The path is not represented in the tree
    #[error("no tree entry at {path}")]
    NotFound { path: PathBuf },
}

impl TreeError {
    /// Stable machine-readable code for the unified result model
    pub fn code(&self) -> &'static str {
        match self {
            TreeError::Access { .. } => "ACCESS",
            TreeError::NameCollision { .. } => "NAME_COLLISION",
            TreeError::InvalidMove { .. } => "INVALID_MOVE",
            TreeError::NotAFolder { .. } => "NOT_A_FOLDER",
            TreeError::NotFound { .. } => "NOT_FOUND",
        }
    }

    pub(crate) fn access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TreeError::Access {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;
