//! Error types shared by the overlay pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::SlotId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Failures that abort an overlay build.
#[derive(Debug, Error)]
pub enum OverlayError {
  /// A filesystem operation on a single path failed.
  #[error("failed to access {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },

  /// Copying an override into the staging area failed.
  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    /// Resolved override source.
    from: PathBuf,
    /// Destination inside the staging area.
    to: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },

  /// A name-preserving slot was pointed at a path with no final segment.
  #[error("override for the {slot} slot has no file name: {}", path.display())]
  UnnamedSource {
    /// Slot being resolved.
    slot: SlotId,
    /// Offending source path.
    path: PathBuf,
  },

  /// A script file matched by the JSX coercion could not be transpiled.
  #[error("failed to transpile {} as JSX: {message}", path.display())]
  Parse {
    /// File being transformed.
    path: PathBuf,
    /// Diagnostic text including the location.
    message: String,
  },

  /// A YAML override could not be turned into a module.
  #[error("failed to parse YAML in {}: {source}", path.display())]
  Yaml {
    /// File being loaded.
    path: PathBuf,
    /// Source parse error.
    source: serde_yaml::Error,
  },

  /// Serialising a generated module or report failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// The filesystem watcher could not be created or attached.
  #[error("file watcher failed: {0}")]
  Watch(#[from] notify::Error),
}

impl OverlayError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
