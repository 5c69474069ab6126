use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{OverlayError, Result};

/// Build-scoped directory that receives every resolved override.
#[derive(Debug, Clone)]
pub struct StagingArea {
  root: PathBuf,
}

impl StagingArea {
  /// Wrap a staging directory. Nothing touches the disk until [`StagingArea::clear`].
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Staging root.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Remove everything under the root, leaving an empty directory behind.
  pub fn clear(&self) -> Result<()> {
    match fs::remove_dir_all(&self.root) {
      Ok(()) => {}
      Err(err) if err.kind() == ErrorKind::NotFound => {}
      Err(err) => return Err(OverlayError::io(&self.root, err)),
    }
    fs::create_dir_all(&self.root).map_err(|err| OverlayError::io(&self.root, err))?;
    tracing::debug!(root = %self.root.display(), "cleared staging area");
    Ok(())
  }

  /// Returns `true` when the root exists and holds no entries.
  pub fn is_empty(&self) -> Result<bool> {
    let mut entries = fs::read_dir(&self.root).map_err(|err| OverlayError::io(&self.root, err))?;
    Ok(entries.next().is_none())
  }
}
