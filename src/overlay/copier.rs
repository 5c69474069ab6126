use std::fs;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use walkdir::WalkDir;

use crate::error::{OverlayError, Result};
use crate::models::{ResolvedOverride, Resolution};

/// Copies resolved overrides into the staging area.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayCopier;

impl OverlayCopier {
  /// Copy one slot's override. `Absent` slots are a no-op.
  pub fn apply_resolution(&self, resolution: &Resolution) -> Result<()> {
    match resolution {
      Resolution::Resolved(resolved) => self.apply(resolved),
      Resolution::Absent => Ok(()),
    }
  }

  /// Copy a resolved override, overwriting anything already at the destination.
  pub fn apply(&self, resolved: &ResolvedOverride) -> Result<()> {
    if resolved.is_directory {
      copy_tree(&resolved.source, &resolved.destination)?;
    } else {
      copy_file(&resolved.source, &resolved.destination)?;
    }

    tracing::info!(
      slot = %resolved.slot,
      source = %resolved.source.display(),
      destination = %resolved.destination.display(),
      "staged override"
    );
    Ok(())
  }
}

fn copy_file(source: &Path, destination: &Path) -> Result<()> {
  let copy_err = |err: std::io::Error| OverlayError::Copy {
    from: source.to_path_buf(),
    to: destination.to_path_buf(),
    source: err,
  };

  if !source.is_file() {
    return Err(copy_err(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      "override source is not a readable file",
    )));
  }

  if destination.exists() && is_same_file(source, destination).map_err(copy_err)? {
    return Ok(());
  }

  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent).map_err(|err| OverlayError::io(parent, err))?;
  }

  fs::copy(source, destination).map_err(copy_err)?;
  Ok(())
}

fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
  if !source.is_dir() {
    return Err(OverlayError::Copy {
      from: source.to_path_buf(),
      to: destination.to_path_buf(),
      source: std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "override source is not a directory",
      ),
    });
  }

  fs::create_dir_all(destination).map_err(|err| OverlayError::io(destination, err))?;

  for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|err| {
      let path = err.path().unwrap_or(source).to_path_buf();
      OverlayError::io(path, err.into())
    })?;
    let Ok(relative) = entry.path().strip_prefix(source) else {
      continue;
    };
    let target = destination.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(|err| OverlayError::io(&target, err))?;
    } else {
      copy_file(entry.path(), &target)?;
    }
  }

  Ok(())
}

/// Top-level entries of `dir` whose names are claimed by fixed-name slots.
///
/// A folder-form JS configuration is mirrored into the staging root, so any of these would
/// overwrite (or be overwritten by) another slot's staged file.
pub fn find_fixed_name_collisions(dir: &Path, fixed_names: &[&str]) -> Result<Vec<PathBuf>> {
  let mut collisions = Vec::new();
  for entry in fs::read_dir(dir).map_err(|err| OverlayError::io(dir, err))? {
    let entry = entry.map_err(|err| OverlayError::io(dir, err))?;
    let name = entry.file_name();
    if fixed_names.iter().any(|fixed| name.as_os_str() == *fixed) {
      collisions.push(entry.path());
    }
  }
  collisions.sort();
  Ok(collisions)
}
