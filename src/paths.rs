//! Lexical path helpers shared by the resolver, the builder and the file hooks.

use std::path::{Component, Path, PathBuf};

/// Anchor `path` at the current directory when relative, then fold away `.` and `..`.
///
/// Purely lexical: nothing is read from disk and symlinks are left alone, so the result
/// compares component-wise against bundler module ids.
pub fn absolute_path(path: &Path) -> PathBuf {
  let anchored = if path.is_absolute() {
    path.to_path_buf()
  } else {
    match std::env::current_dir() {
      Ok(cwd) => cwd.join(path),
      Err(err) => {
        tracing::warn!(path = %path.display(), error = %err, "current directory unavailable");
        path.to_path_buf()
      }
    }
  };
  normalize_path(&anchored)
}

/// Fold `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let popped = matches!(
          normalized.components().next_back(),
          Some(Component::Normal(_))
        ) && normalized.pop();
        if !popped && !normalized.has_root() {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}
