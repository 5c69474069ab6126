//! Loaders that turn staged non-script overrides into importable modules.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{OverlayError, Result};

/// Extensions handled by [`yaml_module`].
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];
/// Extensions handled by [`raw_text_module`].
pub const GRAPHQL_EXTENSIONS: &[&str] = &["graphql", "gql"];

/// Convert a YAML document into a module whose default export is the parsed value.
pub fn yaml_module(source: &str, path: &Path) -> Result<String> {
  let value: Value = serde_yaml::from_str(source).map_err(|source| OverlayError::Yaml {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(format!("export default {};\n", serde_json::to_string(&value)?))
}

/// Convert text into a module whose default export is the text itself.
pub fn raw_text_module(source: &str) -> Result<String> {
  Ok(format!("export default {};\n", serde_json::to_string(source)?))
}

/// Whether `path` ends in one of `extensions`, ignoring any `?query` suffix.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
  strip_query(path)
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| extensions.contains(&ext))
}

/// Drop a bundler `?query` suffix from a module id.
///
/// Only the final component is inspected. A path that exists as given, or whose file name is
/// not UTF-8, is returned untouched.
pub(crate) fn strip_query(path: &Path) -> PathBuf {
  if path.exists() {
    return path.to_path_buf();
  }
  let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
    return path.to_path_buf();
  };
  match name.split_once('?') {
    Some((file, _)) if !file.is_empty() => path.with_file_name(file),
    _ => path.to_path_buf(),
  }
}
