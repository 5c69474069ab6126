//! Forces plain-extension scripts from the application tree through the JSX transpiler.

use std::path::{Path, PathBuf};

use deno_ast::{
  EmitOptions, MediaType, ModuleSpecifier, ParseParams, SourceMapOption, TranspileModuleOptions,
  TranspileOptions,
};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::paths::absolute_path;
use crate::transform::loaders::strip_query;

/// Extensions treated as plain script, i.e. not already JSX-flavoured.
pub const PLAIN_SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs"];

/// Transpiles plain scripts under a fixed set of roots as JSX with the automatic runtime.
#[derive(Debug, Clone)]
pub struct JsxCoercion {
  roots: Vec<PathBuf>,
  import_source: String,
}

impl JsxCoercion {
  /// Coerce scripts under any of `roots`, importing the runtime from `import_source`.
  ///
  /// Relative roots are anchored at the current directory.
  pub fn new(roots: impl IntoIterator<Item = PathBuf>, import_source: impl Into<String>) -> Self {
    Self {
      roots: roots.into_iter().map(|root| absolute_path(&root)).collect(),
      import_source: import_source.into(),
    }
  }

  /// Coercion scoped to the application source tree and the staging area.
  pub fn from_config(config: &OverlayConfig, project_root: &Path) -> Self {
    Self::new(
      [
        config.app_src_path(project_root),
        config.staging_path(project_root),
      ],
      config.jsx_import_source.clone(),
    )
  }

  /// Whether `path` lives under one of the roots and carries a plain script extension.
  ///
  /// Bundler module ids may carry a `?query` suffix, which is ignored. Relative ids are
  /// anchored at the current directory and `..` is folded before comparing.
  pub fn matches(&self, path: &Path) -> bool {
    let path = absolute_path(&strip_query(path));
    let plain_script = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| PLAIN_SCRIPT_EXTENSIONS.contains(&ext));

    plain_script && self.roots.iter().any(|root| path.starts_with(root))
  }

  /// Transpile matching files; `None` leaves the file to the bundler untouched.
  pub fn transform(&self, code: &str, path: &Path) -> Result<Option<String>> {
    if !self.matches(path) {
      return Ok(None);
    }
    self.transpile(code, path).map(Some)
  }

  /// Transpile `code` as JSX regardless of where it lives.
  pub fn transpile(&self, code: &str, path: &Path) -> Result<String> {
    let path = strip_query(path);
    let specifier = ModuleSpecifier::from_file_path(&path)
      .or_else(|()| ModuleSpecifier::parse("file:///module.jsx"))
      .map_err(|err| parse_error(&path, err))?;

    let parsed = deno_ast::parse_module(ParseParams {
      specifier,
      text: code.into(),
      media_type: MediaType::Jsx,
      capture_tokens: false,
      scope_analysis: false,
      maybe_syntax: None,
    })
    .map_err(|diagnostic| parse_error(&path, diagnostic))?;

    let transpile_options = TranspileOptions {
      jsx_automatic: true,
      jsx_import_source: Some(self.import_source.clone()),
      transform_jsx: true,
      ..Default::default()
    };
    let emit_options = EmitOptions {
      source_map: SourceMapOption::None,
      ..Default::default()
    };

    let emitted = parsed
      .transpile(
        &transpile_options,
        &TranspileModuleOptions::default(),
        &emit_options,
      )
      .map_err(|err| parse_error(&path, err))?
      .into_source();

    tracing::trace!(path = %path.display(), "coerced script through JSX");
    Ok(emitted.text)
  }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> OverlayError {
  OverlayError::Parse {
    path: path.to_path_buf(),
    message: err.to_string(),
  }
}
