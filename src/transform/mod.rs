//! Build-time hooks the host bundler calls while it loads the overlaid application.
//!
//! The host bundler is an adapter: it forwards the HTML entry to
//! [`TransformRegistry::transform_document`] and every module it loads to
//! [`TransformRegistry::transform_file`]. Nothing in here depends on a concrete bundler, so
//! every hook can be exercised directly.

mod html;
mod jsx;
mod loaders;

use std::path::Path;

use crate::config::OverlayConfig;
use crate::error::Result;

pub use html::{HtmlInjection, MAX_STRIP_PASSES, strip_html_comments};
pub use jsx::{JsxCoercion, PLAIN_SCRIPT_EXTENSIONS};
pub use loaders::{GRAPHQL_EXTENSIONS, YAML_EXTENSIONS, has_extension, raw_text_module, yaml_module};

/// Ordering of document transforms relative to the bundler's own HTML processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransformPhase {
  /// Runs before the bundler processes the document.
  Pre,
  /// Runs after the bundler processes the document.
  Post,
}

/// Rewrites the HTML entry document.
pub trait DocumentTransform: Send + Sync {
  /// Return the rewritten document.
  fn transform_document(&self, html: &str) -> Result<String>;
}

type FilePredicate = Box<dyn Fn(&Path) -> bool + Send + Sync>;
type FileTransformFn = Box<dyn Fn(&str, &Path) -> Result<String> + Send + Sync>;

/// Ordered collection of document and file hooks.
#[derive(Default)]
pub struct TransformRegistry {
  documents: Vec<(TransformPhase, Box<dyn DocumentTransform>)>,
  files: Vec<(FilePredicate, FileTransformFn)>,
}

impl TransformRegistry {
  /// Empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry carrying the overlay's own hooks: HTML injection (pre phase), JSX coercion,
  /// and the YAML and raw-text loaders.
  pub fn with_defaults(config: &OverlayConfig, project_root: &Path) -> Self {
    let mut registry = Self::new();
    registry.register_document_transform(TransformPhase::Pre, HtmlInjection::from_config(config));

    let jsx = JsxCoercion::from_config(config, project_root);
    let predicate = jsx.clone();
    registry.register_file_transform(
      move |path| predicate.matches(path),
      move |code, path| jsx.transpile(code, path),
    );
    registry.register_file_transform(
      |path| has_extension(path, YAML_EXTENSIONS),
      yaml_module,
    );
    registry.register_file_transform(
      |path| has_extension(path, GRAPHQL_EXTENSIONS),
      |code, _path| raw_text_module(code),
    );
    registry
  }

  /// Add a document transform. Within a phase, registration order is kept.
  pub fn register_document_transform<T>(&mut self, phase: TransformPhase, transform: T) -> &mut Self
  where
    T: DocumentTransform + 'static,
  {
    let index = self
      .documents
      .iter()
      .position(|(existing, _)| *existing > phase)
      .unwrap_or(self.documents.len());
    self.documents.insert(index, (phase, Box::new(transform)));
    self
  }

  /// Add a file transform applied to paths accepted by `predicate`.
  pub fn register_file_transform<P, F>(&mut self, predicate: P, transform: F) -> &mut Self
  where
    P: Fn(&Path) -> bool + Send + Sync + 'static,
    F: Fn(&str, &Path) -> Result<String> + Send + Sync + 'static,
  {
    self.files.push((Box::new(predicate), Box::new(transform)));
    self
  }

  /// Run every document transform in phase order.
  pub fn transform_document(&self, html: &str) -> Result<String> {
    let mut current = html.to_string();
    for (_, transform) in &self.documents {
      current = transform.transform_document(&current)?;
    }
    Ok(current)
  }

  /// Run the first file transform whose predicate accepts `path`.
  ///
  /// `None` means no hook claimed the file and the bundler keeps the original code.
  pub fn transform_file(&self, code: &str, path: &Path) -> Result<Option<String>> {
    match self.files.iter().find(|(predicate, _)| predicate(path)) {
      Some((_, transform)) => transform(code, path).map(Some),
      None => Ok(None),
    }
  }
}

impl std::fmt::Debug for TransformRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TransformRegistry")
      .field("documents", &self.documents.len())
      .field("files", &self.files.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Append(&'static str);

  impl DocumentTransform for Append {
    fn transform_document(&self, html: &str) -> Result<String> {
      Ok(format!("{html}{}", self.0))
    }
  }

  #[test]
  fn document_transforms_run_in_phase_order() {
    let mut registry = TransformRegistry::new();
    registry
      .register_document_transform(TransformPhase::Post, Append("[post-1]"))
      .register_document_transform(TransformPhase::Pre, Append("[pre-1]"))
      .register_document_transform(TransformPhase::Post, Append("[post-2]"))
      .register_document_transform(TransformPhase::Pre, Append("[pre-2]"));

    let output = registry.transform_document("doc").unwrap();
    assert_eq!(output, "doc[pre-1][pre-2][post-1][post-2]");
  }

  #[test]
  fn unmatched_files_pass_through() {
    let mut registry = TransformRegistry::new();
    registry.register_file_transform(
      |path| path.extension().is_some_and(|ext| ext == "txt"),
      |code, _| Ok(code.to_uppercase()),
    );

    assert_eq!(
      registry.transform_file("abc", Path::new("/a/b.txt")).unwrap(),
      Some("ABC".to_string())
    );
    assert_eq!(registry.transform_file("abc", Path::new("/a/b.css")).unwrap(), None);
  }

  #[test]
  fn relative_root_registry_transforms_scripts_under_it() {
    let registry = TransformRegistry::with_defaults(&OverlayConfig::default(), Path::new("."));
    let path = std::env::current_dir().unwrap().join("src/overrides/config.js");

    let output = registry
      .transform_file("export const view = () => <b>hi</b>;\n", &path)
      .unwrap()
      .expect("script under the relative root should be transformed");
    assert!(output.contains("react/jsx-runtime"), "{output}");
  }

  #[test]
  fn defaults_cover_documents_and_loaders() {
    let registry = TransformRegistry::with_defaults(&OverlayConfig::default(), Path::new("/project"));

    let html = registry
      .transform_document(r#"<body><!-- shell --><div id="main"></div></body>"#)
      .unwrap();
    assert_eq!(
      html,
      r#"<body><div id="main"></div><script type="module" src="/src/main.jsx"></script></body>"#
    );

    let yaml = registry
      .transform_file("title: Acme\n", Path::new("/project/src/overrides/config.yaml"))
      .unwrap();
    assert_eq!(yaml.as_deref(), Some("export default {\"title\":\"Acme\"};\n"));

    let graphql = registry
      .transform_file("query { me { id } }", Path::new("/project/src/overrides/me.graphql"))
      .unwrap();
    assert_eq!(
      graphql.as_deref(),
      Some("export default \"query { me { id } }\";\n")
    );

    assert_eq!(
      registry
        .transform_file("body {}", Path::new("/project/src/overrides/override.css"))
        .unwrap(),
      None
    );
  }
}
