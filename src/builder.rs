//! Overlay build orchestrator: clears the staging area and stages every slot.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{OverlayConfig, fixed_staged_names};
use crate::error::Result;
use crate::models::{OverrideSlot, Resolution, ResolvedOverride, SlotId, SlotReport};
use crate::overlay::{
  EnvSource, OverlayCopier, OverlayResolver, StagingArea, find_fixed_name_collisions,
};
use crate::paths::absolute_path;
use crate::transform::TransformRegistry;

/// Everything staged by one build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedOverlay {
  /// Staging root the overrides were copied into.
  pub staging_root: PathBuf,
  /// One line per slot, in staging order.
  pub slots: Vec<SlotReport>,
}

impl StagedOverlay {
  /// Resolved override for `slot`, if it was overridden.
  pub fn resolved(&self, slot: SlotId) -> Option<&ResolvedOverride> {
    self
      .slots
      .iter()
      .find(|report| report.slot == slot)
      .and_then(|report| report.resolved.as_ref())
  }

  /// HTML entry point handed to the bundler: the HTML slot's resolved source.
  pub fn html_entry(&self) -> Option<&Path> {
    self
      .resolved(SlotId::Html)
      .map(|resolved| resolved.source.as_path())
  }

  /// Sources whose changes should re-trigger staging.
  pub fn watch_paths(&self) -> Vec<PathBuf> {
    self
      .slots
      .iter()
      .filter_map(|report| report.resolved.as_ref())
      .map(|resolved| resolved.source.clone())
      .collect()
  }

  /// Serialise the report as prettified JSON.
  pub fn to_json(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

/// High-level helper for staging overrides ahead of a bundler run.
#[derive(Debug, Clone)]
pub struct OverlayBuilder {
  config: OverlayConfig,
  project_root: PathBuf,
  slots: Vec<OverrideSlot>,
  resolver: OverlayResolver,
  staging: StagingArea,
}

impl OverlayBuilder {
  /// Create a builder for a project root and its configuration.
  ///
  /// A relative root is anchored at the current directory.
  pub fn new(config: OverlayConfig, project_root: impl Into<PathBuf>) -> Self {
    let project_root = absolute_path(&project_root.into());
    let staging_root = config.staging_path(&project_root);
    Self {
      slots: config.slots(&project_root),
      resolver: OverlayResolver::new(&staging_root, &project_root),
      staging: StagingArea::new(staging_root),
      config,
      project_root,
    }
  }

  /// Builder using configuration discovered in `project_root`.
  pub fn discover(project_root: impl Into<PathBuf>) -> Self {
    let project_root = project_root.into();
    let config = OverlayConfig::discover(&project_root);
    Self::new(config, project_root)
  }

  /// Configuration in use.
  pub fn config(&self) -> &OverlayConfig {
    &self.config
  }

  /// Staging area written by [`OverlayBuilder::stage`].
  pub fn staging(&self) -> &StagingArea {
    &self.staging
  }

  /// Resolve a single slot without touching the disk.
  pub fn resolve_slot<E: EnvSource + ?Sized>(&self, id: SlotId, env: &E) -> Result<Resolution> {
    match self.slots.iter().find(|slot| slot.id == id) {
      Some(slot) => self.resolver.resolve(slot, env),
      None => Ok(Resolution::Absent),
    }
  }

  /// Clear the staging area, then resolve and copy every slot.
  ///
  /// The first failure aborts the build; the next build starts by clearing again.
  pub fn stage<E: EnvSource + ?Sized>(&self, env: &E) -> Result<StagedOverlay> {
    self.staging.clear()?;

    let copier = OverlayCopier;
    let mut reports = Vec::with_capacity(self.slots.len());
    for slot in &self.slots {
      let resolution = self.resolver.resolve(slot, env)?;
      if let Resolution::Resolved(resolved) = &resolution
        && resolved.is_directory
      {
        warn_on_collisions(resolved)?;
      }
      copier.apply_resolution(&resolution)?;
      reports.push(SlotReport {
        slot: slot.id,
        resolved: resolution.as_resolved().cloned(),
      });
    }

    let staged = StagedOverlay {
      staging_root: self.staging.root().to_path_buf(),
      slots: reports,
    };
    tracing::info!(
      staging = %staged.staging_root.display(),
      overridden = staged.watch_paths().len(),
      "overlay staged"
    );
    Ok(staged)
  }

  /// Hooks the host bundler should install for this project.
  pub fn transforms(&self) -> TransformRegistry {
    TransformRegistry::with_defaults(&self.config, &self.project_root)
  }
}

fn warn_on_collisions(resolved: &ResolvedOverride) -> Result<()> {
  if !resolved.source.is_dir() {
    return Ok(());
  }
  for collision in find_fixed_name_collisions(&resolved.source, &fixed_staged_names())? {
    tracing::warn!(
      slot = %resolved.slot,
      path = %collision.display(),
      "folder override contains a file name reserved by another slot"
    );
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::fs;
  use tempfile::tempdir;

  fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
  }

  fn project_with_defaults(root: &Path) {
    write(&root.join("defaults/index.html"), "<div id=\"main\"></div>");
    write(&root.join("defaults/theme.css"), "body {}");
    write(&root.join("defaults/config.yaml"), "brand: default");
    write(&root.join("defaults/queries.graphql"), "query { me { id } }");
    write(&root.join("defaults/config.js"), "export default {};");
  }

  #[test]
  fn stages_defaults_under_fixed_names() -> Result<()> {
    let temp = tempdir().unwrap();
    let root = temp.path();
    project_with_defaults(root);

    let builder = OverlayBuilder::new(OverlayConfig::default(), root);
    let staged = builder.stage(&HashMap::new())?;

    let stage = root.join("src/overrides");
    assert_eq!(staged.staging_root, stage);
    for name in ["index.html", "override.css", "config.yaml", "queries.graphql", "config.js"] {
      assert!(stage.join(name).is_file(), "{name} should be staged");
    }
    assert_eq!(staged.html_entry(), Some(root.join("defaults/index.html").as_path()));
    assert_eq!(staged.watch_paths().len(), 5);
    Ok(())
  }

  #[test]
  fn rebuild_clears_previous_overrides() -> Result<()> {
    let temp = tempdir().unwrap();
    let root = temp.path();
    project_with_defaults(root);
    write(&root.join("brands/acme/config/settings.js"), "export const acme = true;");
    write(&root.join("brands/acme/q/nested/acme.graphql"), "query Acme { id }");

    let builder = OverlayBuilder::new(OverlayConfig::default(), root);
    let env: HashMap<String, String> = [
      ("OVERLAY_CONFIG_JS_PATH", "brands/acme/config"),
      ("OVERLAY_GRAPHQL_PATH", "brands/acme/q/nested/acme.graphql"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();
    builder.stage(&env)?;

    let stage = root.join("src/overrides");
    assert!(stage.join("settings.js").is_file());
    assert!(stage.join("acme.graphql").is_file());
    assert!(!stage.join("config.js").exists());
    assert!(!stage.join("queries.graphql").exists());

    builder.stage(&HashMap::new())?;
    assert!(!stage.join("settings.js").exists());
    assert!(!stage.join("acme.graphql").exists());
    assert!(stage.join("config.js").is_file());
    Ok(())
  }

  #[test]
  fn unoverridden_slots_are_reported_absent() -> Result<()> {
    let temp = tempdir().unwrap();
    let root = temp.path();
    let mut config = OverlayConfig::default();
    for slot in [
      &mut config.html,
      &mut config.css,
      &mut config.yaml,
      &mut config.graphql,
      &mut config.js_config,
    ] {
      slot.default = None;
    }

    let builder = OverlayBuilder::new(config, root);
    let staged = builder.stage(&HashMap::new())?;
    assert!(staged.slots.iter().all(|report| report.resolved.is_none()));
    assert!(builder.staging().is_empty()?);
    assert_eq!(staged.html_entry(), None);
    Ok(())
  }

  #[test]
  fn relative_root_resolves_against_current_dir() -> Result<()> {
    let builder = OverlayBuilder::new(OverlayConfig::default(), ".");
    let cwd = std::env::current_dir().unwrap();

    assert_eq!(builder.staging().root(), cwd.join("src/overrides"));
    let env: HashMap<String, String> =
      [("OVERLAY_CSS_PATH".to_string(), "brands/../brand.css".to_string())].into();
    let resolution = builder.resolve_slot(SlotId::Css, &env)?;
    let resolved = resolution.as_resolved().expect("css override should resolve");
    assert_eq!(resolved.source, cwd.join("brands/../brand.css"));
    assert_eq!(resolved.destination, cwd.join("src/overrides/override.css"));
    Ok(())
  }

  #[test]
  fn missing_default_aborts_staging() {
    let temp = tempdir().unwrap();
    let builder = OverlayBuilder::new(OverlayConfig::default(), temp.path());
    let err = builder.stage(&HashMap::new()).unwrap_err();
    assert!(err.to_string().contains("index.html"), "{err}");
  }

  #[test]
  fn report_serialises_slot_ids() -> Result<()> {
    let temp = tempdir().unwrap();
    project_with_defaults(temp.path());

    let staged = OverlayBuilder::new(OverlayConfig::default(), temp.path()).stage(&HashMap::new())?;
    let json = staged.to_json()?;
    assert!(json.contains("\"slot\": \"yaml-config\""));
    assert!(json.contains("\"isDirectory\": false"));
    Ok(())
  }
}
