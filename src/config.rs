//! Project configuration describing the staging layout and override slots.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::{DestinationRule, OverrideSlot, SlotId};

const DEFAULT_CONFIG_FILE: &str = "overlay.config.json";

/// Staged name of the HTML shell.
pub const STAGED_HTML_FILE: &str = "index.html";
/// Staged name of the branding stylesheet.
pub const STAGED_CSS_FILE: &str = "override.css";
/// Staged name of the YAML configuration.
pub const STAGED_YAML_FILE: &str = "config.yaml";
/// Staged name of a single-file JS configuration.
pub const STAGED_JS_CONFIG_FILE: &str = "config.js";

/// Environment key and default source for one slot.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SlotConfig {
  /// Environment variable consulted first.
  pub env: String,
  /// Fallback source, relative to the project root.
  #[serde(default)]
  pub default: Option<String>,
}

impl SlotConfig {
  fn new(env: &str, default: &str) -> Self {
    Self {
      env: env.into(),
      default: Some(default.into()),
    }
  }
}

/// Discoverable configuration for an overlay build.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlayConfig {
  /// Staging directory, relative to the project root. Cleared on every build.
  pub staging_dir: String,
  /// Application source tree whose plain scripts are coerced through JSX.
  pub app_src_dir: String,
  /// Module path the injected bootstrap script points at.
  pub entry_path: String,
  /// Mount element after which the bootstrap script is inserted.
  pub mount_anchor: String,
  /// Import source for the automatic JSX runtime.
  pub jsx_import_source: String,
  /// HTML shell slot.
  pub html: SlotConfig,
  /// Stylesheet slot.
  pub css: SlotConfig,
  /// YAML configuration slot.
  pub yaml: SlotConfig,
  /// GraphQL query slot.
  pub graphql: SlotConfig,
  /// JS configuration slot.
  pub js_config: SlotConfig,
}

impl Default for OverlayConfig {
  fn default() -> Self {
    Self {
      staging_dir: "src/overrides".into(),
      app_src_dir: "src".into(),
      entry_path: "/src/main.jsx".into(),
      mount_anchor: r#"<div id="main"></div>"#.into(),
      jsx_import_source: "react".into(),
      html: SlotConfig::new("OVERLAY_HTML_PATH", "defaults/index.html"),
      css: SlotConfig::new("OVERLAY_CSS_PATH", "defaults/theme.css"),
      yaml: SlotConfig::new("OVERLAY_YAML_PATH", "defaults/config.yaml"),
      graphql: SlotConfig::new("OVERLAY_GRAPHQL_PATH", "defaults/queries.graphql"),
      js_config: SlotConfig::new("OVERLAY_CONFIG_JS_PATH", "defaults/config.js"),
    }
  }
}

impl OverlayConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing or unparsable file falls back to the defaults.
  pub fn discover(project_root: &Path) -> Self {
    let candidate = project_root.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Some(config) => {
        tracing::debug!(path = %candidate.display(), "loaded overlay configuration");
        config
      }
      None => {
        tracing::debug!(path = %candidate.display(), "using default overlay configuration");
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Absolute staging directory for a project root.
  pub fn staging_path(&self, project_root: &Path) -> PathBuf {
    project_root.join(&self.staging_dir)
  }

  /// Absolute application source directory for a project root.
  pub fn app_src_path(&self, project_root: &Path) -> PathBuf {
    project_root.join(&self.app_src_dir)
  }

  /// Build the five slot definitions. Defaults are anchored at `project_root`.
  pub fn slots(&self, project_root: &Path) -> Vec<OverrideSlot> {
    SlotId::ALL
      .into_iter()
      .map(|id| {
        let slot = self.slot_config(id);
        OverrideSlot {
          id,
          environment_key: slot.env.clone(),
          default_source: slot
            .default
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| project_root.join(value)),
          destination: destination_rule(id),
        }
      })
      .collect()
  }

  fn slot_config(&self, id: SlotId) -> &SlotConfig {
    match id {
      SlotId::Html => &self.html,
      SlotId::Css => &self.css,
      SlotId::YamlConfig => &self.yaml,
      SlotId::Graphql => &self.graphql,
      SlotId::JsConfig => &self.js_config,
    }
  }
}

fn destination_rule(id: SlotId) -> DestinationRule {
  match id {
    SlotId::Html => DestinationRule::Fixed(STAGED_HTML_FILE.into()),
    SlotId::Css => DestinationRule::Fixed(STAGED_CSS_FILE.into()),
    SlotId::YamlConfig => DestinationRule::Fixed(STAGED_YAML_FILE.into()),
    SlotId::Graphql => DestinationRule::PreserveName,
    SlotId::JsConfig => DestinationRule::BranchOnExtension {
      extension: "js".into(),
      file: STAGED_JS_CONFIG_FILE.into(),
    },
  }
}

/// File names claimed by fixed-name slots inside the staging root.
pub fn fixed_staged_names() -> [&'static str; 4] {
  [
    STAGED_HTML_FILE,
    STAGED_CSS_FILE,
    STAGED_YAML_FILE,
    STAGED_JS_CONFIG_FILE,
  ]
}
