//! Data structures describing override slots and their per-build resolution.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Logical override role. Exactly five exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotId {
  /// HTML shell used as the bundler entry point.
  Html,
  /// Branding stylesheet.
  Css,
  /// YAML runtime configuration.
  YamlConfig,
  /// GraphQL query file referenced by name from application code.
  Graphql,
  /// JS configuration module, or a folder of configuration modules.
  JsConfig,
}

impl SlotId {
  /// All slots in the order they are staged.
  pub const ALL: [SlotId; 5] = [
    SlotId::Html,
    SlotId::Css,
    SlotId::YamlConfig,
    SlotId::Graphql,
    SlotId::JsConfig,
  ];

  /// Short identifier used in logs and reports.
  pub fn as_str(self) -> &'static str {
    match self {
      SlotId::Html => "html",
      SlotId::Css => "css",
      SlotId::YamlConfig => "yaml-config",
      SlotId::Graphql => "graphql",
      SlotId::JsConfig => "js-config",
    }
  }
}

impl fmt::Display for SlotId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// How a slot's destination inside the staging area is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationRule {
  /// Always copied to this path, relative to the staging root.
  Fixed(PathBuf),
  /// Copied to the staging root under the source's own base name.
  PreserveName,
  /// Sources ending in `extension` go to `file`; anything else is a directory mirrored
  /// into the staging root.
  BranchOnExtension {
    /// Extension (without the dot) that marks a single-file source.
    extension: String,
    /// Destination for single-file sources, relative to the staging root.
    file: PathBuf,
  },
}

/// Immutable definition of one override slot.
#[derive(Debug, Clone)]
pub struct OverrideSlot {
  /// Role this slot fills.
  pub id: SlotId,
  /// Environment variable naming the override source.
  pub environment_key: String,
  /// Fallback used when the environment variable is unset or blank.
  pub default_source: Option<PathBuf>,
  /// Destination naming rule.
  pub destination: DestinationRule,
}

/// Concrete copy instruction produced for one slot during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOverride {
  /// Slot this override fills.
  pub slot: SlotId,
  /// File or folder to copy from.
  pub source: PathBuf,
  /// Absolute destination inside the staging area.
  pub destination: PathBuf,
  /// Whether `source` is mirrored as a directory tree.
  pub is_directory: bool,
}

/// Outcome of resolving a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// The slot has a source and a destination.
  Resolved(ResolvedOverride),
  /// Neither the environment nor a default provided a source.
  Absent,
}

impl Resolution {
  /// Borrow the resolved override, if any.
  pub fn as_resolved(&self) -> Option<&ResolvedOverride> {
    match self {
      Resolution::Resolved(resolved) => Some(resolved),
      Resolution::Absent => None,
    }
  }
}

/// Per-slot line of a staging report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotReport {
  /// Slot the line describes.
  pub slot: SlotId,
  /// Resolved override, or `None` when the slot stayed unoverridden.
  pub resolved: Option<ResolvedOverride>,
}
