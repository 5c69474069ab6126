use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{OverlayError, Result};
use crate::models::{DestinationRule, OverrideSlot, ResolvedOverride, Resolution};

/// Read-only view of build-time environment variables.
pub trait EnvSource {
  /// Value of `key`, if set.
  fn var(&self, key: &str) -> Option<String>;
}

/// Environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
  fn var(&self, key: &str) -> Option<String> {
    std::env::var(key).ok()
  }
}

impl EnvSource for HashMap<String, String> {
  fn var(&self, key: &str) -> Option<String> {
    self.get(key).cloned()
  }
}

/// Computes where each slot's override comes from and where it is staged.
#[derive(Debug, Clone)]
pub struct OverlayResolver {
  staging_root: PathBuf,
  base_dir: PathBuf,
}

impl OverlayResolver {
  /// Relative override paths from the environment are anchored at `base_dir`.
  pub fn new(staging_root: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
    Self {
      staging_root: staging_root.into(),
      base_dir: base_dir.into(),
    }
  }

  /// Resolve a slot against the environment.
  pub fn resolve<E: EnvSource + ?Sized>(&self, slot: &OverrideSlot, env: &E) -> Result<Resolution> {
    let Some(source) = self.select_source(slot, env) else {
      tracing::debug!(slot = %slot.id, key = %slot.environment_key, "slot left unoverridden");
      return Ok(Resolution::Absent);
    };

    let (destination, is_directory) = match &slot.destination {
      DestinationRule::Fixed(relative) => (self.staging_root.join(relative), false),
      DestinationRule::PreserveName => {
        let name = source
          .file_name()
          .ok_or_else(|| OverlayError::UnnamedSource {
            slot: slot.id,
            path: source.clone(),
          })?;
        (self.staging_root.join(name), false)
      }
      DestinationRule::BranchOnExtension { extension, file } => {
        if has_extension(&source, extension) {
          (self.staging_root.join(file), false)
        } else {
          (self.staging_root.clone(), true)
        }
      }
    };

    Ok(Resolution::Resolved(ResolvedOverride {
      slot: slot.id,
      source,
      destination,
      is_directory,
    }))
  }

  fn select_source<E: EnvSource + ?Sized>(&self, slot: &OverrideSlot, env: &E) -> Option<PathBuf> {
    if let Some(value) = env.var(&slot.environment_key) {
      let trimmed = value.trim();
      if !trimmed.is_empty() {
        return Some(self.base_dir.join(trimmed));
      }
    }

    slot.default_source.clone()
  }
}

fn has_extension(path: &Path, extension: &str) -> bool {
  path
    .extension()
    .and_then(|value| value.to_str())
    .is_some_and(|value| value == extension)
}
