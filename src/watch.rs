//! Re-stage individual overrides when their sources change.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::builder::StagedOverlay;
use crate::error::{OverlayError, Result};
use crate::models::{ResolvedOverride, SlotId};
use crate::overlay::OverlayCopier;

/// Keeps staged copies fresh while an interactive build is running.
#[derive(Debug, Clone)]
pub struct OverlayWatcher {
  overrides: Vec<ResolvedOverride>,
  copier: OverlayCopier,
}

impl OverlayWatcher {
  /// Watch every override staged by `staged`.
  pub fn new(staged: &StagedOverlay) -> Self {
    Self {
      overrides: staged
        .slots
        .iter()
        .filter_map(|report| report.resolved.clone())
        .collect(),
      copier: OverlayCopier,
    }
  }

  /// Overrides whose source is, or contains, `path`.
  pub fn affected_by(&self, path: &Path) -> impl Iterator<Item = &ResolvedOverride> {
    self
      .overrides
      .iter()
      .filter(move |resolved| path.starts_with(&resolved.source))
  }

  /// Directories to register with the platform watcher.
  ///
  /// File sources are watched through their parent directory so that editors which save by
  /// replacing the file keep being observed. Folder sources are watched recursively.
  pub fn watch_targets(&self) -> Vec<(PathBuf, RecursiveMode)> {
    let mut targets: BTreeMap<PathBuf, bool> = BTreeMap::new();
    for resolved in &self.overrides {
      let (dir, recursive) = if resolved.is_directory {
        (resolved.source.clone(), true)
      } else {
        match resolved.source.parent() {
          Some(parent) => (parent.to_path_buf(), false),
          None => (resolved.source.clone(), false),
        }
      };
      *targets.entry(dir).or_default() |= recursive;
    }

    targets
      .into_iter()
      .map(|(dir, recursive)| {
        let mode = if recursive {
          RecursiveMode::Recursive
        } else {
          RecursiveMode::NonRecursive
        };
        (dir, mode)
      })
      .collect()
  }

  /// Re-copy every override touched by `paths`. Returns the refreshed slots.
  ///
  /// Paths that no longer exist inside a folder override are removed from the staging area.
  /// An override whose source is currently missing keeps its staged copy until the source
  /// reappears.
  pub fn refresh(&self, paths: &[PathBuf]) -> Result<Vec<SlotId>> {
    let mut refreshed: Vec<SlotId> = Vec::new();
    for path in paths {
      for resolved in self.affected_by(path) {
        if !resolved.source.exists() {
          tracing::debug!(
            slot = %resolved.slot,
            path = %resolved.source.display(),
            "override source missing, keeping staged copy"
          );
          continue;
        }
        if resolved.is_directory && !path.exists() {
          remove_staged(resolved, path)?;
        }
        if refreshed.contains(&resolved.slot) {
          continue;
        }
        self.copier.apply(resolved)?;
        refreshed.push(resolved.slot);
      }
    }
    Ok(refreshed)
  }

  /// Apply one watcher event. Events other than create, modify and remove are ignored.
  pub fn handle_event(&self, event: &Event) -> Result<Vec<SlotId>> {
    if !is_restage_event(&event.kind) {
      tracing::trace!(kind = ?event.kind, "ignoring watch event");
      return Ok(Vec::new());
    }
    self.refresh(&event.paths)
  }

  /// Block, re-staging overrides as their sources change, until the watcher shuts down.
  ///
  /// A failed re-copy is logged and the previous staged copy stays in place.
  pub fn run(&self) -> Result<()> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)?;

    for (dir, mode) in self.watch_targets() {
      watcher.watch(&dir, mode)?;
      tracing::info!(path = %dir.display(), ?mode, "watching override sources");
    }

    for event in rx {
      let event = match event {
        Ok(event) => event,
        Err(err) => {
          tracing::error!(error = %err, "file watcher reported an error");
          continue;
        }
      };

      match self.handle_event(&event) {
        Ok(slots) if !slots.is_empty() => {
          tracing::info!(?slots, "re-staged overrides");
        }
        Ok(_) => {}
        Err(err) => tracing::error!(error = %err, "failed to re-stage override"),
      }
    }

    Ok(())
  }
}

fn is_restage_event(kind: &EventKind) -> bool {
  matches!(
    kind,
    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
  )
}

fn remove_staged(resolved: &ResolvedOverride, removed: &Path) -> Result<()> {
  let Ok(relative) = removed.strip_prefix(&resolved.source) else {
    return Ok(());
  };
  if relative.as_os_str().is_empty() {
    return Ok(());
  }

  let staged = resolved.destination.join(relative);
  let outcome = match fs::symlink_metadata(&staged) {
    Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&staged),
    Ok(_) => fs::remove_file(&staged),
    Err(err) => Err(err),
  };
  match outcome {
    Ok(()) => {
      tracing::debug!(slot = %resolved.slot, path = %staged.display(), "removed staged entry");
      Ok(())
    }
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
    Err(err) => Err(OverlayError::io(&staged, err)),
  }
}
