#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod models;
pub mod overlay;
pub mod paths;
pub mod transform;
pub mod watch;

pub use builder::{OverlayBuilder, StagedOverlay};
pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use models::{OverrideSlot, Resolution, ResolvedOverride, SlotId};
pub use overlay::{EnvSource, ProcessEnv};
pub use transform::TransformRegistry;
pub use watch::OverlayWatcher;
