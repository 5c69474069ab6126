//! Locating, naming and copying override files into the staging area.
//!
//! Resolution is a pure function of the environment and a slot definition, copying is the
//! only step that touches the filesystem, and the staging area is the one directory both
//! of them agree on.

mod copier;
mod resolver;
mod staging;

pub use copier::{OverlayCopier, find_fixed_name_collisions};
pub use resolver::{EnvSource, OverlayResolver, ProcessEnv};
pub use staging::StagingArea;
