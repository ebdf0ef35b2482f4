//! Concrete operations shipped with rifs.

pub mod nuke;

pub use nuke::{NukeFlags, NukeRender};
