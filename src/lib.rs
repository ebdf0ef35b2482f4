//! rifs - render-farm operation submission
//!
//! This library crate exposes the batch manifest and the bundled operations
//! for integration testing. The pipeline itself lives in `rifs-core`,
//! `rifs-script`, and `rifs-pipeline`, re-exported here.

pub mod manifest;
pub mod operations;

pub use rifs_core as core;
pub use rifs_pipeline as pipeline;
pub use rifs_script as script;
