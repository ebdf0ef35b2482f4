//! rifs-core: shared types, ids, errors, and configuration.
//!
//! This crate is the foundation for the other rifs crates. It defines the
//! [`Operation`] trait and its field tables, the [`Job`] submission record,
//! per-operation workspaces, and a small external command runner.

pub mod command;
pub mod config;
pub mod error;
pub mod field;
pub mod ids;
pub mod job;
pub mod operation;
pub mod tools;
pub mod workspace;

// Re-export the most commonly used items at the crate root.
pub use command::{ToolCommand, ToolOutput};
pub use config::{Config, FarmConfig, JobDefaults, ResolveConfig, ResolvePolicy};
pub use error::{Error, Result};
pub use field::{Field, FieldMeta, FieldTable};
pub use ids::*;
pub use job::{Job, Reference, SubmissionOutcome};
pub use operation::{CommandOperation, Execution, Operation, OperationCore, ScriptOperation};
pub use tools::{check_tool, require_tool, ToolInfo};
pub use workspace::Workspace;
