//! # rifs-pipeline
//!
//! Turns a batch of operations into jobs and submits them in dependency
//! order.
//!
//! This crate provides:
//!
//! - **[`JobFactory`]** -- converts one operation (plus its materialized
//!   script) into a [`Job`](rifs_core::Job).
//! - **[`Resolver`]** -- orders groupings so every job follows the jobs it
//!   depends on, and rewrites dependencies from operations to jobs.
//! - **[`Submitter`]** -- the submission boundary, with a process-launching
//!   and a dry-run implementation.
//! - **[`Constructor`]** -- the facade: build, resolve, submit.

pub mod constructor;
pub mod factory;
pub mod resolver;
pub mod submit;

// Re-export key types at the crate root.
pub use constructor::{only_one, Constructor, Submittable};
pub use factory::JobFactory;
pub use resolver::{Grouping, Origin, Resolution, Resolver};
pub use submit::{DryRunSubmitter, ProcessSubmitter, Submitter};
