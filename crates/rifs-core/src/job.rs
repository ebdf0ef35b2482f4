//! The backend-neutral submission record.
//!
//! A [`Job`] is created by the job factory from exactly one operation (or
//! handed in directly by the caller), has its `depend_on` rewritten by the
//! resolver, and is finally submitted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::ToolCommand;
use crate::config::{FarmConfig, JobDefaults};
use crate::error::{Error, Result};
use crate::ids::{JobId, OperationId};

/// An entry in a job's dependency list.
///
/// Jobs built from operations start out with `Operation` placeholders; the
/// resolver swaps each one for the `Job` built from that operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Reference {
    Operation(OperationId),
    Job(JobId),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Operation(id) => write!(f, "operation:{}", id.short()),
            Reference::Job(id) => write!(f, "job:{}", id.short()),
        }
    }
}

impl From<OperationId> for Reference {
    fn from(id: OperationId) -> Self {
        Reference::Operation(id)
    }
}

impl From<JobId> for Reference {
    fn from(id: JobId) -> Self {
        Reference::Job(id)
    }
}

/// Submission record with backend resource hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub notes: String,
    pub command: Vec<String>,
    pub depend_on: Vec<Reference>,
    pub activity: String,
    pub cpus: u32,
    pub ram: u64,
    pub job_class_type: String,
    pub job_name: String,
    pub env: BTreeMap<String, String>,
    /// Submission fields with no dedicated slot, passed through to the backend.
    pub extra: BTreeMap<String, Value>,
}

impl Job {
    /// A new job carrying the configured defaults and nothing else.
    pub fn new(defaults: &JobDefaults, farm: &FarmConfig) -> Self {
        Self {
            id: JobId::new(),
            name: String::new(),
            notes: String::new(),
            command: Vec::new(),
            depend_on: Vec::new(),
            activity: defaults.activity.clone(),
            cpus: defaults.cpus,
            ram: defaults.ram,
            job_class_type: defaults.job_class_type.clone(),
            job_name: farm.show.clone(),
            env: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Set a named slot from a field value.
    ///
    /// Returns `Ok(false)` when the job has no slot with that name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldCopy`] when the slot exists but the value has
    /// the wrong shape.
    pub fn apply_field(&mut self, name: &str, value: &Value) -> Result<bool> {
        match name {
            "name" => self.name = expect_string(name, value)?,
            "notes" => self.notes = expect_string(name, value)?,
            "activity" => self.activity = expect_string(name, value)?,
            "job_class_type" => self.job_class_type = expect_string(name, value)?,
            "job_name" => self.job_name = expect_string(name, value)?,
            "cpus" => {
                let cpus = expect_u64(name, value)?;
                self.cpus = u32::try_from(cpus)
                    .map_err(|_| Error::field_copy(name, format!("{cpus} does not fit in u32")))?;
            }
            "ram" => self.ram = expect_u64(name, value)?,
            "env" => {
                let Value::Object(map) = value else {
                    return Err(Error::field_copy(name, "expected a mapping of strings"));
                };
                for (key, entry) in map {
                    self.env.insert(key.clone(), expect_string(name, entry)?);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Whether every dependency already points at a job.
    pub fn is_resolved(&self) -> bool {
        self.depend_on
            .iter()
            .all(|r| matches!(r, Reference::Job(_)))
    }

    /// Launch the command, wait for it, and report what happened.
    ///
    /// The child inherits the current environment. Standard output is
    /// returned on success, standard error on a non-zero exit. Failures never
    /// escape as errors; they are recorded in the outcome.
    pub fn submit(&self) -> SubmissionOutcome {
        let result = ToolCommand::from_tokens(&self.command).and_then(|cmd| cmd.output());

        match result {
            Ok(output) if output.status.success() => SubmissionOutcome {
                job: self.id,
                name: self.name.clone(),
                submitted: true,
                exit_code: output.status.code(),
                output: output.stdout,
                error: None,
            },
            Ok(output) => SubmissionOutcome {
                job: self.id,
                name: self.name.clone(),
                submitted: true,
                exit_code: output.status.code(),
                output: String::new(),
                error: Some(output.stderr),
            },
            Err(e) => SubmissionOutcome {
                job: self.id,
                name: self.name.clone(),
                submitted: false,
                exit_code: None,
                output: String::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

fn expect_string(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(Error::field_copy(field, format!("expected a string, got {other}"))),
    }
}

fn expect_u64(field: &str, value: &Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| Error::field_copy(field, format!("expected an unsigned integer, got {value}")))
}

/// What happened when a job was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub job: JobId,
    pub name: String,
    /// The process was launched (it may still have failed).
    pub submitted: bool,
    pub exit_code: Option<i32>,
    /// Standard output, on success.
    pub output: String,
    /// Standard error on a non-zero exit, or the launch error.
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.submitted && self.error.is_none()
    }
}
