//! Job factory: construct a [`Job`] from one [`Operation`].

use std::collections::BTreeMap;
use std::path::Path;

use rifs_core::{Config, Error, Execution, FarmConfig, Job, JobDefaults, Operation, Reference, Result};
use serde_json::Value;

/// Operation fields copied onto the job, as `(operation field, job slot)`.
/// Exempt fields are skipped even when listed.
const SHARED_FIELDS: &[(&str, &str)] = &[("name", "name"), ("note", "notes")];

/// Submission field mirrored into the job environment for the farm backend.
const OUTPUT_IMAGE: &str = "outputImage";

/// Builds jobs with the configured interpreter and resource defaults.
#[derive(Debug, Clone, Default)]
pub struct JobFactory {
    farm: FarmConfig,
    defaults: JobDefaults,
}

impl JobFactory {
    pub fn new(farm: FarmConfig, defaults: JobDefaults) -> Self {
        Self { farm, defaults }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.farm.clone(), config.job.clone())
    }

    /// Convert an operation into a job.
    ///
    /// The command is the interpreter followed by `script` when a script was
    /// materialized, otherwise the operation's own command line. Shared
    /// fields are copied next, then `submission_fields` are applied as
    /// overrides. The job's `depend_on` holds one unresolved
    /// [`Reference::Operation`] per operation dependency until the resolver
    /// rewrites it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldCopy`] when a field does not fit its job slot,
    /// and [`Error::Validation`] when a script operation arrives without a
    /// script.
    pub fn convert(
        &self,
        op: &dyn Operation,
        script: Option<&Path>,
        submission_fields: &BTreeMap<String, Value>,
    ) -> Result<Job> {
        let mut job = Job::new(&self.defaults, &self.farm);

        job.command = match (script, op.execution()) {
            (Some(script), _) => {
                let mut command = self.farm.interpreter.clone();
                command.push(script.display().to_string());
                command
            }
            (None, Execution::Command(command)) => command,
            (None, Execution::Script) => {
                return Err(Error::Validation(format!(
                    "{} needs a materialized script",
                    op.name()
                )));
            }
        };

        job.env.insert(
            OUTPUT_IMAGE.to_string(),
            match submission_fields.get(OUTPUT_IMAGE) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            },
        );

        let fields = op.fields();
        for (from, to) in SHARED_FIELDS {
            let Some(field) = fields.get(from) else {
                continue;
            };
            if field.meta.exempt {
                continue;
            }
            job.apply_field(to, &field.value)?;
        }

        job.depend_on = op
            .core()
            .depend_on
            .iter()
            .copied()
            .map(Reference::Operation)
            .collect();

        for (key, value) in submission_fields {
            if !job.apply_field(key, value)? {
                job.extra.insert(key.clone(), value.clone());
            }
        }

        tracing::debug!(
            "Converted {} into job {} ({} dependencies)",
            op.name(),
            job.id.short(),
            job.depend_on.len()
        );
        Ok(job)
    }
}
