//! End-to-end orchestration: materialize, convert, resolve, submit.

use rifs_core::{Config, Error, Job, Operation, ResolvePolicy, Result, SubmissionOutcome};

use crate::factory::JobFactory;
use crate::resolver::{Resolution, Resolver};
use crate::submit::Submitter;

/// One entry of a batch.
#[derive(Debug)]
pub enum Submittable {
    Operation(Box<dyn Operation>),
    Job(Job),
    /// Anything else a producer handed over. Skipped by [`Constructor::build`].
    Unsupported { label: String },
}

impl Submittable {
    pub fn operation(op: impl Operation + 'static) -> Self {
        Submittable::Operation(Box::new(op))
    }

    /// Short description for log lines.
    pub fn label(&self) -> String {
        match self {
            Submittable::Operation(op) => format!("{} ({})", op.name(), op.type_name()),
            Submittable::Job(job) => format!("{} (Job)", job.name),
            Submittable::Unsupported { label } => label.clone(),
        }
    }
}

impl From<Job> for Submittable {
    fn from(job: Job) -> Self {
        Submittable::Job(job)
    }
}

impl From<Box<dyn Operation>> for Submittable {
    fn from(op: Box<dyn Operation>) -> Self {
        Submittable::Operation(op)
    }
}

/// Turns a batch into ordered jobs and submits them.
///
/// # Example
///
/// ```no_run
/// use rifs_core::{CommandOperation, Config, OperationCore, ResolvePolicy, Workspace};
/// use rifs_pipeline::{Constructor, ProcessSubmitter, Submittable};
///
/// let config = Config::default();
/// let root = config.farm.workspace_root()?;
/// let op = CommandOperation::new(
///     OperationCore::new("list", Workspace::create_in(&root)?),
///     ["ls", "-la"],
/// );
///
/// let outcomes = Constructor::new(&config)
///     .with_items([Submittable::operation(op)])
///     .submit(ResolvePolicy::Strict, &mut ProcessSubmitter)?;
/// assert_eq!(outcomes.len(), 1);
/// # Ok::<(), rifs_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Constructor {
    factory: JobFactory,
    items: Vec<Submittable>,
}

impl Constructor {
    pub fn new(config: &Config) -> Self {
        Self {
            factory: JobFactory::from_config(config),
            items: Vec::new(),
        }
    }

    /// Builder: append batch entries.
    pub fn with_items(mut self, items: impl IntoIterator<Item = Submittable>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn push(&mut self, item: Submittable) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Materialize and convert every entry into an unordered resolver.
    ///
    /// Jobs are injected as they are. Unsupported entries are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Stops at the first materialization or field-copy error; nothing is
    /// submitted in that case.
    pub fn build(self) -> Result<Resolver> {
        let mut resolver = Resolver::new();

        for item in self.items {
            match item {
                Submittable::Job(job) => resolver.inject_job(job),
                Submittable::Operation(op) => {
                    let script = rifs_script::materialize(&*op)?;
                    match &script {
                        Some(path) => {
                            tracing::info!("Generated script {} for {}", path.display(), op.name())
                        }
                        None => tracing::info!("{} runs a direct command", op.name()),
                    }
                    let job = self.factory.convert(
                        &*op,
                        script.as_deref(),
                        &op.core().submission_fields,
                    )?;
                    resolver.inject(op, job);
                }
                Submittable::Unsupported { label } => {
                    tracing::warn!("Skipping {label}: not an operation or a job");
                }
            }
        }

        Ok(resolver)
    }

    /// Build and resolve without submitting.
    pub fn plan(self, policy: ResolvePolicy) -> Result<Resolution> {
        Ok(self.build()?.resolve_detailed(policy))
    }

    /// Build, resolve, and submit every job in order.
    ///
    /// A failed submission is recorded in its outcome and does not stop the
    /// remaining jobs.
    pub fn submit(
        self,
        policy: ResolvePolicy,
        submitter: &mut impl Submitter,
    ) -> Result<Vec<SubmissionOutcome>> {
        let resolution = self.plan(policy)?;
        let mut outcomes = Vec::with_capacity(resolution.resolver.len());

        for grouping in &resolution.resolver {
            let job = grouping.job();
            tracing::info!("Submitting {}", grouping.name());
            let outcome = submitter.submit(job);
            if let Some(error) = &outcome.error {
                tracing::warn!("Submission of {} failed: {}", job.name, error.trim());
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

/// Submit a single operation or job and return its outcome.
///
/// # Errors
///
/// Returns [`Error::UnsupportedInput`] for anything but an operation or a
/// job, and [`Error::Validation`] if the item's dependencies keep it from
/// being submitted under the configured policy.
pub fn only_one(
    item: Submittable,
    config: &Config,
    submitter: &mut impl Submitter,
) -> Result<SubmissionOutcome> {
    if let Submittable::Unsupported { label } = &item {
        return Err(Error::UnsupportedInput(format!(
            "only operations or jobs can be submitted, got {label}"
        )));
    }

    let label = item.label();
    Constructor::new(config)
        .with_items([item])
        .submit(config.resolve.policy, submitter)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Validation(format!("{label} has unresolvable dependencies")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::DryRunSubmitter;
    use assert_matches::assert_matches;
    use rifs_core::{
        CommandOperation, FarmConfig, JobDefaults, OperationCore, OperationId, Reference,
        ScriptOperation, Workspace,
    };
    use serde_json::json;

    fn config(root: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.farm.workspace_root = root.path().display().to_string();
        config
    }

    fn core(root: &tempfile::TempDir, name: &str) -> OperationCore {
        OperationCore::new(name, Workspace::create_in(root.path()).unwrap())
    }

    #[test]
    fn build_materializes_and_converts() {
        let root = tempfile::tempdir().unwrap();
        let op = ScriptOperation::new(core(&root, "demo"), "rifs.demo", "DemoRif")
            .with_field("subject", "world");
        let script = op.core().workspace().file("rif_demorif.py");

        let resolver = Constructor::new(&config(&root))
            .with_items([Submittable::operation(op)])
            .build()
            .unwrap();

        assert!(script.is_file());
        let job = resolver.jobs().next().unwrap();
        assert_eq!(job.command, vec!["python".to_string(), script.display().to_string()]);
    }

    #[test]
    fn build_skips_unsupported_and_keeps_jobs() {
        let root = tempfile::tempdir().unwrap();
        let mut job = Job::new(&JobDefaults::default(), &FarmConfig::default());
        job.name = "prebuilt".into();

        let resolver = Constructor::new(&config(&root))
            .with_items([
                Submittable::Unsupported {
                    label: "render-node".into(),
                },
                Submittable::Job(job),
            ])
            .build()
            .unwrap();

        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.jobs().next().unwrap().name, "prebuilt");
    }

    #[test]
    fn build_aborts_on_unwritable_workspace() {
        let root = tempfile::tempdir().unwrap();
        let ok = CommandOperation::new(core(&root, "ls"), ["ls"]);
        let broken = ScriptOperation::new(core(&root, "broken"), "rifs.demo", "DemoRif");
        broken.core().teardown().unwrap();

        let result = Constructor::new(&config(&root))
            .with_items([Submittable::operation(ok), Submittable::operation(broken)])
            .build();
        assert_matches!(result, Err(Error::Io { .. }));
    }

    #[test]
    fn direct_command_submitted_alone() {
        let root = tempfile::tempdir().unwrap();
        let op = CommandOperation::new(core(&root, "ls"), ["ls", "-la", "/shots"]);

        let mut submitter = DryRunSubmitter::new();
        let outcomes = Constructor::new(&config(&root))
            .with_items([Submittable::operation(op)])
            .submit(ResolvePolicy::Strict, &mut submitter)
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(submitter.planned[0].command, vec!["ls", "-la", "/shots"]);
    }

    #[test]
    fn submit_order_follows_dependencies() {
        let root = tempfile::tempdir().unwrap();
        let a = CommandOperation::new(core(&root, "A"), ["echo", "a"]);
        let b = CommandOperation::new(core(&root, "B").with_depend_on([a.id()]), ["echo", "b"]);

        let mut submitter = DryRunSubmitter::new();
        Constructor::new(&config(&root))
            .with_items([Submittable::operation(b), Submittable::operation(a)])
            .submit(ResolvePolicy::Strict, &mut submitter)
            .unwrap();

        let names: Vec<&str> = submitter.planned.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(
            submitter.planned[1].depend_on,
            vec![Reference::Job(submitter.planned[0].id)]
        );
    }

    #[test]
    fn submission_fields_reach_the_job() {
        let root = tempfile::tempdir().unwrap();
        let mut op = CommandOperation::new(core(&root, "comp"), ["true"]);
        op.core_mut()
            .submission_fields
            .insert("outputImage".into(), json!("/out/comp.exr"));

        let resolver = Constructor::new(&config(&root))
            .with_items([Submittable::operation(op)])
            .build()
            .unwrap();
        assert_eq!(resolver.jobs().next().unwrap().env["outputImage"], "/out/comp.exr");
    }

    #[cfg(unix)]
    #[test]
    fn failed_submission_does_not_stop_the_batch() {
        let root = tempfile::tempdir().unwrap();
        let fails = CommandOperation::new(core(&root, "fails"), ["sh", "-c", "echo boom >&2; exit 1"]);
        let runs = CommandOperation::new(core(&root, "runs"), ["sh", "-c", "echo done"]);

        let outcomes = Constructor::new(&config(&root))
            .with_items([Submittable::operation(fails), Submittable::operation(runs)])
            .submit(ResolvePolicy::Strict, &mut crate::ProcessSubmitter)
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert_eq!(outcomes[0].error.as_deref().map(str::trim), Some("boom"));
        assert!(outcomes[1].is_success());
        assert_eq!(outcomes[1].output.trim(), "done");
    }

    #[test]
    fn only_one_rejects_unsupported() {
        let root = tempfile::tempdir().unwrap();
        let result = only_one(
            Submittable::Unsupported {
                label: "render-node".into(),
            },
            &config(&root),
            &mut DryRunSubmitter::new(),
        );
        assert_matches!(result, Err(Error::UnsupportedInput(_)));
    }

    #[test]
    fn only_one_returns_single_outcome() {
        let root = tempfile::tempdir().unwrap();
        let op = CommandOperation::new(core(&root, "ls"), ["ls"]);
        let outcome = only_one(Submittable::operation(op), &config(&root), &mut DryRunSubmitter::new())
            .unwrap();
        assert_eq!(outcome.name, "ls");
        assert_eq!(outcome.output, "ls");
    }

    #[test]
    fn only_one_reports_dropped_item() {
        let root = tempfile::tempdir().unwrap();
        let op = CommandOperation::new(core(&root, "ls").with_depend_on([OperationId::new()]), ["ls"]);
        let result = only_one(Submittable::operation(op), &config(&root), &mut DryRunSubmitter::new());
        assert_matches!(result, Err(Error::Validation(_)));
    }
}
