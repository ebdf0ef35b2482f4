//! The submission boundary.
//!
//! The constructor hands each ordered job to a [`Submitter`]. The default,
//! [`ProcessSubmitter`], launches the job's command and waits for it. A farm
//! backend that speaks RPC would implement the same trait.

use rifs_core::{Job, SubmissionOutcome};

/// Something that accepts jobs in submission order.
pub trait Submitter {
    /// Submit one job. Failures are reported in the outcome, never raised.
    fn submit(&mut self, job: &Job) -> SubmissionOutcome;
}

/// Runs each job's command as a child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSubmitter;

impl Submitter for ProcessSubmitter {
    fn submit(&mut self, job: &Job) -> SubmissionOutcome {
        job.submit()
    }
}

/// Records jobs without launching anything.
#[derive(Debug, Default, Clone)]
pub struct DryRunSubmitter {
    /// Every job seen, in submission order.
    pub planned: Vec<Job>,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Submitter for DryRunSubmitter {
    fn submit(&mut self, job: &Job) -> SubmissionOutcome {
        tracing::info!("[dry run] Would submit {}: {}", job.name, job.command.join(" "));
        self.planned.push(job.clone());
        SubmissionOutcome {
            job: job.id,
            name: job.name.clone(),
            submitted: false,
            exit_code: None,
            output: job.command.join(" "),
            error: None,
        }
    }
}
