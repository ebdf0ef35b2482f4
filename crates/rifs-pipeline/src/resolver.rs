//! Dependency resolution over groupings.
//!
//! A [`Grouping`] pairs an operation with the job built from it (or a
//! caller-supplied job with itself). The [`Resolver`] orders groupings so that
//! every job is placed after the jobs it depends on, and rewrites each placed
//! job's `depend_on` from operation references to job references.
//!
//! Ordering is a queue-based topological sort. Groupings whose dependencies
//! are not all placed yet go to the back of the queue; a full pass over the
//! queue without placing anything means the rest can never be placed
//! (missing dependency or cycle), and the [`ResolvePolicy`] decides their fate.

use std::collections::{HashMap, VecDeque};

use rifs_core::{Job, JobId, Operation, Reference, ResolvePolicy};

/// Where a grouping's job came from.
#[derive(Debug)]
pub enum Origin {
    /// Built from this operation by the job factory.
    Operation(Box<dyn Operation>),
    /// Handed in as a job; the grouping pairs the job with itself.
    Job,
}

/// An operation and its job, the unit the resolver reorders.
#[derive(Debug)]
pub struct Grouping {
    origin: Origin,
    job: Job,
    /// Position in the resolver that produced this grouping.
    index: usize,
}

impl Grouping {
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The operation, unless the grouping was built from a bare job.
    pub fn operation(&self) -> Option<&dyn Operation> {
        match &self.origin {
            Origin::Operation(op) => Some(&**op),
            Origin::Job => None,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn into_job(self) -> Job {
        self.job
    }

    /// Display label, `<operation> - <job>`.
    pub fn name(&self) -> String {
        match self.operation() {
            Some(op) => format!("{} - {}", op.name(), self.job.name),
            None => format!("{} - {}", self.job.name, self.job.name),
        }
    }

    /// Whether this grouping is identified by `reference`.
    pub fn matches(&self, reference: &Reference) -> bool {
        match reference {
            Reference::Operation(id) => self.operation().is_some_and(|op| op.id() == *id),
            Reference::Job(id) => self.job.id == *id,
        }
    }

    /// What must be placed before this grouping.
    fn dependencies(&self) -> Vec<Reference> {
        match &self.origin {
            Origin::Operation(op) => op
                .core()
                .depend_on
                .iter()
                .copied()
                .map(Reference::Operation)
                .collect(),
            Origin::Job => self.job.depend_on.clone(),
        }
    }

    /// References under which later groupings may depend on this one.
    fn keys(&self) -> Vec<Reference> {
        let mut keys = vec![Reference::Job(self.job.id)];
        if let Some(op) = self.operation() {
            keys.push(Reference::Operation(op.id()));
        }
        keys
    }
}

/// Result of [`Resolver::resolve_detailed`].
#[derive(Debug)]
pub struct Resolution {
    /// The ordered groupings.
    pub resolver: Resolver,
    /// Jobs that could not be ordered: dropped under `strict`, appended with
    /// their dependencies untouched under `force`.
    pub unresolved: Vec<JobId>,
}

/// An ordered sequence of groupings.
#[derive(Debug, Default)]
pub struct Resolver {
    groupings: Vec<Grouping>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation and the job built from it.
    pub fn inject(&mut self, operation: Box<dyn Operation>, job: Job) {
        tracing::info!("Injecting job {} for {}", job.id.short(), operation.name());
        self.push(Origin::Operation(operation), job);
    }

    /// Add a caller-supplied job, paired with itself.
    pub fn inject_job(&mut self, job: Job) {
        tracing::info!("Injecting job {} ({})", job.id.short(), job.name);
        self.push(Origin::Job, job);
    }

    fn push(&mut self, origin: Origin, job: Job) {
        let index = self.groupings.len();
        self.groupings.push(Grouping { origin, job, index });
    }

    pub fn len(&self) -> usize {
        self.groupings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groupings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Grouping> {
        self.groupings.iter()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.groupings.iter().map(|g| &g.job)
    }

    /// The grouping holding the given operation or job.
    pub fn find(&self, reference: &Reference) -> Option<&Grouping> {
        self.groupings.iter().find(|g| g.matches(reference))
    }

    /// Whether every reference names a grouping in this resolver.
    pub fn contains_all(&self, references: &[Reference]) -> bool {
        references.iter().all(|r| self.find(r).is_some())
    }

    /// Order the groupings; see [`Resolver::resolve_detailed`].
    pub fn resolve(self, policy: ResolvePolicy) -> Resolver {
        self.resolve_detailed(policy).resolver
    }

    /// Order the groupings and report those that could not be ordered.
    ///
    /// Groupings with no constraints between them keep their relative order.
    /// Resolving an already resolved resolver returns the same order.
    pub fn resolve_detailed(self, policy: ResolvePolicy) -> Resolution {
        let total = self.groupings.len();
        let mut pending: VecDeque<Grouping> = self.groupings.into();
        let mut ordered: Vec<Grouping> = Vec::with_capacity(total);
        let mut placed: HashMap<Reference, JobId> = HashMap::new();
        let mut stalled = 0;

        while let Some(mut grouping) = pending.pop_front() {
            let dependencies = grouping.dependencies();
            let resolved: Option<Vec<Reference>> = dependencies
                .iter()
                .map(|dep| placed.get(dep).map(|id| Reference::Job(*id)))
                .collect();

            match resolved {
                Some(depend_on) => {
                    grouping.job.depend_on = depend_on;
                    for key in grouping.keys() {
                        placed.insert(key, grouping.job.id);
                    }
                    tracing::debug!("Placed {} at {}", grouping.name(), ordered.len());
                    ordered.push(grouping);
                    stalled = 0;
                }
                None => {
                    pending.push_back(grouping);
                    stalled += 1;
                    if stalled >= pending.len() {
                        break;
                    }
                }
            }
        }

        let mut remainder: Vec<Grouping> = pending.into();
        remainder.sort_by_key(|g| g.index);
        let unresolved: Vec<JobId> = remainder.iter().map(|g| g.job.id).collect();

        for grouping in &remainder {
            let missing: Vec<String> = grouping
                .dependencies()
                .iter()
                .filter(|dep| !placed.contains_key(*dep))
                .map(ToString::to_string)
                .collect();
            match policy {
                ResolvePolicy::Strict => tracing::warn!(
                    "Dropping {}: unresolvable dependencies [{}]",
                    grouping.name(),
                    missing.join(", ")
                ),
                ResolvePolicy::Force => tracing::warn!(
                    "Forcing {} with unresolved dependencies [{}]",
                    grouping.name(),
                    missing.join(", ")
                ),
            }
        }

        if policy == ResolvePolicy::Force {
            ordered.extend(remainder);
        }

        for (index, grouping) in ordered.iter_mut().enumerate() {
            grouping.index = index;
        }

        tracing::info!(
            "Resolved {} of {} groupings ({} unresolved, policy {policy})",
            total - unresolved.len(),
            total,
            unresolved.len()
        );

        Resolution {
            resolver: Resolver { groupings: ordered },
            unresolved,
        }
    }
}

impl IntoIterator for Resolver {
    type Item = Grouping;
    type IntoIter = std::vec::IntoIter<Grouping>;

    fn into_iter(self) -> Self::IntoIter {
        self.groupings.into_iter()
    }
}

impl<'a> IntoIterator for &'a Resolver {
    type Item = &'a Grouping;
    type IntoIter = std::slice::Iter<'a, Grouping>;

    fn into_iter(self) -> Self::IntoIter {
        self.groupings.iter()
    }
}
