//! Batch manifests.
//!
//! A manifest is a JSON description of a batch: each entry names an
//! operation or a prebuilt job and refers to its dependencies by key.
//!
//! ```json
//! {
//!   "entries": [
//!     { "key": "plate", "kind": "command", "name": "copy plate",
//!       "command": ["rsync", "-a", "/in/", "/out/"] },
//!     { "key": "comp", "kind": "nuke", "name": "comp", "depend_on": ["plate"],
//!       "fields": { "script": "/shots/comp_v001.nk", "frange": "1001-1100" } },
//!     { "key": "notify", "kind": "script", "module": "studio.ops", "class": "Notify",
//!       "fields": { "channel": "#comp" }, "depend_on": ["comp"] }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{bail, Context, Result};
use rifs_core::{
    CommandOperation, Config, Job, OperationCore, OperationId, Reference, ScriptOperation,
    Workspace,
};
use rifs_pipeline::Submittable;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::operations::{NukeFlags, NukeRender};

/// A parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// One manifest entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    /// Unique within the manifest; used by `depend_on`.
    pub key: String,
    /// `script`, `command`, `nuke`, or `job`. Anything else is carried as an
    /// unsupported item and skipped at build time.
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub note: String,
    /// Module defining a `script` entry's class.
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    /// Explicit namespace, overriding `module` in the generated script.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub depend_on: Vec<String>,
    #[serde(default)]
    pub submission_fields: BTreeMap<String, Value>,
}

impl Entry {
    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.key.clone())
    }
}

#[derive(Debug, Deserialize)]
struct NukeFields {
    script: String,
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default)]
    frange: String,
    #[serde(flatten)]
    flags: NukeFlags,
}

/// An entry after the first pass: identity assigned, dependencies pending.
enum Staged {
    Operation(OperationCore),
    Job(Job),
    Unsupported(String),
}

impl Manifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(text).context("invalid manifest JSON")?;
        manifest.check_keys()?;
        Ok(manifest)
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in manifest {}", path.display()))
    }

    fn check_keys(&self) -> Result<()> {
        let mut seen = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if let Some(first) = seen.insert(entry.key.as_str(), i) {
                bail!(
                    "duplicate key '{}' (entries {} and {})",
                    entry.key,
                    first,
                    i
                );
            }
        }
        Ok(())
    }

    /// Create the operations and jobs the manifest describes.
    ///
    /// Every operation gets a fresh workspace under the configured root.
    /// Dependencies on keys that name no entry are kept as references to an
    /// operation outside the batch, which the resolver cannot satisfy.
    pub fn into_batch(self, config: &Config) -> Result<Vec<Submittable>> {
        let root = config.farm.workspace_root()?;
        let mut staged = Vec::with_capacity(self.entries.len());
        let mut refs: HashMap<String, Reference> = HashMap::new();

        for entry in &self.entries {
            let stage = match entry.kind.as_str() {
                "script" | "command" | "nuke" => {
                    let workspace = Workspace::create_in(&root).with_context(|| {
                        format!("failed to create workspace for '{}'", entry.key)
                    })?;
                    let mut core = OperationCore::new(entry.display_name(), workspace)
                        .with_note(entry.note.clone());
                    core.namespace = entry.namespace.clone();
                    core.submission_fields = entry.submission_fields.clone();
                    refs.insert(entry.key.clone(), Reference::Operation(core.id()));
                    Staged::Operation(core)
                }
                "job" => {
                    let job = build_job(entry, config)?;
                    refs.insert(entry.key.clone(), Reference::Job(job.id));
                    Staged::Job(job)
                }
                other => Staged::Unsupported(format!("{} (kind '{other}')", entry.key)),
            };
            staged.push(stage);
        }

        let mut batch = Vec::with_capacity(staged.len());
        for (entry, stage) in self.entries.into_iter().zip(staged) {
            let depend_on: Vec<Reference> = entry
                .depend_on
                .iter()
                .map(|key| {
                    refs.get(key).copied().unwrap_or_else(|| {
                        tracing::warn!(
                            "'{}' depends on unknown key '{key}'; it will not resolve",
                            entry.key
                        );
                        Reference::Operation(OperationId::new())
                    })
                })
                .collect();

            let item = match stage {
                Staged::Operation(core) => {
                    let ops = operation_dependencies(&entry, &depend_on);
                    build_operation(entry, core.with_depend_on(ops))?
                }
                Staged::Job(mut job) => {
                    job.depend_on = depend_on;
                    Submittable::Job(job)
                }
                Staged::Unsupported(label) => Submittable::Unsupported { label },
            };
            batch.push(item);
        }

        Ok(batch)
    }
}

/// Operations can only wait on other operations. A dependency on a job entry
/// is kept as an operation reference that never resolves.
fn operation_dependencies(entry: &Entry, depend_on: &[Reference]) -> Vec<OperationId> {
    depend_on
        .iter()
        .zip(&entry.depend_on)
        .map(|(reference, key)| match reference {
            Reference::Operation(id) => *id,
            Reference::Job(_) => {
                tracing::warn!(
                    "'{}' is an operation and cannot depend on job '{key}'",
                    entry.key
                );
                OperationId::new()
            }
        })
        .collect()
}

fn build_job(entry: &Entry, config: &Config) -> Result<Job> {
    if entry.command.is_empty() {
        bail!("job '{}' has no command", entry.key);
    }
    let mut job = Job::new(&config.job, &config.farm);
    job.name = entry.display_name();
    job.notes = entry.note.clone();
    job.command = entry.command.clone();
    for (key, value) in &entry.submission_fields {
        if !job.apply_field(key, value)? {
            job.extra.insert(key.clone(), value.clone());
        }
    }
    Ok(job)
}

fn build_operation(entry: Entry, core: OperationCore) -> Result<Submittable> {
    let item = match entry.kind.as_str() {
        "command" => {
            if entry.command.is_empty() {
                bail!("command entry '{}' has no command", entry.key);
            }
            Submittable::operation(CommandOperation::new(core, entry.command))
        }
        "nuke" => {
            let fields: NukeFields = serde_json::from_value(Value::Object(entry.fields))
                .with_context(|| format!("invalid fields for nuke entry '{}'", entry.key))?;
            Submittable::operation(NukeRender::new(
                core,
                fields.script,
                fields.nodes,
                fields.frange,
                fields.flags,
            ))
        }
        _ => {
            let module = entry
                .module
                .with_context(|| format!("script entry '{}' has no module", entry.key))?;
            let class = entry
                .class
                .with_context(|| format!("script entry '{}' has no class", entry.key))?;
            let op = entry
                .fields
                .into_iter()
                .fold(ScriptOperation::new(core, module, class), |op, (name, value)| {
                    op.with_field(name, value)
                });
            Submittable::operation(op)
        }
    };
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rifs_core::Execution;

    fn config(root: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.farm.workspace_root = root.path().display().to_string();
        config
    }

    fn batch(json: &str) -> (tempfile::TempDir, Vec<Submittable>) {
        let root = tempfile::tempdir().unwrap();
        let items = Manifest::from_json(json)
            .unwrap()
            .into_batch(&config(&root))
            .unwrap();
        (root, items)
    }

    fn op(item: &Submittable) -> &dyn rifs_core::Operation {
        match item {
            Submittable::Operation(op) => &**op,
            other => panic!("expected an operation, got {other:?}"),
        }
    }

    #[test]
    fn resolves_keys_to_ids() {
        let (_root, items) = batch(
            r#"{"entries": [
                {"key": "a", "kind": "command", "command": ["true"]},
                {"key": "b", "kind": "command", "command": ["true"], "depend_on": ["a"]}
            ]}"#,
        );
        let a = op(&items[0]);
        let b = op(&items[1]);
        assert_eq!(b.core().depend_on, vec![a.id()]);
        assert_eq!(a.name(), "a");
    }

    #[test]
    fn script_entry_keeps_fields() {
        let (_root, items) = batch(
            r#"{"entries": [
                {"key": "n", "kind": "script", "name": "notify", "module": "studio.ops",
                 "class": "Notify", "fields": {"channel": "comp"}, "namespace": "studio.farm"}
            ]}"#,
        );
        let n = op(&items[0]);
        assert_eq!(n.type_name(), "Notify");
        assert_eq!(n.namespace(), "studio.farm");
        assert_eq!(n.fields().get("channel").unwrap().value, Value::from("comp"));
        assert!(n.is_materializable());
    }

    #[test]
    fn nuke_entry_builds_command() {
        let (_root, items) = batch(
            r#"{"entries": [
                {"key": "c", "kind": "nuke",
                 "fields": {"script": "/s/comp.nk", "frange": "1-5", "gpu": true}}
            ]}"#,
        );
        let c = op(&items[0]);
        assert_eq!(
            c.execution(),
            Execution::Command(
                ["nuke-race", "-t", "-x", "--gpu", "-F", "1-5", "--", "/s/comp.nk"]
                    .map(String::from)
                    .to_vec()
            )
        );
    }

    #[test]
    fn job_entries_depend_by_reference() {
        let (_root, items) = batch(
            r#"{"entries": [
                {"key": "a", "kind": "command", "command": ["true"]},
                {"key": "j", "kind": "job", "command": ["echo", "hi"], "depend_on": ["a"],
                 "submission_fields": {"cpus": 4, "shot": "rd1212"}}
            ]}"#,
        );
        let a_id = op(&items[0]).id();
        let Submittable::Job(job) = &items[1] else {
            panic!("expected a job");
        };
        assert_eq!(job.depend_on, vec![Reference::Operation(a_id)]);
        assert_eq!(job.cpus, 4);
        assert_eq!(job.extra["shot"], Value::from("rd1212"));
    }

    #[test]
    fn unknown_keys_and_kinds() {
        let (_root, items) = batch(
            r#"{"entries": [
                {"key": "a", "kind": "command", "command": ["true"], "depend_on": ["ghost"]},
                {"key": "w", "kind": "write-node"}
            ]}"#,
        );
        assert_eq!(op(&items[0]).core().depend_on.len(), 1);
        assert!(matches!(&items[1], Submittable::Unsupported { label } if label.contains("write-node")));
    }

    #[test]
    fn rejects_duplicate_keys_and_bad_entries() {
        let dup = r#"{"entries": [{"key": "a", "kind": "job"}, {"key": "a", "kind": "job"}]}"#;
        assert!(Manifest::from_json(dup).is_err());

        let root = tempfile::tempdir().unwrap();
        let missing_class = r#"{"entries": [{"key": "a", "kind": "script", "module": "m"}]}"#;
        assert!(Manifest::from_json(missing_class)
            .unwrap()
            .into_batch(&config(&root))
            .is_err());

        let empty_job = r#"{"entries": [{"key": "j", "kind": "job"}]}"#;
        assert!(Manifest::from_json(empty_job)
            .unwrap()
            .into_batch(&config(&root))
            .is_err());
    }
}
