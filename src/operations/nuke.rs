//! Nuke render operation.
//!
//! Renders a Nuke script on the farm through `nuke-race`. The operation runs
//! its own command line, so no script is materialized for it.

use std::path::Path;

use rifs_core::{Execution, Field, FieldMeta, Operation, OperationCore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Base command: terminal mode, execute.
const BASE_COMMAND: &[&str] = &["nuke-race", "-t", "-x"];

/// Optional `nuke-race` switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NukeFlags {
    /// Enable GPU usage in terminal mode.
    pub gpu: bool,
    /// Obey the render order of Write nodes so Reads can use earlier outputs.
    pub render_order: bool,
    /// Use an interactive license instead of a render license.
    pub interactive: bool,
    pub proxy_mode: bool,
    pub full_size: bool,
    /// Direct all writes to null.
    pub not_writes: bool,
    /// Scanline-by-scanline, on-demand rendering.
    pub classic_rendering: bool,
    /// Node-by-node rendering from the top of the graph. Faster than classic
    /// rendering but uses more memory.
    pub topdown: bool,
}

impl NukeFlags {
    /// Enabled switches in command line order.
    fn switches(&self) -> Vec<&'static str> {
        [
            (self.gpu, "--gpu"),
            (self.render_order, "--sro"),
            (self.interactive, "-i"),
            (self.proxy_mode, "-p"),
            (self.full_size, "-f"),
            (self.not_writes, "--rendertonull"),
            (self.classic_rendering, "--classic_rendering"),
            (self.topdown, "--topdown"),
        ]
        .into_iter()
        .filter_map(|(on, flag)| on.then_some(flag))
        .collect()
    }
}

/// Render a Nuke script, optionally limited to some Write nodes and a frame
/// range (`A`, `A-B` or `A-BxC`).
#[derive(Debug)]
pub struct NukeRender {
    core: OperationCore,
    script: String,
    nodes: Vec<String>,
    frange: String,
    flags: NukeFlags,
    command: Vec<String>,
}

impl NukeRender {
    /// Build the operation and its command line.
    ///
    /// The note becomes `Nuke | <script file> | <frange> | <note>` and the
    /// script path and frame range are added to the submission fields as
    /// `outputImage` and `frame_range`.
    pub fn new(
        mut core: OperationCore,
        script: impl Into<String>,
        nodes: Vec<String>,
        frange: impl Into<String>,
        flags: NukeFlags,
    ) -> Self {
        let script = script.into();
        let frange = frange.into();

        let basename = Path::new(&script)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let note = if core.note.is_empty() { "NA" } else { core.note.as_str() };
        core.note = format!("Nuke | {basename} | {frange} | {note}");

        core.submission_fields
            .insert("outputImage".into(), Value::String(script.clone()));
        core.submission_fields
            .insert("frame_range".into(), Value::String(frange.clone()));

        let command = build_command(&script, &nodes, &frange, &flags);

        Self {
            core,
            script,
            nodes,
            frange,
            flags,
            command,
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

fn build_command(script: &str, nodes: &[String], frange: &str, flags: &NukeFlags) -> Vec<String> {
    let mut command: Vec<String> = BASE_COMMAND.iter().map(|s| s.to_string()).collect();
    command.extend(flags.switches().into_iter().map(String::from));

    if !frange.is_empty() {
        command.extend(["-F".to_string(), frange.to_string()]);
    }
    if !nodes.is_empty() {
        command.retain(|arg| arg != "-x");
        command.extend(["-X".to_string(), nodes.join(",")]);
    }
    command.extend(["--".to_string(), script.to_string()]);
    command
}

impl Operation for NukeRender {
    fn core(&self) -> &OperationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperationCore {
        &mut self.core
    }

    fn type_name(&self) -> String {
        "NukeRender".into()
    }

    fn module(&self) -> String {
        module_path!().replace("::", ".")
    }

    fn declared_fields(&self) -> Vec<Field> {
        vec![
            Field::init("script", self.script.as_str()),
            Field::init("nodes", json!(self.nodes)),
            Field::init("frange", self.frange.as_str()),
            Field::init("flags", serde_json::to_value(self.flags).unwrap_or(Value::Null)),
            Field::new("command", json!(self.command), FieldMeta::DERIVED_EXEMPT),
        ]
    }

    fn execution(&self) -> Execution {
        Execution::Command(self.command.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rifs_core::Workspace;

    fn core(root: &tempfile::TempDir) -> OperationCore {
        OperationCore::new("comp", Workspace::create_in(root.path()).unwrap())
    }

    const SCRIPT: &str = "/shows/BIMINI/RD/1212/comp/rd1212_comp_v001.nk";

    #[test]
    fn minimal_command() {
        let root = tempfile::tempdir().unwrap();
        let op = NukeRender::new(core(&root), SCRIPT, vec![], "", NukeFlags::default());
        assert_eq!(op.command(), ["nuke-race", "-t", "-x", "--", SCRIPT]);
    }

    #[test]
    fn frame_range_and_nodes() {
        let root = tempfile::tempdir().unwrap();
        let op = NukeRender::new(
            core(&root),
            SCRIPT,
            vec!["DDWrite.Write".into(), "Write2".into()],
            "1009-1184",
            NukeFlags::default(),
        );
        assert_eq!(
            op.command(),
            ["nuke-race", "-t", "-F", "1009-1184", "-X", "DDWrite.Write,Write2", "--", SCRIPT]
        );
    }

    #[test]
    fn flags_follow_declaration_order() {
        let root = tempfile::tempdir().unwrap();
        let flags = NukeFlags {
            topdown: true,
            gpu: true,
            not_writes: true,
            ..NukeFlags::default()
        };
        let op = NukeRender::new(core(&root), SCRIPT, vec![], "1-10x2", flags);
        assert_eq!(
            op.command(),
            [
                "nuke-race",
                "-t",
                "-x",
                "--gpu",
                "--rendertonull",
                "--topdown",
                "-F",
                "1-10x2",
                "--",
                SCRIPT
            ]
        );
    }

    #[test]
    fn note_and_submission_fields() {
        let root = tempfile::tempdir().unwrap();
        let op = NukeRender::new(core(&root), SCRIPT, vec![], "1001", NukeFlags::default());
        assert_eq!(op.core().note, "Nuke | rd1212_comp_v001.nk | 1001 | NA");
        assert_eq!(op.core().submission_fields["outputImage"], json!(SCRIPT));
        assert_eq!(op.core().submission_fields["frame_range"], json!("1001"));

        let root = tempfile::tempdir().unwrap();
        let op = NukeRender::new(
            core(&root).with_note("final"),
            SCRIPT,
            vec![],
            "",
            NukeFlags::default(),
        );
        assert_eq!(op.core().note, "Nuke | rd1212_comp_v001.nk |  | final");
    }

    #[test]
    fn runs_as_direct_command() {
        let root = tempfile::tempdir().unwrap();
        let op = NukeRender::new(core(&root), SCRIPT, vec![], "", NukeFlags::default());
        assert!(!op.is_materializable());
        assert_eq!(op.execution(), Execution::Command(op.command().to_vec()));
        assert_eq!(op.module(), "rifs.operations.nuke");
    }
}
