//! Writing operations out as scripts, and reading them back.

use std::path::{Path, PathBuf};

use rifs_core::{Error, Operation, Result};
use serde_json::Value;

use crate::literal;
use crate::template::TemplateContext;

/// The script every materializable operation is rendered into.
pub const SCRIPT_TEMPLATE: &str = "
from {module} import {class_name}

kwargs = {kwargs}

{class_name}(**kwargs)()
";

/// Artifact file name for an operation: `rif_<lowercased type name>.py`.
pub fn script_file_name(op: &dyn Operation) -> String {
    format!("rif_{}.py", op.type_name().to_lowercase())
}

/// Render the script for an operation without touching the filesystem.
pub fn render_script(op: &dyn Operation) -> String {
    let kwargs = op.fields().constructor_kwargs();
    TemplateContext::new()
        .with_var("module", op.namespace())
        .with_var("class_name", op.type_name())
        .with_var("kwargs", literal::render_kwargs(&kwargs))
        .substitute(SCRIPT_TEMPLATE)
}

/// Write the operation's script into its workspace.
///
/// Returns `None` for direct-command operations, which need no script.
/// Materializing again overwrites the artifact with identical content.
///
/// # Errors
///
/// Returns [`Error::Io`] if the workspace is missing or not writable.
pub fn materialize(op: &dyn Operation) -> Result<Option<PathBuf>> {
    if !op.is_materializable() {
        tracing::debug!("{} runs a direct command; no script needed", op.name());
        return Ok(None);
    }

    let path = op.core().workspace().file(&script_file_name(op));
    std::fs::write(&path, render_script(op))?;
    tracing::debug!("Materialized {} to {}", op.name(), path.display());
    Ok(Some(path))
}

/// What a generated script rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInfo {
    pub module: String,
    pub class_name: String,
    pub kwargs: Vec<(String, Value)>,
}

impl ScriptInfo {
    /// Parse the text of a generated script.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a template line is missing and
    /// [`Error::Literal`] when the keyword dict does not parse.
    pub fn parse(text: &str) -> Result<Self> {
        let mut import = None;
        let mut kwargs = None;

        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("from ") {
                if let Some((module, class_name)) = rest.split_once(" import ") {
                    import = Some((module.trim().to_string(), class_name.trim().to_string()));
                }
            } else if let Some(rest) = line.strip_prefix("kwargs = ") {
                kwargs = Some(literal::parse_kwargs(rest)?);
            }
        }

        let (module, class_name) =
            import.ok_or_else(|| Error::Validation("script has no import line".into()))?;
        let kwargs =
            kwargs.ok_or_else(|| Error::Validation("script has no kwargs line".into()))?;

        let call = format!("{class_name}(**kwargs)()");
        if !text.lines().any(|line| line.trim() == call) {
            return Err(Error::Validation(format!("script never calls {class_name}")));
        }

        Ok(Self {
            module,
            class_name,
            kwargs,
        })
    }
}

/// Read a materialized script back.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, otherwise the errors of
/// [`ScriptInfo::parse`].
pub fn read_script(path: &Path) -> Result<ScriptInfo> {
    let text = std::fs::read_to_string(path)?;
    ScriptInfo::parse(&text)
}
