//! External tool detection.

use std::path::PathBuf;

use crate::command::ToolCommand;
use crate::error::{Error, Result};

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// First line of its version output, if any.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check whether a tool is on `PATH` and ask it for a version string.
pub fn check_tool(name: &str, version_arg: &str) -> ToolInfo {
    let Ok(path) = which::which(name) else {
        return ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        };
    };

    let version = ToolCommand::new(path.clone())
        .arg(version_arg)
        .execute()
        .ok()
        .and_then(|out| {
            // Python 2 prints its version on stderr.
            let text = if out.stdout.trim().is_empty() {
                out.stderr
            } else {
                out.stdout
            };
            text.lines().next().map(|s| s.trim().to_string())
        });

    ToolInfo {
        name: name.to_string(),
        available: true,
        version,
        path: Some(path),
    }
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns [`Error::Tool`] if the tool cannot be found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|e| Error::tool(name, format!("not found: {e}")))
}
