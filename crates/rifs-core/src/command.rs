//! Builder for running external commands.
//!
//! Runs block until the child exits. There is no timeout at this layer.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{Error, Result};

/// Output captured from a finished process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for an external process invocation.
///
/// The child inherits the current environment.
///
/// # Example
///
/// ```no_run
/// use rifs_core::ToolCommand;
/// use std::path::PathBuf;
///
/// let output = ToolCommand::new(PathBuf::from("python"))
///     .arg("/farm/rif/20240101-1200/1a2b3c4d/rif_demorif.py")
///     .output()?;
/// println!("{}", output.stdout);
/// # Ok::<(), rifs_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    /// Build a command from a token list: the first token is the program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty token list.
    pub fn from_tokens(tokens: &[String]) -> Result<Self> {
        let (program, args) = tokens
            .split_first()
            .ok_or_else(|| Error::Validation("empty command".into()))?;
        let mut cmd = Self::new(PathBuf::from(program));
        cmd.args(args.iter().cloned());
        Ok(cmd)
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the command to completion and capture its output, whatever the
    /// exit status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] only if the process could not be spawned or
    /// waited on.
    pub fn output(&self) -> Result<ToolOutput> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::tool(self.program_name(), format!("failed to spawn: {e}")))?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Run the command and require a zero exit status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] on spawn failure or a non-zero exit (the
    /// message includes stderr).
    pub fn execute(&self) -> Result<ToolOutput> {
        let output = self.output()?;
        if !output.status.success() {
            return Err(Error::tool(
                self.program_name(),
                format!(
                    "exited with status {}: {}",
                    output.status,
                    output.stderr.trim()
                ),
            ));
        }
        Ok(output)
    }
}
