//! Unified error type for the rifs toolkit.
//!
//! All crates funnel their failures into [`Error`]. Only a handful of these
//! are hard failures for a batch: I/O during materialization and malformed
//! input to the single-operation entry point. Dependency problems and
//! submission failures are reported through logs and outcome records instead.

use std::path::PathBuf;

/// Unified error type covering all failure modes in rifs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed (workspace creation, script writes, reads).
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A workspace directory could not be created or removed.
    #[error("Workspace error [{}]: {message}", path.display())]
    Workspace {
        /// The directory involved.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// A field could not be copied from an operation onto its job.
    #[error("Field copy error [{field}]: {message}")]
    FieldCopy {
        /// Name of the offending field.
        field: String,
        /// Human-readable error description.
        message: String,
    },

    /// Input that is neither an operation nor a job was handed to an entry
    /// point that only accepts those.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// A generated script or keyword literal could not be parsed.
    #[error("Literal error at offset {offset}: {message}")]
    Literal {
        /// Byte offset into the parsed text.
        offset: usize,
        /// Human-readable error description.
        message: String,
    },

    /// An external tool could not be found or launched.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Convenience constructor for [`Error::Workspace`].
    pub fn workspace(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Workspace {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::FieldCopy`].
    pub fn field_copy(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FieldCopy {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Literal`].
    pub fn literal(offset: usize, message: impl Into<String>) -> Self {
        Error::Literal {
            offset,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn workspace_display() {
        let err = Error::workspace("/farm/rif/abc", "already exists");
        assert_eq!(
            err.to_string(),
            "Workspace error [/farm/rif/abc]: already exists"
        );
    }

    #[test]
    fn field_copy_display() {
        let err = Error::field_copy("cpus", "expected an unsigned integer");
        assert_eq!(
            err.to_string(),
            "Field copy error [cpus]: expected an unsigned integer"
        );
    }

    #[test]
    fn unsupported_display() {
        let err = Error::UnsupportedInput("render-node".into());
        assert_eq!(err.to_string(), "Unsupported input: render-node");
    }

    #[test]
    fn literal_display() {
        let err = Error::literal(12, "unterminated string");
        assert_eq!(err.to_string(), "Literal error at offset 12: unterminated string");
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("nuke-race", "not found on PATH");
        assert_eq!(err.to_string(), "Tool error [nuke-race]: not found on PATH");
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<u32> {
            Ok(2)
        }
        assert_eq!(ok_fn().unwrap(), 2);

        fn err_fn() -> Result<u32> {
            Err(Error::Validation("bad".into()))
        }
        assert!(err_fn().is_err());
    }
}
