//! Per-operation workspace directories.
//!
//! Every operation owns exactly one [`Workspace`]: a uniquely named directory
//! under `<root>/<YYYYmmdd-HHMM>/<8 hex digits>` that holds its materialized
//! artifacts. Workspaces are never shared and are not removed on drop; the
//! farm needs the scripts long after the submitting process has exited.
//! Removal is the explicit [`Workspace::teardown`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Attempts at finding an unused directory name before giving up.
const MAX_NAME_ATTEMPTS: usize = 16;

/// An exclusively owned artifact directory.
#[derive(Debug, PartialEq, Eq)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `root`.
    ///
    /// The leaf directory is created with `create_dir`, so two workspaces can
    /// never end up sharing a directory even if their random names collide.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the dated bucket cannot be created, and
    /// [`Error::Workspace`] if no unused name is found.
    pub fn create_in(root: &Path) -> Result<Self> {
        let bucket = root.join(chrono::Local::now().format("%Y%m%d-%H%M").to_string());
        std::fs::create_dir_all(&bucket)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
            let path = bucket.join(name);
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    tracing::debug!("Created workspace {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::workspace(
            bucket,
            format!("no unused workspace name after {MAX_NAME_ATTEMPTS} attempts"),
        ))
    }

    /// Path to the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the workspace and everything in it. Removing an already missing
    /// workspace is not an error.
    pub fn teardown(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::workspace(&self.path, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_dated_unique_directory() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create_in(root.path()).unwrap();

        assert!(ws.path().is_dir());
        assert!(ws.path().starts_with(root.path()));
        let leaf = ws.path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(leaf.len(), 8);
        let bucket = ws.path().parent().unwrap().file_name().unwrap();
        assert_eq!(bucket.to_string_lossy().len(), "20240101-1200".len());
    }

    #[test]
    fn workspaces_are_never_shared() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create_in(root.path()).unwrap();
        let b = Workspace::create_in(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn file_inside_workspace() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create_in(root.path()).unwrap();
        let script = ws.file("rif_demo.py");
        assert!(script.starts_with(ws.path()));
        assert_eq!(script.file_name().unwrap(), "rif_demo.py");
    }

    #[test]
    fn workspace_survives_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = Workspace::create_in(root.path()).unwrap().path().to_path_buf();
        assert!(path.is_dir());
    }

    #[test]
    fn teardown_removes_and_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create_in(root.path()).unwrap();
        std::fs::write(ws.file("rif_demo.py"), "print()").unwrap();

        ws.teardown().unwrap();
        assert!(!ws.path().exists());
        ws.teardown().unwrap();
    }
}
