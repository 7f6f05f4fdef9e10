//! Per-session workspace provisioning.
//!
//! Each session owns exactly one disposable directory holding the fetched
//! source and every artifact produced from it. The directory is removed when
//! the workspace is dropped, so cancelled or failed sessions leave nothing
//! behind. No two sessions ever share a workspace.

use std::io;
use std::path::Path;

use tempfile::{Builder, TempDir};

/// An isolated, disposable directory for one session's artifacts.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Allocate a fresh workspace.
    ///
    /// When `temp_root` is given the workspace is created under it
    /// (the root is created if missing); otherwise the system temp
    /// directory is used.
    pub fn create(temp_root: Option<&Path>) -> io::Result<Self> {
        let dir = match temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                Builder::new().prefix("vidpack-").tempdir_in(root)?
            }
            None => Builder::new().prefix("vidpack-").tempdir()?,
        };

        tracing::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Path of the workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_removed_on_drop() {
        let ws = Workspace::create(None).unwrap();
        let path = ws.path().to_path_buf();
        assert!(path.is_dir());

        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn workspace_under_custom_root() {
        let root = tempfile::TempDir::new().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        assert!(ws.path().starts_with(root.path()));
    }

    #[test]
    fn workspaces_are_distinct() {
        let a = Workspace::create(None).unwrap();
        let b = Workspace::create(None).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
