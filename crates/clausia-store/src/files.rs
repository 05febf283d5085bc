//! Local file vault for uploaded documents.

use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::StoreError;

/// Directory-backed blob store addressed by relative paths such as
/// `tenant/matter/1700000000000_MSA.pdf`.
pub struct FileVault {
    root: PathBuf,
}

impl FileVault {
    /// Open a vault rooted at `root`, creating the directory if needed.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` at `relative`, creating parent directories.
    pub fn put(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        info!(path = relative, size = bytes.len(), "stored file");
        Ok(path)
    }

    /// Delete the file at `relative`. A file that is already gone is not an error.
    pub fn remove(&self, relative: &str) -> Result<(), StoreError> {
        let path = self.resolve(relative)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = relative, "removed file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = relative, "file already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Join `relative` onto the root, refusing absolute paths and `..`.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(relative);
        let plain = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if relative.is_empty() || !plain {
            return Err(StoreError::Validation(format!(
                "file path must be relative and inside the vault: {relative:?}"
            )));
        }
        Ok(self.root.join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_remove() {
        let tmp = tempfile::TempDir::new().unwrap();
        let vault = FileVault::open(&tmp.path().join("files")).unwrap();

        let path = vault.put("t1/m1/1_MSA.pdf", b"%PDF-1.7").unwrap();
        assert!(path.starts_with(vault.root()));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");

        vault.remove("t1/m1/1_MSA.pdf").unwrap();
        assert!(!path.exists());
        // Second removal is a no-op.
        vault.remove("t1/m1/1_MSA.pdf").unwrap();
    }

    #[test]
    fn rejects_escaping_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let vault = FileVault::open(tmp.path()).unwrap();
        assert!(matches!(vault.put("../evil", b"x"), Err(StoreError::Validation(_))));
        assert!(matches!(vault.put("/etc/passwd", b"x"), Err(StoreError::Validation(_))));
        assert!(matches!(vault.put("", b"x"), Err(StoreError::Validation(_))));
    }
}
