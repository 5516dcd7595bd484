//! Staging files and their cleanup.
//!
//! A run writes into a [`StagingArtifact`] created next to the final output
//! and publishes it with a rename, so the output path only ever holds a
//! complete artifact. The artifact deletes itself when dropped unpublished.
//! Each live artifact is also recorded in a process-wide registry that a
//! [`CleanupGuard`] sweeps at exit, for paths that skip destructors.

use crate::error::CombinatorError;
use crate::exclude::STAGING_SUFFIX;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// A set of live staging files.
#[derive(Debug, Default)]
pub struct StagingRegistry {
    paths: Mutex<BTreeSet<PathBuf>>,
}

static GLOBAL: StagingRegistry = StagingRegistry::new();

/// The process-wide registry every [`StagingArtifact`] records itself in.
pub fn global() -> &'static StagingRegistry {
    &GLOBAL
}

impl StagingRegistry {
    pub const fn new() -> Self {
        Self {
            paths: Mutex::new(BTreeSet::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, path: &Path) {
        self.lock().insert(path.to_path_buf());
    }

    pub fn unregister(&self, path: &Path) {
        self.lock().remove(path);
    }

    pub fn registered(&self) -> Vec<PathBuf> {
        self.lock().iter().cloned().collect()
    }

    /// Removes every registered staging file that still exists.
    ///
    /// Safe to call repeatedly; files already gone are forgotten silently.
    /// Returns how many files were removed.
    pub fn cleanup(&self) -> usize {
        let paths = std::mem::take(&mut *self.lock());
        let mut removed = 0;
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Cleaned up staging file: {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!("Could not remove staging file {}: {}", path.display(), e)
                }
            }
        }
        removed
    }
}

/// Sweeps the staging registry when dropped. Hold one for the lifetime of
/// `main`.
#[derive(Debug)]
#[must_use = "the registry is swept when the guard is dropped"]
pub struct CleanupGuard {
    _private: (),
}

pub fn install_cleanup_guard() -> CleanupGuard {
    CleanupGuard { _private: () }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        global().cleanup();
    }
}

fn closed() -> io::Error {
    io::Error::other("staging artifact already closed")
}

/// A temporary file owned by one run.
#[derive(Debug)]
pub struct StagingArtifact {
    path: PathBuf,
    writer: Option<BufWriter<NamedTempFile>>,
}

impl StagingArtifact {
    /// Creates a staging file in the directory of `output`, creating that
    /// directory when missing.
    pub fn create_for(output: &Path) -> Result<Self, CombinatorError> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| CombinatorError::io(&dir, e))?;
        let file = tempfile::Builder::new()
            .prefix(".filecombinator-")
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|e| CombinatorError::io(&dir, e))?;
        let path = file.path().to_path_buf();
        global().register(&path);
        tracing::debug!("Created staging file: {}", path.display());
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<NamedTempFile>> {
        self.writer.as_mut().ok_or_else(closed)
    }

    /// Flushes, syncs and atomically renames the staging file to `output`.
    ///
    /// On failure the staging file is deleted and nothing is written at
    /// `output`.
    pub fn publish(mut self, output: &Path) -> Result<(), CombinatorError> {
        let Some(writer) = self.writer.take() else {
            return Err(CombinatorError::io(&self.path, closed()));
        };
        let file = writer
            .into_inner()
            .map_err(|e| CombinatorError::io(&self.path, e.into_error()))?;
        file.as_file()
            .sync_all()
            .map_err(|e| CombinatorError::io(&self.path, e))?;
        file.persist(output)
            .map_err(|e| CombinatorError::io(output, e.error))?;
        global().unregister(&self.path);
        tracing::debug!(
            "Published staging file {} to {}",
            self.path.display(),
            output.display()
        );
        Ok(())
    }

    /// Deletes the staging file now, reporting any failure.
    pub fn discard(mut self) -> Result<(), CombinatorError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let (file, _) = writer.into_parts();
        let result = file.close().map_err(|e| CombinatorError::io(&self.path, e));
        if result.is_ok() {
            global().unregister(&self.path);
            tracing::debug!("Deleted staging file: {}", self.path.display());
        }
        result
    }
}

impl Write for StagingArtifact {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Drop for StagingArtifact {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            // NamedTempFile removes the file on drop.
            let (file, _) = writer.into_parts();
            drop(file);
            tracing::debug!("Dropped unpublished staging file: {}", self.path.display());
        }
        global().unregister(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn publish_moves_into_place() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested/out.txt");
        let mut staging = StagingArtifact::create_for(&output).unwrap();
        let staged = staging.path().to_path_buf();
        assert!(staged.starts_with(dir.path().join("nested")));
        assert!(global().registered().contains(&staged));

        staging.write_all(b"payload").unwrap();
        staging.publish(&output).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "payload");
        assert!(!staged.exists());
        assert!(!global().registered().contains(&staged));
    }

    #[test]
    fn drop_deletes_unpublished_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let staged = {
            let mut staging = StagingArtifact::create_for(&output).unwrap();
            staging.write_all(b"partial").unwrap();
            staging.path().to_path_buf()
        };
        assert!(!staged.exists());
        assert!(!output.exists());
        assert!(!global().registered().contains(&staged));
    }

    #[test]
    fn discard_deletes_file() {
        let dir = tempdir().unwrap();
        let staging = StagingArtifact::create_for(&dir.path().join("out.txt")).unwrap();
        let staged = staging.path().to_path_buf();
        staging.discard().unwrap();
        assert!(!staged.exists());
    }

    #[test]
    fn failed_publish_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let mut staging = StagingArtifact::create_for(&output).unwrap();
        let staged = staging.path().to_path_buf();
        staging.write_all(b"data").unwrap();
        // A directory in the way makes the rename fail.
        let blocked = dir.path().join("taken");
        fs::create_dir_all(blocked.join("child")).unwrap();

        assert!(staging.publish(&blocked).is_err());
        assert!(!staged.exists());
        assert!(blocked.join("child").is_dir());
    }

    #[test]
    fn cleanup_tolerates_missing_files() {
        let dir = tempdir().unwrap();
        let stray = dir.path().join("stray_file_combinator_output.txt");
        fs::write(&stray, "x").unwrap();
        let registry = StagingRegistry::new();
        registry.register(&stray);
        registry.register(&dir.path().join("gone_file_combinator_output.txt"));

        assert_eq!(registry.cleanup(), 1);
        assert!(!stray.exists());
        assert!(registry.registered().is_empty());
        assert_eq!(registry.cleanup(), 0);
    }
}
