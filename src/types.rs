use crate::classify::FileKind;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Metadata of one admitted file, as written in its block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the source root, `/`-separated.
    pub relative_path: String,
    pub kind: FileKind,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
}

/// Counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Text files whose content was written.
    pub processed: usize,
    /// Files that could not be read or inspected.
    pub skipped: usize,
    pub binary: usize,
    pub image: usize,
}

/// Relative paths per kind, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLists {
    pub text: Vec<String>,
    pub binary: Vec<String>,
    pub image: Vec<String>,
}

/// Running totals of a run.
///
/// Recording is not idempotent: recording the same file twice counts it
/// twice. A real walk visits each path once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tally {
    pub stats: RunStats,
    pub lists: FileLists,
}

impl Tally {
    /// Counts a successfully handled file under its kind.
    pub fn record(&mut self, kind: FileKind, relative_path: &str) {
        let (counter, list) = match kind {
            FileKind::Text => (&mut self.stats.processed, &mut self.lists.text),
            FileKind::Binary => (&mut self.stats.binary, &mut self.lists.binary),
            FileKind::Image => (&mut self.stats.image, &mut self.lists.image),
        };
        *counter += 1;
        list.push(relative_path.to_string());
    }

    pub fn skip(&mut self) {
        self.stats.skipped += 1;
    }
}

/// The result of a published run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineReport {
    pub stats: RunStats,
    pub lists: FileLists,
    /// One record per emitted block, in output order.
    pub records: Vec<FileRecord>,
    /// Where the artifact was published.
    pub output: PathBuf,
    pub duration: Duration,
}
