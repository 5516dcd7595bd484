use crate::classify::{Classifier, FileKind};
use crate::error::CombinatorError;
use crate::exclude::{ExclusionMatcher, absolutize};
use crate::options::CombinatorOptions;
use crate::output;
use crate::staging::StagingArtifact;
use crate::tree::render_snapshot;
use crate::types::{CombineReport, FileLists, FileRecord, RunStats, Tally};
use crate::walk::Snapshot;
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Component, Path};
use std::time::Instant;

/// Where a [`Combiner`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Staging,
    Walking,
    Finalizing,
    Published,
    Failed,
}

/// Runs one combine pass at a time: tree section, then one block per
/// admitted file, written to a staging file that is published at the end.
#[derive(Debug)]
pub struct Combiner {
    options: CombinatorOptions,
    matcher: ExclusionMatcher,
    classifier: Classifier,
    tally: Tally,
    records: Vec<FileRecord>,
    state: RunState,
}

impl Combiner {
    pub fn new(options: CombinatorOptions) -> Result<Self, CombinatorError> {
        let matcher = options.exclusion_matcher()?;
        let classifier = Classifier::from_mode(options.content_sniffing);
        Ok(Self {
            options,
            matcher,
            classifier,
            tally: Tally::default(),
            records: Vec::new(),
            state: RunState::Idle,
        })
    }

    /// Replaces the classifier chosen from the options.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stats(&self) -> RunStats {
        self.tally.stats
    }

    pub fn file_lists(&self) -> &FileLists {
        &self.tally.lists
    }

    pub fn matcher(&self) -> &ExclusionMatcher {
        &self.matcher
    }

    pub fn classify(&self, path: &Path) -> FileKind {
        self.classifier.classify(path)
    }

    /// Classifies `path` and counts it without writing any output.
    ///
    /// The listed path is relative to the source of the last run, or to
    /// `options.root` before any run. A file that cannot be statted counts
    /// as skipped and yields `None`. Calls are not idempotent: tracking a
    /// file twice counts it twice.
    pub fn track_file(&mut self, path: &Path) -> Option<FileKind> {
        if let Err(e) = fs::metadata(path) {
            tracing::debug!("Cannot track {}: {}", path.display(), e);
            self.tally.skip();
            return None;
        }
        let kind = self.classifier.classify(path);
        let relative = match self.matcher.root() {
            Some(root) => relative_path(root, &absolutize(path)),
            None => relative_path(&self.options.root, path),
        };
        self.tally.record(kind, &relative);
        Some(kind)
    }

    /// Combines `source` into `output`.
    ///
    /// Statistics and lists restart from zero. On error nothing is written
    /// at `output`, the staging file is gone, and the returned error is
    /// always [`CombinatorError::Processing`].
    pub fn run(
        &mut self,
        source: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<CombineReport, CombinatorError> {
        let (source, output) = (source.as_ref(), output.as_ref());
        let started = Instant::now();
        self.tally = Tally::default();
        self.records.clear();
        tracing::info!("Starting directory processing: {}", source.display());

        if let Err(e) = self.execute(source, output) {
            self.state = RunState::Failed;
            tracing::error!("Fatal error during processing: {}", e);
            return Err(CombinatorError::processing(e));
        }
        self.state = RunState::Published;

        let report = CombineReport {
            stats: self.tally.stats,
            lists: self.tally.lists.clone(),
            records: self.records.clone(),
            output: output.to_path_buf(),
            duration: started.elapsed(),
        };
        tracing::info!(
            "Processing completed in {:.2} seconds",
            report.duration.as_secs_f64()
        );
        log_statistics(&report);
        Ok(report)
    }

    fn execute(&mut self, source: &Path, output: &Path) -> Result<(), CombinatorError> {
        self.state = RunState::Staging;
        self.matcher.set_root(source);
        self.matcher.set_output_path(output);
        let mut staging = StagingArtifact::create_for(output)?;

        self.state = RunState::Walking;
        if let Err(e) = self.write_sections(source, &mut staging) {
            if let Err(cleanup) = staging.discard() {
                tracing::debug!("Staging cleanup failed: {}", cleanup);
            }
            return Err(e);
        }

        self.state = RunState::Finalizing;
        staging.publish(output)
    }

    fn write_sections(
        &mut self,
        source: &Path,
        staging: &mut StagingArtifact,
    ) -> Result<(), CombinatorError> {
        let staged = staging.path().to_path_buf();
        let snapshot = Snapshot::capture(source, &self.matcher, &self.options)?;

        tracing::info!("Generating directory tree...");
        render_snapshot(&snapshot, staging).map_err(|e| CombinatorError::io(&staged, e))?;

        for entry in snapshot.files() {
            self.write_file(source, &entry.path, staging)
                .map_err(|e| match e {
                    FileWriteError::Sink(e) => CombinatorError::io(&staged, e),
                    FileWriteError::Fatal(e) => e,
                })?;
        }
        Ok(())
    }

    /// Emits one file block. Unreadable text degrades to a placeholder;
    /// only metadata and sink failures abort the run.
    fn write_file<W: Write>(
        &mut self,
        root: &Path,
        path: &Path,
        sink: &mut W,
    ) -> Result<(), FileWriteError> {
        let relative = relative_path(root, path);
        tracing::debug!("Processing file: {}", relative);
        let record = self.inspect(path, relative).map_err(FileWriteError::Fatal)?;

        output::write_file_header(sink, &record)?;
        match record.kind {
            FileKind::Image | FileKind::Binary => {
                output::write_excluded_marker(sink, record.kind)?;
                self.tally.record(record.kind, &record.relative_path);
                tracing::info!(
                    "Skipping content of {} file: {}",
                    record.kind.label().to_lowercase(),
                    record.relative_path
                );
            }
            FileKind::Text => match fs::read_to_string(path) {
                Ok(text) => {
                    output::write_text_body(sink, Ok(text.as_str()))?;
                    self.tally.record(FileKind::Text, &record.relative_path);
                }
                Err(e) => {
                    tracing::warn!("Error reading file {}: {}", record.relative_path, e);
                    output::write_text_body(sink, Err(&e as &dyn std::fmt::Display))?;
                    self.tally.skip();
                }
            },
        }
        self.records.push(record);
        Ok(())
    }

    fn inspect(&self, path: &Path, relative_path: String) -> Result<FileRecord, CombinatorError> {
        let metadata = fs::metadata(path).map_err(|e| {
            tracing::error!("Error getting file info for {}: {}", path.display(), e);
            CombinatorError::io(path, e)
        })?;
        let modified = metadata
            .modified()
            .map_err(|e| CombinatorError::io(path, e))?;
        Ok(FileRecord {
            relative_path,
            kind: self.classifier.classify(path),
            size_bytes: metadata.len(),
            modified: DateTime::<Local>::from(modified),
        })
    }
}

enum FileWriteError {
    Sink(std::io::Error),
    Fatal(CombinatorError),
}

impl From<std::io::Error> for FileWriteError {
    fn from(e: std::io::Error) -> Self {
        FileWriteError::Sink(e)
    }
}

/// `path` relative to `root`, `/`-separated.
fn relative_path(root: &Path, path: &Path) -> String {
    let scoped = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = scoped
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        scoped.display().to_string()
    } else {
        parts.join("/")
    }
}

fn log_statistics(report: &CombineReport) {
    tracing::info!("Text files processed: {}", report.stats.processed);
    tracing::info!("Binary files detected: {}", report.stats.binary);
    tracing::info!("Image files detected: {}", report.stats.image);
    tracing::info!("Files skipped due to errors: {}", report.stats.skipped);
    tracing::info!("Output written to: {}", report.output.display());
}

/// Combines `options.root` into `output` with a fresh [`Combiner`].
pub fn combine(
    options: CombinatorOptions,
    output: impl AsRef<Path>,
) -> Result<CombineReport, CombinatorError> {
    let root = options.root.clone();
    Combiner::new(options)?.run(root, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CombinatorBuilder;
    use tempfile::tempdir;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/src/project");
        assert_eq!(relative_path(root, &root.join("a").join("b.txt")), "a/b.txt");
        assert_eq!(relative_path(root, Path::new("other.txt")), "other.txt");
    }

    #[test]
    fn track_file_counts_each_call() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.txt"), "Test content").unwrap();
        fs::write(dir.path().join("test.bin"), [0u8, 1, 2, 3]).unwrap();
        fs::write(dir.path().join("test.jpg"), "JFIF").unwrap();

        let mut combiner = Combiner::new(CombinatorBuilder::new(dir.path()).build()).unwrap();
        assert_eq!(combiner.track_file(&dir.path().join("test.txt")), Some(FileKind::Text));
        assert_eq!(combiner.track_file(&dir.path().join("test.bin")), Some(FileKind::Binary));
        assert_eq!(combiner.track_file(&dir.path().join("test.jpg")), Some(FileKind::Image));
        assert_eq!(combiner.track_file(&dir.path().join("nonexistent.txt")), None);
        combiner.track_file(&dir.path().join("test.txt"));

        assert_eq!(
            combiner.stats(),
            RunStats {
                processed: 2,
                skipped: 1,
                binary: 1,
                image: 1
            }
        );
        assert_eq!(combiner.file_lists().text, ["test.txt", "test.txt"]);
        assert_eq!(combiner.file_lists().binary, ["test.bin"]);
        assert_eq!(combiner.file_lists().image, ["test.jpg"]);
    }

    #[test]
    fn track_file_follows_last_run_source() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(first.join("sub")).unwrap();
        fs::create_dir_all(second.join("sub")).unwrap();
        fs::write(first.join("sub/a.txt"), "a").unwrap();
        fs::write(second.join("sub/b.txt"), "b").unwrap();

        let mut combiner = Combiner::new(CombinatorBuilder::new(&first).build()).unwrap();
        combiner.track_file(&first.join("sub/a.txt"));
        assert_eq!(combiner.file_lists().text, ["sub/a.txt"]);

        combiner.run(&second, dir.path().join("out.txt")).unwrap();
        combiner.track_file(&second.join("sub/b.txt"));
        assert_eq!(combiner.file_lists().text, ["sub/b.txt", "sub/b.txt"]);
    }

    #[test]
    fn state_moves_to_published_or_failed() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();

        let mut combiner = Combiner::new(CombinatorBuilder::new(&src).build()).unwrap();
        assert_eq!(combiner.state(), RunState::Idle);
        combiner.run(&src, dir.path().join("out.txt")).unwrap();
        assert_eq!(combiner.state(), RunState::Published);

        let err = combiner
            .run(dir.path().join("missing"), dir.path().join("out2.txt"))
            .unwrap_err();
        assert!(matches!(err, CombinatorError::Processing(_)));
        assert_eq!(combiner.state(), RunState::Failed);
        assert!(!dir.path().join("out2.txt").exists());
    }
}
