//! Exclusion rules deciding which entries a run skips.

use crate::error::CombinatorError;
use globset::{GlobBuilder, GlobMatcher};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Basename suffix reserved for staging files and default output names.
pub const STAGING_SUFFIX: &str = "_file_combinator_output.txt";

/// Patterns excluded unless the caller opts out of defaults.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "__pycache__",
    ".venv",
    ".git",
    "node_modules",
    ".DS_Store",
    ".pytest_cache",
    ".vscode",
    "logs",
    ".mypy_cache",
    ".cache",
    ".pythonlibs",
    ".local",
    "gitdiff.txt",
];

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Glob(GlobMatcher),
}

impl Segment {
    fn matches(&self, name: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == name,
            Segment::Glob(glob) => glob.is_match(name),
        }
    }
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    fn compile(source: &str) -> Result<Self, CombinatorError> {
        let segments = source
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|seg| {
                if seg.contains(['*', '?', '[', '{']) {
                    let glob = GlobBuilder::new(seg)
                        .literal_separator(true)
                        .build()
                        .map_err(|e| CombinatorError::Pattern {
                            pattern: source.to_string(),
                            source: e,
                        })?;
                    Ok(Segment::Glob(glob.compile_matcher()))
                } else {
                    Ok(Segment::Literal(seg.to_string()))
                }
            })
            .collect::<Result<Vec<_>, CombinatorError>>()?;
        if segments.is_empty() {
            return Err(CombinatorError::Config(format!(
                "empty exclusion pattern '{}'",
                source
            )));
        }
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    fn matches(&self, names: &[Cow<'_, str>]) -> bool {
        names.windows(self.segments.len()).any(|window| {
            window
                .iter()
                .zip(&self.segments)
                .all(|(name, seg)| seg.matches(name))
        })
    }
}

/// Decides whether a file or directory must be skipped.
///
/// Rules, first match wins: the configured output file, any basename ending
/// in [`STAGING_SUFFIX`], then any path segment matching a pattern.
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    patterns: Vec<Pattern>,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl ExclusionMatcher {
    /// Builds a matcher from exactly `patterns`.
    pub fn new<I, S>(patterns: I) -> Result<Self, CombinatorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Set semantics: duplicates collapse and order is stable.
        let unique: BTreeSet<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let patterns = unique
            .iter()
            .map(|p| Pattern::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            root: None,
            output: None,
        })
    }

    /// Builds a matcher from [`DEFAULT_EXCLUDES`] plus `additional`.
    pub fn with_defaults<I, S>(additional: I) -> Result<Self, CombinatorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let additional: Vec<String> = additional
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        Self::new(
            DEFAULT_EXCLUDES
                .iter()
                .map(|p| p.to_string())
                .chain(additional),
        )
    }

    /// Segments are matched relative to `root` for paths beneath it; other
    /// paths are matched on the segments they are given with.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.set_root(root);
        self
    }

    pub fn set_root(&mut self, root: impl AsRef<Path>) {
        self.root = Some(absolutize(root.as_ref()));
    }

    /// Sets the final output path treated as self-referential.
    pub fn set_output_path(&mut self, output: impl AsRef<Path>) {
        self.output = Some(absolutize(output.as_ref()));
    }

    /// The absolute root segments are matched against, once set.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let abs = absolutize(path);
        if self.output.as_deref() == Some(abs.as_path()) {
            tracing::debug!("Skipping output file: {}", path.display());
            return true;
        }

        if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(STAGING_SUFFIX))
        {
            tracing::debug!("Skipping staging file: {}", path.display());
            return true;
        }

        let scoped = self
            .root
            .as_deref()
            .and_then(|root| abs.strip_prefix(root).ok())
            .unwrap_or(path);
        let names: Vec<Cow<'_, str>> = scoped
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .collect();
        let excluded = self.patterns.iter().any(|p| p.matches(&names));
        if excluded {
            tracing::debug!("Excluded path: {}", path.display());
        }
        excluded
    }
}

/// Lexically absolute form of `path`, without resolving symlinks.
pub(crate) fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .components()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ExclusionMatcher {
        ExclusionMatcher::with_defaults(Vec::<String>::new()).unwrap()
    }

    #[test]
    fn default_patterns() {
        let m = defaults();
        assert!(m.is_excluded(Path::new("__pycache__/test.py")));
        assert!(m.is_excluded(Path::new(".git/config")));
        assert!(m.is_excluded(Path::new("src/node_modules")));
        assert!(!m.is_excluded(Path::new("regular_file.txt")));
    }

    #[test]
    fn segments_not_substrings() {
        let m = ExclusionMatcher::new(["node_modules"]).unwrap();
        assert!(!m.is_excluded(Path::new("mynode_modules/index.js")));
        assert!(!m.is_excluded(Path::new("node_modules_backup")));
        assert!(m.is_excluded(Path::new("web/node_modules/react/index.js")));
    }

    #[test]
    fn glob_and_fragment_patterns() {
        let m = ExclusionMatcher::new(["*.log", "src/generated"]).unwrap();
        assert!(m.is_excluded(Path::new("build/app.log")));
        assert!(!m.is_excluded(Path::new("build/app.log.txt")));
        assert!(m.is_excluded(Path::new("crate/src/generated/mod.rs")));
        assert!(!m.is_excluded(Path::new("generated/mod.rs")));
        assert!(!m.is_excluded(Path::new("src/other/generated.rs")));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = ExclusionMatcher::new(["[unclosed"]).unwrap_err();
        assert!(matches!(err, CombinatorError::Pattern { .. }));
        assert!(ExclusionMatcher::new(["/"]).is_err());
    }

    #[test]
    fn output_and_staging_files() {
        let mut m = ExclusionMatcher::new(Vec::<String>::new()).unwrap();
        m.set_output_path("out/combined.txt");
        assert!(m.is_excluded(Path::new("out/combined.txt")));
        assert!(m.is_excluded(Path::new("./out/./combined.txt")));
        assert!(!m.is_excluded(Path::new("combined.txt")));
        assert!(m.is_excluded(Path::new("tmpab12_file_combinator_output.txt")));
    }

    #[test]
    fn root_prefix_is_not_matched() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("logs").join("project");
        let m = defaults().with_root(&root);
        assert!(!m.is_excluded(&root.join("main.rs")));
        assert!(m.is_excluded(&root.join("logs").join("today.txt")));
    }
}
