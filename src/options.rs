use crate::classify::ContentSniffing;
use crate::error::CombinatorError;
use crate::exclude::{DEFAULT_EXCLUDES, ExclusionMatcher, STAGING_SUFFIX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinatorOptions {
    pub root: PathBuf,
    pub additional_excludes: Vec<String>,
    pub use_default_excludes: bool,
    pub output_suffix: String,
    pub content_sniffing: ContentSniffing,
    pub respect_gitignore: bool,
    pub include_hidden: bool,
    pub follow_links: bool,
}
impl Default for CombinatorOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            additional_excludes: Vec::new(),
            use_default_excludes: true,
            output_suffix: STAGING_SUFFIX.to_string(),
            content_sniffing: ContentSniffing::Signature,
            respect_gitignore: false,
            include_hidden: true,
            follow_links: false,
        }
    }
}
impl CombinatorOptions {
    /// Loads options from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CombinatorError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| CombinatorError::io(path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| CombinatorError::Config(format!("{}: {}", path.display(), e)))
    }
    /// The active exclusion set: defaults (unless disabled) plus additions.
    pub fn exclusion_patterns(&self) -> Vec<String> {
        let defaults: &[&str] = if self.use_default_excludes {
            DEFAULT_EXCLUDES
        } else {
            &[]
        };
        defaults
            .iter()
            .map(|p| p.to_string())
            .chain(self.additional_excludes.iter().cloned())
            .collect()
    }
    pub fn exclusion_matcher(&self) -> Result<ExclusionMatcher, CombinatorError> {
        Ok(ExclusionMatcher::new(self.exclusion_patterns())?.with_root(&self.root))
    }
    /// `<directory name><suffix>` for the source root.
    pub fn default_output_path(&self) -> PathBuf {
        default_output_path(&self.root, &self.output_suffix)
    }
}
pub fn default_output_path(directory: &Path, suffix: &str) -> PathBuf {
    let abs = crate::exclude::absolutize(directory);
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    PathBuf::from(format!("{}{}", name, suffix))
}
/// Appends `suffix` to a user-given output path that has no extension.
pub fn resolve_output_path(given: &Path, suffix: &str) -> PathBuf {
    if given.extension().is_some() {
        given.to_path_buf()
    } else {
        let mut raw = given.as_os_str().to_os_string();
        raw.push(suffix);
        PathBuf::from(raw)
    }
}
#[derive(Debug, Default)]
pub struct CombinatorBuilder {
    options: CombinatorOptions,
}
impl CombinatorBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            options: CombinatorOptions {
                root: root.into(),
                ..Default::default()
            },
        }
    }
    pub fn from_options(options: CombinatorOptions) -> Self {
        Self { options }
    }
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.options.root = root.into();
        self
    }
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.options.additional_excludes.push(pattern.into());
        self
    }
    pub fn additional_excludes(mut self, patterns: Vec<String>) -> Self {
        self.options.additional_excludes.extend(patterns);
        self
    }
    pub fn use_default_excludes(mut self, yes: bool) -> Self {
        self.options.use_default_excludes = yes;
        self
    }
    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.options.output_suffix = suffix.into();
        self
    }
    pub fn content_sniffing(mut self, mode: ContentSniffing) -> Self {
        self.options.content_sniffing = mode;
        self
    }
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.options.respect_gitignore = yes;
        self
    }
    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.options.include_hidden = yes;
        self
    }
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.options.follow_links = yes;
        self
    }
    pub fn build(self) -> CombinatorOptions {
        self.options
    }
}
