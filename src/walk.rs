//! Directory snapshot shared by the tree renderer and the combiner.
//!
//! A single listing of the source tree is taken with exclusions applied as
//! the walk goes, so excluded directories are never descended and excluded
//! entries are never statted. Rendering and combining both read the same
//! snapshot, which keeps the printed tree and the processed files in step.

use crate::error::CombinatorError;
use crate::exclude::ExclusionMatcher;
use crate::options::CombinatorOptions;
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// A symbolic link to a directory that is not followed.
    DirectoryLink,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Sorted by name; empty unless `kind` is [`EntryKind::Directory`].
    pub children: Vec<Entry>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One listing of a source tree.
///
/// Every entry appears in the rendered tree. Only [`EntryKind::File`]
/// entries are processed: an unfollowed link to a directory is listed as a
/// leaf but neither descended nor combined.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: PathBuf,
    entries: Vec<Entry>,
}

impl Snapshot {
    pub fn capture(
        root: &Path,
        matcher: &ExclusionMatcher,
        options: &CombinatorOptions,
    ) -> Result<Self, CombinatorError> {
        let metadata = fs::metadata(root).map_err(|e| CombinatorError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(CombinatorError::Walk(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Walker::new(root, matcher, options).snapshot()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level entries, sorted by name.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Files in processing order: at each directory its files first, then
    /// its subdirectories, each group sorted by name.
    pub fn files(&self) -> Vec<&Entry> {
        let mut out = Vec::new();
        collect_files(&self.entries, &mut out);
        out
    }
}

fn collect_files<'a>(entries: &'a [Entry], out: &mut Vec<&'a Entry>) {
    out.extend(entries.iter().filter(|e| e.kind == EntryKind::File));
    for dir in entries.iter().filter(|e| e.is_dir()) {
        collect_files(&dir.children, out);
    }
}

struct Walker {
    root: PathBuf,
    inner: ignore::Walk,
}

impl Walker {
    fn new(root: &Path, matcher: &ExclusionMatcher, options: &CombinatorOptions) -> Self {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .hidden(!options.include_hidden)
            .git_ignore(options.respect_gitignore)
            .git_exclude(options.respect_gitignore)
            .require_git(false)
            .follow_links(options.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b));
        let matcher = matcher.clone();
        builder.filter_entry(move |entry| entry.depth() == 0 || !matcher.is_excluded(entry.path()));
        Self {
            root: root.to_path_buf(),
            inner: builder.build(),
        }
    }

    /// Folds the pre-order walk into a nested entry tree.
    fn snapshot(self) -> Result<Snapshot, CombinatorError> {
        let mut stack: Vec<Entry> = vec![Entry {
            name: String::new(),
            path: self.root.clone(),
            kind: EntryKind::Directory,
            children: Vec::new(),
        }];
        for result in self.inner {
            let dent = result.map_err(|e| CombinatorError::Walk(e.to_string()))?;
            let depth = dent.depth();
            if depth == 0 {
                continue;
            }
            attach_down_to(&mut stack, depth);
            stack.push(entry_from(&dent));
        }
        attach_down_to(&mut stack, 1);
        let entries = stack.pop().map(|root| root.children).unwrap_or_default();
        Ok(Snapshot {
            root: self.root,
            entries,
        })
    }
}

fn attach_down_to(stack: &mut Vec<Entry>, len: usize) {
    while stack.len() > len {
        let Some(done) = stack.pop() else { break };
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => {
                stack.push(done);
                break;
            }
        }
    }
}

fn entry_from(dent: &ignore::DirEntry) -> Entry {
    let path = dent.path().to_path_buf();
    let kind = match dent.file_type() {
        Some(ft) if ft.is_dir() => EntryKind::Directory,
        Some(ft) if ft.is_symlink() && path.is_dir() => EntryKind::DirectoryLink,
        _ => EntryKind::File,
    };
    Entry {
        name: dent.file_name().to_string_lossy().into_owned(),
        path,
        kind,
        children: Vec::new(),
    }
}
