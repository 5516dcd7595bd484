//! Rendering of the directory structure section.

use crate::error::CombinatorError;
use crate::exclude::ExclusionMatcher;
use crate::options::CombinatorOptions;
use crate::output::{TREE_FOOTER, TREE_HEADER};
use crate::walk::{Entry, Snapshot};
use std::io::{self, Write};
use std::path::Path;

const TEE: &str = "├── ";
const CORNER: &str = "└── ";
const PIPE: &str = "│   ";
const BLANK: &str = "    ";

/// Writes the tree section for `snapshot`, header and footer included.
///
/// Lines look like `tree` output: the last sibling at each depth gets a
/// corner connector and its descendants a blank indent, earlier siblings a
/// tee and a vertical continuation.
pub fn render_snapshot<W: Write>(snapshot: &Snapshot, sink: &mut W) -> io::Result<()> {
    sink.write_all(TREE_HEADER.as_bytes())?;
    write_level(snapshot.entries(), "", sink)?;
    sink.write_all(TREE_FOOTER.as_bytes())
}

fn write_level<W: Write>(entries: &[Entry], prefix: &str, sink: &mut W) -> io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        let is_last = i + 1 == entries.len();
        let connector = if is_last { CORNER } else { TEE };
        writeln!(sink, "{}{}{}", prefix, connector, entry.name)?;
        if entry.is_dir() {
            let nested = format!("{}{}", prefix, if is_last { BLANK } else { PIPE });
            write_level(&entry.children, &nested, sink)?;
        }
    }
    Ok(())
}

/// Lists `root` honoring `matcher` and writes its tree section to `sink`.
pub fn render_tree<W: Write>(
    root: &Path,
    matcher: &ExclusionMatcher,
    sink: &mut W,
) -> Result<(), CombinatorError> {
    let matcher = matcher.clone().with_root(root);
    let snapshot = Snapshot::capture(root, &matcher, &CombinatorOptions::default())?;
    render_snapshot(&snapshot, sink).map_err(|e| CombinatorError::io(root, e))
}
