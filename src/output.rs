//! The delimiter scheme of the combined output.
//!
//! Every marker is a fixed label flanked by [`SEPARATOR`] on both sides.
//! Other tooling parses these lines, so they are reproduced byte for byte.

use crate::classify::FileKind;
use crate::types::FileRecord;
use std::io::{self, Write};

/// Eighteen `=` characters.
pub const SEPARATOR: &str = "==================";

pub const TREE_HEADER: &str = "================== DIRECTORY STRUCTURE ==================\n";
pub const TREE_FOOTER: &str =
    "================== END OF DIRECTORY STRUCTURE ==================\n\n";
pub const FILE_SEPARATOR: &str = "================== FILE SEPARATOR ==================";
pub const START_OF_FILE: &str = "================== START OF FILE ==================";
pub const END_OF_FILE: &str = "================== END OF FILE ==================";
pub const BINARY_EXCLUDED: &str =
    "================== BINARY FILE (CONTENT EXCLUDED) ==================";
pub const IMAGE_EXCLUDED: &str =
    "================== IMAGE FILE (CONTENT EXCLUDED) ==================";

/// `chrono` format of the `Last Modified` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes the separator, `FILEPATH:` and `Metadata:` lines of a block.
pub fn write_file_header<W: Write>(sink: &mut W, record: &FileRecord) -> io::Result<()> {
    write!(
        sink,
        "\n{}\nFILEPATH: {}\nMetadata: Type: {}, Size: {} bytes, Last Modified: {}\n",
        FILE_SEPARATOR,
        record.relative_path,
        record.kind,
        record.size_bytes,
        record.modified.format(TIMESTAMP_FORMAT),
    )
}

/// Writes the content-excluded marker for binary and image files.
pub fn write_excluded_marker<W: Write>(sink: &mut W, kind: FileKind) -> io::Result<()> {
    match kind {
        FileKind::Image => writeln!(sink, "{}", IMAGE_EXCLUDED),
        FileKind::Binary => writeln!(sink, "{}", BINARY_EXCLUDED),
        FileKind::Text => Ok(()),
    }
}

/// Writes a text body between start and end markers.
///
/// `content` is either the verbatim file text or the reason it could not
/// be read, which is written as a placeholder line.
pub fn write_text_body<W: Write>(
    sink: &mut W,
    content: Result<&str, &dyn std::fmt::Display>,
) -> io::Result<()> {
    writeln!(sink, "{}", START_OF_FILE)?;
    match content {
        Ok(text) => sink.write_all(text.as_bytes())?,
        Err(reason) => writeln!(sink, "Error reading file: {}", reason)?,
    }
    write!(sink, "\n{}\n", END_OF_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn record(kind: FileKind) -> FileRecord {
        FileRecord {
            relative_path: "src/main.rs".to_string(),
            kind,
            size_bytes: 12,
            modified: Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
        }
    }

    #[test]
    fn markers_use_eighteen_equals() {
        assert_eq!(SEPARATOR.len(), 18);
        for marker in [FILE_SEPARATOR, START_OF_FILE, END_OF_FILE, BINARY_EXCLUDED, IMAGE_EXCLUDED] {
            assert!(marker.starts_with(&format!("{} ", SEPARATOR)));
            assert!(marker.ends_with(&format!(" {}", SEPARATOR)));
        }
    }

    #[test]
    fn header_layout() {
        let mut out = Vec::new();
        write_file_header(&mut out, &record(FileKind::Text)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n================== FILE SEPARATOR ==================\n\
             FILEPATH: src/main.rs\n\
             Metadata: Type: Text, Size: 12 bytes, Last Modified: 2024-03-09 07:05:01\n"
        );
    }

    #[test]
    fn text_body_and_placeholder() {
        let mut out = Vec::new();
        write_text_body(&mut out, Ok("hello")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\nhello\n{}\n", START_OF_FILE, END_OF_FILE)
        );

        let mut out = Vec::new();
        write_text_body(&mut out, Err(&"invalid utf-8" as &dyn std::fmt::Display)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "{}\nError reading file: invalid utf-8\n\n{}\n",
                START_OF_FILE, END_OF_FILE
            )
        );
    }

    #[test]
    fn excluded_markers() {
        let mut out = Vec::new();
        write_excluded_marker(&mut out, FileKind::Binary).unwrap();
        write_excluded_marker(&mut out, FileKind::Image).unwrap();
        write_excluded_marker(&mut out, FileKind::Text).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n{}\n", BINARY_EXCLUDED, IMAGE_EXCLUDED)
        );
    }
}
