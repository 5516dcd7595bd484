//! File classification into text, binary and image kinds.
//!
//! Classification combines three sources of evidence, first match wins:
//! an optional content sniffer reporting a MIME type, fixed extension
//! tables, and a byte heuristic over the first [`SNIFF_LEN`] bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// How many leading bytes are inspected when sniffing or running the heuristic.
pub const SNIFF_LEN: usize = 4096;

/// Extensions (lowercase, without the dot) always treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "svg", "ico",
];

/// Extensions (lowercase, without the dot) always treated as binary.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "pyc", "pyo", "pyd", "so", "dll", "dylib", "exe", "bin", "coverage", "pkl", "pdb", "o",
    "obj", "db", "sqlite", "sqlite3", "jar", "war", "class", "pdf",
];

/// The kind of a file, deciding whether its content is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Text,
    Binary,
    Image,
}

impl FileKind {
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Text => "Text",
            FileKind::Binary => "Binary",
            FileKind::Image => "Image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which content sniffer a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentSniffing {
    /// Magic-number signatures plus `content_inspector`.
    #[default]
    Signature,
    /// Extension tables and the byte heuristic only.
    Off,
}

/// A service able to report the MIME type of a file from its bytes.
///
/// Returning `None` means the service is unavailable or failed for this
/// file; the classifier then falls back to extensions and the heuristic.
pub trait ContentSniffer: Send + Sync {
    fn mime_type(&self, path: &Path) -> Option<String>;
}

/// A sniffer that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSniffer;

impl ContentSniffer for NoSniffer {
    fn mime_type(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Sniffs well-known magic numbers. Anything else is binary when either
/// `content_inspector` or the byte allow-list says so, otherwise text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureSniffer;

impl ContentSniffer for SignatureSniffer {
    fn mime_type(&self, path: &Path) -> Option<String> {
        match read_prefix(path) {
            Ok(chunk) => Some(mime_from_bytes(&chunk).to_string()),
            Err(e) => {
                tracing::debug!("Error checking mime type of {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn mime_from_bytes(chunk: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"II*\x00", "image/tiff"),
        (b"MM\x00*", "image/tiff"),
        (b"\x00\x00\x01\x00", "image/vnd.microsoft.icon"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
        (b"\x7fELF", "application/x-executable"),
    ];
    if let Some(&(_, mime)) = SIGNATURES.iter().find(|(magic, _)| chunk.starts_with(magic)) {
        return mime;
    }
    if chunk.len() >= 12 && chunk.starts_with(b"RIFF") && &chunk[8..12] == b"WEBP" {
        return "image/webp";
    }
    // BMP reserved header fields are zero.
    if chunk.len() >= 14 && chunk.starts_with(b"BM") && chunk[6..10] == [0, 0, 0, 0] {
        return "image/bmp";
    }
    if content_inspector::inspect(chunk).is_binary() || looks_binary(chunk) {
        return "application/octet-stream";
    }
    if looks_like_svg(chunk) {
        return "image/svg+xml";
    }
    "text/plain"
}

fn looks_like_svg(chunk: &[u8]) -> bool {
    let text = String::from_utf8_lossy(chunk);
    let head = text.trim_start();
    (head.starts_with("<svg") || head.starts_with("<?xml")) && head.contains("<svg")
}

/// Decides the [`FileKind`] of files.
pub struct Classifier {
    sniffer: Box<dyn ContentSniffer>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(SignatureSniffer)
    }
}

impl Classifier {
    pub fn new(sniffer: impl ContentSniffer + 'static) -> Self {
        Self {
            sniffer: Box::new(sniffer),
        }
    }

    pub fn without_sniffing() -> Self {
        Self::new(NoSniffer)
    }

    pub fn from_mode(mode: ContentSniffing) -> Self {
        match mode {
            ContentSniffing::Signature => Self::new(SignatureSniffer),
            ContentSniffing::Off => Self::without_sniffing(),
        }
    }

    /// Classifies `path`. Never fails: an unreadable file is reported as
    /// [`FileKind::Binary`].
    pub fn classify(&self, path: &Path) -> FileKind {
        let mime = self.sniffer.mime_type(path);
        if mime.as_deref().is_some_and(|m| m.starts_with("image/")) {
            return FileKind::Image;
        }
        let ext = lowercase_extension(path);
        let ext = ext.as_deref().unwrap_or("");
        if IMAGE_EXTENSIONS.contains(&ext) {
            return FileKind::Image;
        }
        if BINARY_EXTENSIONS.contains(&ext) {
            return FileKind::Binary;
        }
        if let Some(mime) = mime {
            return if is_textual_mime(&mime) {
                FileKind::Text
            } else {
                FileKind::Binary
            };
        }
        match read_prefix(path) {
            Ok(chunk) if looks_binary(&chunk) => FileKind::Binary,
            Ok(_) => FileKind::Text,
            Err(e) => {
                tracing::debug!("Error reading file {}: {}", path.display(), e);
                FileKind::Binary
            }
        }
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn is_textual_mime(mime: &str) -> bool {
    mime.starts_with("text/")
        || mime.starts_with("application/json")
        || mime.starts_with("application/xml")
}

fn is_text_byte(byte: u8) -> bool {
    matches!(byte, 0x07..=0x0a | 0x0c | 0x0d | 0x1b | 0x20..=0x7e | 0x80..=0xfe)
}

/// True when `chunk` holds any byte outside the text allow-list.
pub fn looks_binary(chunk: &[u8]) -> bool {
    chunk.iter().any(|&b| !is_text_byte(b))
}

fn read_prefix(path: &Path) -> io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut chunk)?;
    Ok(chunk)
}
