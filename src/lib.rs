//! # filecombinator
//!
//! `filecombinator` walks a directory tree and writes a single text artifact holding a
//! rendered tree of the directory followed by the content of every non-excluded file,
//! each wrapped in delimiter lines carrying its relative path and metadata. Binary and
//! image files are recorded with metadata only.
//!
//! Output is written to a staging file next to the destination and atomically renamed
//! into place, so the destination never holds a partial artifact.
//!
//! # Example
//!
//! ```no_run
//! use filecombinator::{CombinatorBuilder, combine};
//!
//! let options = CombinatorBuilder::new("my_project")
//!     .exclude("build")
//!     .exclude("*.log")
//!     .build();
//!
//! let report = combine(options, "my_project_file_combinator_output.txt")
//!     .expect("Failed to combine directory");
//!
//! println!("Text files: {}", report.stats.processed);
//! for path in &report.lists.binary {
//!     println!("Binary (content excluded): {}", path);
//! }
//! ```

pub mod classify;
mod engine;
mod error;
pub mod exclude;
mod options;
pub mod output;
pub mod staging;
pub mod tree;
mod types;
pub mod walk;

pub use classify::{Classifier, ContentSniffer, ContentSniffing, FileKind, NoSniffer, SignatureSniffer};
pub use engine::{Combiner, RunState, combine};
pub use error::CombinatorError;
pub use exclude::{DEFAULT_EXCLUDES, ExclusionMatcher, STAGING_SUFFIX};
pub use options::{CombinatorBuilder, CombinatorOptions, default_output_path, resolve_output_path};
pub use types::{CombineReport, FileLists, FileRecord, RunStats, Tally};
