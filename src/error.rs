use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum CombinatorError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(String),
    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Every fatal failure of a run surfaces wrapped in this variant.
    #[error("Failed to process directory: {0}")]
    Processing(#[source] Box<CombinatorError>),
}
impl CombinatorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CombinatorError::Io {
            path: path.into(),
            source,
        }
    }
    pub(crate) fn processing(cause: CombinatorError) -> Self {
        match cause {
            already @ CombinatorError::Processing(_) => already,
            other => CombinatorError::Processing(Box::new(other)),
        }
    }
    /// The innermost cause, looking through [`CombinatorError::Processing`].
    pub fn root_cause(&self) -> &CombinatorError {
        match self {
            CombinatorError::Processing(inner) => inner.root_cause(),
            other => other,
        }
    }
}
